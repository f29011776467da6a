//! Street → candidate geocoding: query construction, abbreviation variants,
//! locality parsing. Per-variant failures degrade to zero candidates.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use deedmap_common::{GeocodeCandidate, LocationHint, UNKNOWN_TOWN};
use nominatim_client::SearchRequest;

use crate::traits::Geocoder;

/// Upper-case street-suffix abbreviations as they appear in deed OCR.
static ABBREVIATIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("RD", "Road"),
        ("DR", "Drive"),
        ("AVE", "Avenue"),
        ("ST", "Street"),
        ("LN", "Lane"),
        ("CT", "Court"),
        ("TERR", "Terrace"),
        ("TER", "Terrace"),
        ("PL", "Place"),
        ("BLVD", "Boulevard"),
    ]
    .into_iter()
    .map(|(abbr, full)| {
        let re = Regex::new(&format!(r"\b{abbr}\b")).expect("valid regex");
        (re, full)
    })
    .collect()
});

/// Expand whole-word suffix abbreviations (`HILLTOP RD` → `HILLTOP Road`).
pub fn expand_abbreviations(street: &str) -> String {
    ABBREVIATIONS
        .iter()
        .fold(street.to_string(), |acc, (re, full)| {
            re.replace_all(&acc, *full).into_owned()
        })
}

/// The raw street, plus its expansion when that differs.
pub fn query_variants(street: &str) -> Vec<String> {
    let expanded = expand_abbreviations(street);
    if expanded == street {
        vec![street.to_string()]
    } else {
        vec![street.to_string(), expanded]
    }
}

/// `"{street}, {town-or-county}, {state}"`. Padding around the street is
/// not sent.
pub fn build_query(street_variant: &str, hint: &LocationHint) -> String {
    format!("{}, {}, {}", street_variant.trim(), hint.locality(), hint.state)
}

/// Second comma-separated segment of a geocoder display address.
pub fn extract_locality(display_address: &str) -> String {
    display_address
        .split(',')
        .nth(1)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_TOWN.to_string())
}

/// All candidates for one street across its query variants.
pub async fn geocode_street(
    geocoder: &dyn Geocoder,
    street: &str,
    hint: &LocationHint,
    max_results: u32,
) -> Vec<GeocodeCandidate> {
    let mut candidates = Vec::new();

    for variant in query_variants(street) {
        let query = build_query(&variant, hint);
        let request = SearchRequest::new(query.clone(), max_results);

        match geocoder.search(&request).await {
            Ok(places) => {
                debug!(query = %query, results = places.len(), "Geocoded variant");
                candidates.extend(places.into_iter().map(|place| GeocodeCandidate {
                    street_name: street.to_string(),
                    latitude: place.lat,
                    longitude: place.lon,
                    locality: extract_locality(&place.display_name),
                    display_address: place.display_name,
                    source_query: query.clone(),
                }));
            }
            Err(e) => {
                debug!(query = %query, error = %e, "Geocoding variant failed");
            }
        }
    }

    candidates
}
