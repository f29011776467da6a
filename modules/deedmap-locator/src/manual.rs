//! Geocoding of hand-entered reference addresses, used to check the
//! locator's output against known deed locations.

use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use anyhow::Context;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use deedmap_common::ManualGeocodeConfig;
use nominatim_client::SearchRequest;

use crate::rate_limit::Throttled;
use crate::traits::Geocoder;

static SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" (TR|RD|DR|ST|AVE|LN|CT)([ ,])").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualAddress {
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    #[serde(flatten)]
    pub input: ManualAddress,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Upper-case and spell out street suffixes that sit before a space or comma.
pub fn normalize_address(address: &str) -> String {
    let upper = address.to_uppercase();
    SUFFIX
        .replace_all(&upper, |caps: &Captures| {
            let full = match &caps[1] {
                "TR" => "TERRACE",
                "RD" => "ROAD",
                "DR" => "DRIVE",
                "ST" => "STREET",
                "AVE" => "AVENUE",
                "LN" => "LANE",
                _ => "COURT",
            };
            format!(" {full}{}", &caps[2])
        })
        .into_owned()
}

pub struct ManualGeocoder {
    geocoder: Throttled<Arc<dyn Geocoder>>,
    country_codes: String,
}

impl ManualGeocoder {
    /// Requests are always spaced by `config.min_interval_ms`.
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &ManualGeocodeConfig) -> Self {
        Self {
            geocoder: Throttled::new(geocoder, Duration::from_millis(config.min_interval_ms)),
            country_codes: config.country_codes.clone(),
        }
    }

    /// First hit for the raw address, then for its normalized form.
    pub async fn geocode(&self, address: &str) -> Option<(f64, f64)> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }

        let normalized = normalize_address(address);
        let mut variants = vec![address.to_string()];
        if normalized != address {
            variants.push(normalized);
        }

        for variant in variants {
            let request = SearchRequest::new(variant.clone(), 1).country_codes(self.country_codes.clone());
            match self.geocoder.search(&request).await {
                Ok(places) => {
                    if let Some(place) = places.first() {
                        return Some((place.lat, place.lon));
                    }
                }
                Err(e) => warn!(address = %variant, error = %e, "Error geocoding address"),
            }
        }
        None
    }

    pub async fn geocode_all(&self, addresses: Vec<ManualAddress>) -> Vec<GeocodedAddress> {
        let total = addresses.len();
        let mut out = Vec::with_capacity(total);
        for (idx, input) in addresses.into_iter().enumerate() {
            let hit = match input.address.as_deref() {
                Some(address) => self.geocode(address).await,
                None => None,
            };
            match hit {
                Some(_) => info!(id = %input.id, "Geocoded address {}/{}", idx + 1, total),
                None => warn!(id = %input.id, "Could not geocode address {}/{}", idx + 1, total),
            }
            out.push(GeocodedAddress {
                input,
                latitude: hit.map(|(lat, _)| lat),
                longitude: hit.map(|(_, lon)| lon),
            });
        }
        out
    }

    /// Read a JSON array of addresses, write them back with coordinates.
    pub async fn run_file(&self, input: &Path, output: &Path) -> anyhow::Result<Vec<GeocodedAddress>> {
        let content = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read addresses from {}", input.display()))?;
        let addresses: Vec<ManualAddress> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse addresses in {}", input.display()))?;
        info!(addresses = addresses.len(), "Loaded manual addresses");

        let geocoded = self.geocode_all(addresses).await;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(output, serde_json::to_string_pretty(&geocoded)?)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        let found = geocoded.iter().filter(|g| g.latitude.is_some()).count();
        info!(found, total = geocoded.len(), output = %output.display(), "Manual geocoding complete");
        Ok(geocoded)
    }
}
