use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::geo::GeoPoint;

/// Locality placeholder when a geocoder address has no town segment, or a
/// deed has no candidates at all.
pub const UNKNOWN_TOWN: &str = "UNKNOWN";

// ---------------------------------------------------------------------------
// Geocoding
// ---------------------------------------------------------------------------

/// One geocoder hit for one queried street variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    /// The input street this hit answers for (not the expanded variant).
    pub street_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub display_address: String,
    pub locality: String,
    pub source_query: String,
}

impl GeocodeCandidate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Where to look: town wins over county when both are known.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationHint {
    pub town: Option<String>,
    pub county: String,
    pub state: String,
}

impl LocationHint {
    pub fn new(town: Option<String>, county: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            town: town.filter(|t| !t.trim().is_empty()),
            county: county.into(),
            state: state.into(),
        }
    }

    /// The middle segment of a geocoder query.
    pub fn locality(&self) -> &str {
        self.town.as_deref().unwrap_or(&self.county)
    }
}

// ---------------------------------------------------------------------------
// Clustering output
// ---------------------------------------------------------------------------

/// One input street resolved to a single representative coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedStreet {
    pub street_name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "address")]
    pub display_address: String,
    #[serde(rename = "town")]
    pub locality: String,
    /// Raw candidates seen for this street across all variants. A hint, not a score.
    pub candidate_count: usize,
}

impl ValidatedStreet {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Per-deed diagnostic counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingStats {
    pub total_streets: usize,
    pub total_candidates: usize,
    pub streets_geocoded: usize,
    pub primary_town: String,
    pub validated_streets: usize,
    pub invalid_streets: usize,
    pub cluster_radius_miles: f64,
}

/// Final geolocation attached to a deed as `geolocation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub validated_streets: Vec<ValidatedStreet>,
    pub invalid_streets: Vec<String>,
    pub primary_town: String,
    pub cluster_center_lat: f64,
    pub cluster_center_lon: f64,
    pub final_address: Option<String>,
    pub cluster_radius_miles: f64,
    pub confidence: f64,
    pub geocoding_stats: GeocodingStats,
}

impl ClusterResult {
    /// A result with nothing validated: every input street is invalid and
    /// confidence is zero.
    pub fn unresolved(
        streets: &[String],
        primary_town: &str,
        total_candidates: usize,
        streets_geocoded: usize,
    ) -> Self {
        Self {
            validated_streets: Vec::new(),
            invalid_streets: streets.to_vec(),
            primary_town: primary_town.to_string(),
            cluster_center_lat: 0.0,
            cluster_center_lon: 0.0,
            final_address: None,
            cluster_radius_miles: 0.0,
            confidence: 0.0,
            geocoding_stats: GeocodingStats {
                total_streets: streets.len(),
                total_candidates,
                streets_geocoded,
                primary_town: primary_town.to_string(),
                validated_streets: 0,
                invalid_streets: streets.len(),
                cluster_radius_miles: 0.0,
            },
        }
    }

    /// The cluster center, or `None` when no street validated. The serialized
    /// 0.0/0.0 placeholder is not a location.
    pub fn center(&self) -> Option<GeoPoint> {
        if self.validated_streets.is_empty() {
            return None;
        }
        Some(GeoPoint::new(self.cluster_center_lat, self.cluster_center_lon))
    }
}

// ---------------------------------------------------------------------------
// Deed record
// ---------------------------------------------------------------------------

/// A deed as handed over by the scraper step. Fields this step does not own
/// are carried through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeedRecord {
    #[serde(default, deserialize_with = "deed_id_string")]
    pub deed_id: String,
    #[serde(default, deserialize_with = "default_on_null")]
    pub county: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    #[serde(default, deserialize_with = "default_on_null")]
    pub extracted_streets: Vec<String>,
    #[serde(default, deserialize_with = "default_on_null")]
    pub scraper_results: Vec<Value>,
    #[serde(default)]
    pub geolocation: Option<ClusterResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step4_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step4_error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeedRecord {
    /// `town` if set, else the first non-empty town in the scraper metadata.
    pub fn town_hint(&self) -> Option<String> {
        if let Some(town) = self.town.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return Some(town.to_string());
        }
        self.scraper_results.iter().find_map(|result| {
            result
                .pointer("/metadata/search_result_info/town")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
        })
    }

    /// Extracted streets with blank entries dropped and exact duplicates
    /// collapsed in first-seen order. Spelling and padding are kept as given.
    pub fn normalized_streets(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.extracted_streets
            .iter()
            .filter(|s| !s.trim().is_empty())
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect()
    }
}

fn default_on_null<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deed_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DeedId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<DeedId>::deserialize(deserializer)? {
        Some(DeedId::Text(s)) => s,
        Some(DeedId::Int(n)) => n.to_string(),
        Some(DeedId::Float(n)) => n.to_string(),
        None => String::new(),
    })
}
