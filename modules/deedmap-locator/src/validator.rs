//! The street clustering engine: geocode → cluster → resolve town →
//! validate → summarize, for one deed's streets.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use deedmap_common::{
    ClusterResult, ClusteringConfig, GeocoderConfig, GeocodingStats, LocationHint, UNKNOWN_TOWN,
};

use crate::aggregate::aggregate;
use crate::cluster::find_densest_cluster;
use crate::summarize::summarize;
use crate::town::resolve_primary_town;
use crate::traits::Geocoder;
use crate::validate::validate;

/// Per-deed processing stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeedStage {
    Pending,
    Geocoding,
    Clustering,
    Validating,
    Summarizing,
    Done,
}

impl fmt::Display for DeedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeedStage::Pending => "pending",
            DeedStage::Geocoding => "geocoding",
            DeedStage::Clustering => "clustering",
            DeedStage::Validating => "validating",
            DeedStage::Summarizing => "summarizing",
            DeedStage::Done => "done",
        };
        f.write_str(s)
    }
}

pub struct StreetClusteringValidator {
    geocoder: Arc<dyn Geocoder>,
    clustering: ClusteringConfig,
    max_results: u32,
    street_concurrency: usize,
}

impl StreetClusteringValidator {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        geocoder_config: &GeocoderConfig,
        clustering: ClusteringConfig,
    ) -> Self {
        Self {
            geocoder,
            clustering,
            max_results: geocoder_config.max_results,
            street_concurrency: geocoder_config.street_concurrency,
        }
    }

    /// Resolve a deed's streets to a single validated location.
    ///
    /// Never fails: geocoder errors shrink the candidate set and an empty
    /// candidate set yields an unresolved result with zero confidence.
    pub async fn validate_and_cluster(&self, streets: &[String], hint: &LocationHint) -> ClusterResult {
        let streets = distinct(streets);
        let radius = self.clustering.radius_miles;

        info!(
            streets = streets.len(),
            town = hint.town.as_deref().unwrap_or(""),
            county = %hint.county,
            state = %hint.state,
            "Validating streets"
        );

        debug!(stage = %DeedStage::Geocoding);
        let candidates = aggregate(
            self.geocoder.as_ref(),
            &streets,
            hint,
            self.max_results,
            self.street_concurrency,
        )
        .await;
        info!(candidates = candidates.len(), streets = streets.len(), "Geocoding complete");

        let streets_geocoded = streets
            .iter()
            .filter(|s| candidates.iter().any(|c| &c.street_name == *s))
            .count();

        if candidates.is_empty() {
            warn!("No geocode candidates for any street");
            return ClusterResult::unresolved(&streets, UNKNOWN_TOWN, 0, 0);
        }

        debug!(stage = %DeedStage::Clustering);
        let cluster = find_densest_cluster(&candidates, radius);
        info!(
            members = cluster.len(),
            center_lat = cluster.center.lat,
            center_lon = cluster.center.lon,
            "Densest cluster"
        );
        let primary_town = resolve_primary_town(&cluster.members);
        info!(primary_town = %primary_town, "Primary town identified");

        debug!(stage = %DeedStage::Validating);
        let verdicts = validate(&candidates, &streets, &primary_town, &cluster, radius);
        info!(
            validated = verdicts.validated.len(),
            invalid = verdicts.invalid.len(),
            primary_town = %primary_town,
            "Streets filtered"
        );

        if verdicts.validated.is_empty() {
            return ClusterResult::unresolved(
                &streets,
                &primary_town,
                candidates.len(),
                streets_geocoded,
            );
        }

        debug!(stage = %DeedStage::Summarizing);
        let summary = summarize(&verdicts.validated, streets.len(), &self.clustering);
        let final_address = match self
            .geocoder
            .reverse(summary.center.lat, summary.center.lon)
            .await
        {
            Ok(address) => address,
            Err(e) => {
                warn!(error = %e, "Reverse geocode failed");
                None
            }
        };

        info!(
            validated = verdicts.validated.len(),
            radius_miles = summary.radius_miles,
            confidence = summary.confidence,
            "Final cluster"
        );

        ClusterResult {
            geocoding_stats: GeocodingStats {
                total_streets: streets.len(),
                total_candidates: candidates.len(),
                streets_geocoded,
                primary_town: primary_town.clone(),
                validated_streets: verdicts.validated.len(),
                invalid_streets: verdicts.invalid.len(),
                cluster_radius_miles: summary.radius_miles,
            },
            validated_streets: verdicts.validated,
            invalid_streets: verdicts.invalid,
            primary_town,
            cluster_center_lat: summary.center.lat,
            cluster_center_lon: summary.center.lon,
            final_address,
            cluster_radius_miles: summary.radius_miles,
            confidence: summary.confidence,
        }
    }
}

/// Input order preserved, repeats dropped.
fn distinct(streets: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    streets
        .iter()
        .filter(|s| seen.insert(s.as_str()))
        .cloned()
        .collect()
}
