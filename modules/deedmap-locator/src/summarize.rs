use deedmap_common::{centroid, ClusteringConfig, GeoPoint, ValidatedStreet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterSummary {
    pub center: GeoPoint,
    pub radius_miles: f64,
    pub confidence: f64,
}

/// Center, spread and confidence of the validated set.
pub fn summarize(
    validated: &[ValidatedStreet],
    total_input_streets: usize,
    config: &ClusteringConfig,
) -> ClusterSummary {
    let center = centroid(validated.iter().map(ValidatedStreet::point));
    let radius_miles = cluster_radius(&center, validated);
    ClusterSummary {
        center,
        radius_miles,
        confidence: confidence(validated.len(), total_input_streets, radius_miles, config),
    }
}

/// Farthest validated street from the center; 0 for one street or none.
pub fn cluster_radius(center: &GeoPoint, validated: &[ValidatedStreet]) -> f64 {
    if validated.len() <= 1 {
        return 0.0;
    }
    validated
        .iter()
        .map(|s| center.distance_miles(&s.point()))
        .fold(0.0, f64::max)
}

/// `coverage_weight · coverage + tightness_weight · (1 − min(radius / R, 1))`,
/// clamped to [0, 1]. Zero when nothing validated.
pub fn confidence(
    validated_count: usize,
    total_streets: usize,
    radius_miles: f64,
    config: &ClusteringConfig,
) -> f64 {
    if validated_count == 0 || total_streets == 0 {
        return 0.0;
    }
    let coverage = validated_count as f64 / total_streets as f64;
    let radius_penalty = (radius_miles / config.radius_miles).min(1.0);
    let score =
        config.coverage_weight * coverage + config.tightness_weight * (1.0 - radius_penalty);
    score.clamp(0.0, 1.0)
}
