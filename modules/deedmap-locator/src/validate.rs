use deedmap_common::{GeoPoint, GeocodeCandidate, ValidatedStreet};

use crate::cluster::DenseCluster;

/// Per-street verdicts. Every input street lands in exactly one list.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetValidation {
    pub validated: Vec<ValidatedStreet>,
    pub invalid: Vec<String>,
}

/// Re-partition all candidates by street and keep one representative each.
///
/// Per street: candidates in `primary_town` first; when none match by name,
/// candidates within `radius_miles` of the cluster center. The survivor
/// nearest the center represents the street. `streets` must be distinct.
pub fn validate(
    all_candidates: &[GeocodeCandidate],
    streets: &[String],
    primary_town: &str,
    cluster: &DenseCluster<'_>,
    radius_miles: f64,
) -> StreetValidation {
    let center = cluster.center;
    let mut validated = Vec::new();
    let mut invalid = Vec::new();

    for street in streets {
        let street_candidates: Vec<&GeocodeCandidate> = all_candidates
            .iter()
            .filter(|c| &c.street_name == street)
            .collect();

        let mut survivors: Vec<&GeocodeCandidate> = street_candidates
            .iter()
            .copied()
            .filter(|c| c.locality == primary_town)
            .collect();

        // Geocoder town text is unreliable (historic names, villages), so a
        // spatially consistent hit still counts.
        if survivors.is_empty() {
            survivors = street_candidates
                .iter()
                .copied()
                .filter(|c| distance_to(c, &center) <= radius_miles)
                .collect();
        }

        let best = survivors.into_iter().min_by(|a, b| {
            distance_to(a, &center).total_cmp(&distance_to(b, &center))
        });

        match best {
            Some(best) => validated.push(ValidatedStreet {
                street_name: street.clone(),
                latitude: best.latitude,
                longitude: best.longitude,
                display_address: best.display_address.clone(),
                locality: best.locality.clone(),
                candidate_count: street_candidates.len(),
            }),
            None => invalid.push(street.clone()),
        }
    }

    StreetValidation { validated, invalid }
}

fn distance_to(candidate: &GeocodeCandidate, center: &GeoPoint) -> f64 {
    candidate.point().distance_miles(center)
}
