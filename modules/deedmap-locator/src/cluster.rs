//! Density clustering over geocode candidates.
//!
//! Every candidate is tried as a seed; the seed with the most candidates
//! within the radius defines the consensus cluster. Candidate counts per deed
//! are in the tens, so the quadratic scan is fine.

use deedmap_common::{centroid, GeoPoint, GeocodeCandidate};

#[derive(Debug, Clone, PartialEq)]
pub struct DenseCluster<'a> {
    pub members: Vec<&'a GeocodeCandidate>,
    pub center: GeoPoint,
}

impl DenseCluster<'_> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Candidates within `radius_miles` of `seed`, the seed included.
pub fn neighbors<'a>(
    seed: &GeocodeCandidate,
    candidates: &'a [GeocodeCandidate],
    radius_miles: f64,
) -> Vec<&'a GeocodeCandidate> {
    let origin = seed.point();
    candidates
        .iter()
        .filter(|c| origin.distance_miles(&c.point()) <= radius_miles)
        .collect()
}

/// The largest seed neighborhood. Ties go to the earliest seed in input order.
pub fn find_densest_cluster(candidates: &[GeocodeCandidate], radius_miles: f64) -> DenseCluster<'_> {
    match candidates {
        [] => DenseCluster {
            members: Vec::new(),
            center: GeoPoint::new(0.0, 0.0),
        },
        [only] => DenseCluster {
            members: vec![only],
            center: only.point(),
        },
        _ => {
            let mut best: Vec<&GeocodeCandidate> = Vec::new();
            for seed in candidates {
                let members = neighbors(seed, candidates, radius_miles);
                if members.len() > best.len() {
                    best = members;
                }
            }
            let center = centroid(best.iter().map(|c| c.point()));
            DenseCluster {
                members: best,
                center,
            }
        }
    }
}
