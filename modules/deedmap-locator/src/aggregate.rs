use futures::stream::{self, StreamExt};
use tracing::debug;

use deedmap_common::{is_valid_coordinate, GeocodeCandidate, LocationHint};

use crate::geocode::geocode_street;
use crate::traits::Geocoder;

/// Geocode every street and flatten the hits, in street input order.
///
/// No deduplication: repeated hits across variants are expected and feed the
/// density count. Hits with unusable coordinates stop here.
pub async fn aggregate(
    geocoder: &dyn Geocoder,
    streets: &[String],
    hint: &LocationHint,
    max_results: u32,
    concurrency: usize,
) -> Vec<GeocodeCandidate> {
    if streets.is_empty() {
        return Vec::new();
    }

    let per_street: Vec<Vec<GeocodeCandidate>> = stream::iter(streets)
        .map(|street| geocode_street(geocoder, street, hint, max_results))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    per_street
        .into_iter()
        .flatten()
        .filter(|c| {
            let ok = is_valid_coordinate(c.latitude, c.longitude);
            if !ok {
                debug!(
                    street = %c.street_name,
                    lat = c.latitude,
                    lon = c.longitude,
                    "Dropping candidate with invalid coordinates"
                );
            }
            ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{place, MockGeocoder};

    fn dracut() -> LocationHint {
        LocationHint::new(Some("Dracut".into()), "Middlesex County", "Massachusetts")
    }

    #[tokio::test]
    async fn empty_streets_make_no_calls() {
        let geocoder = MockGeocoder::new();
        let out = aggregate(&geocoder, &[], &dracut(), 5, 1).await;
        assert!(out.is_empty());
        assert_eq!(geocoder.search_count(), 0);
    }

    #[tokio::test]
    async fn candidates_tagged_with_original_street() {
        let geocoder = MockGeocoder::new()
            .on_search(
                "HILLTOP RD, Dracut, Massachusetts",
                vec![place(42.676, -71.287, "Hilltop Road, Dracut, Middlesex County, Massachusetts")],
            )
            .on_search(
                "HILLTOP Road, Dracut, Massachusetts",
                vec![
                    place(42.676, -71.287, "Hilltop Road, Dracut, Middlesex County, Massachusetts"),
                    place(42.100, -72.510, "Hilltop Road, Springfield, Hampden County, Massachusetts"),
                ],
            );

        let out = aggregate(&geocoder, &["HILLTOP RD".to_string()], &dracut(), 5, 1).await;

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|c| c.street_name == "HILLTOP RD"));
        assert_eq!(out[0].source_query, "HILLTOP RD, Dracut, Massachusetts");
        assert_eq!(out[1].source_query, "HILLTOP Road, Dracut, Massachusetts");
        assert_eq!(out[2].locality, "Springfield");
        assert_eq!(geocoder.search_count(), 2);
    }

    #[tokio::test]
    async fn failed_variant_does_not_drop_other_variant() {
        let geocoder = MockGeocoder::new()
            .fail_on("HILLTOP RD, Dracut, Massachusetts")
            .on_search(
                "HILLTOP Road, Dracut, Massachusetts",
                vec![place(42.676, -71.287, "Hilltop Road, Dracut, Middlesex County, Massachusetts")],
            );

        let out = aggregate(&geocoder, &["HILLTOP RD".to_string()], &dracut(), 5, 1).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].locality, "Dracut");
    }

    #[tokio::test]
    async fn invalid_coordinates_dropped() {
        let geocoder = MockGeocoder::new().on_search(
            "Main St, Dracut, Massachusetts",
            vec![
                place(f64::NAN, -71.3, "Main Street, Nowhere"),
                place(42.60, -71.30, "Main Street, Dracut, Massachusetts"),
            ],
        );
        let out = aggregate(&geocoder, &["Main St".to_string()], &dracut(), 5, 1).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].latitude, 42.60);
    }

    #[tokio::test]
    async fn concurrent_streets_keep_input_order() {
        let geocoder = MockGeocoder::new()
            .on_search("A St, Dracut, Massachusetts", vec![place(42.60, -71.30, "A Street, Dracut")])
            .on_search("B St, Dracut, Massachusetts", vec![place(42.61, -71.30, "B Street, Dracut")])
            .on_search("C St, Dracut, Massachusetts", vec![place(42.62, -71.30, "C Street, Dracut")]);

        let streets = vec!["A St".to_string(), "B St".to_string(), "C St".to_string()];
        let out = aggregate(&geocoder, &streets, &dracut(), 5, 3).await;
        let names: Vec<&str> = out.iter().map(|c| c.street_name.as_str()).collect();
        assert_eq!(names, vec!["A St", "B St", "C St"]);
    }
}
