use tracing::debug;

use deedmap_common::{GeocodeCandidate, UNKNOWN_TOWN};

/// Most common locality among cluster members; ties go to the locality seen
/// first. `UNKNOWN` for an empty cluster.
pub fn resolve_primary_town(members: &[&GeocodeCandidate]) -> String {
    // Insertion-ordered counts keep the tie-break deterministic.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for member in members {
        match counts.iter_mut().find(|(town, _)| *town == member.locality) {
            Some((_, n)) => *n += 1,
            None => counts.push((member.locality.as_str(), 1)),
        }
    }

    if counts.is_empty() {
        return UNKNOWN_TOWN.to_string();
    }
    debug!(distribution = ?counts, "Town distribution");

    let mut best = counts[0];
    for entry in &counts[1..] {
        if entry.1 > best.1 {
            best = *entry;
        }
    }
    best.0.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_town(town: &str) -> GeocodeCandidate {
        GeocodeCandidate {
            street_name: "Main St".to_string(),
            latitude: 42.6,
            longitude: -71.3,
            display_address: format!("Main Street, {town}"),
            locality: town.to_string(),
            source_query: "Main St, Dracut, Massachusetts".to_string(),
        }
    }

    #[test]
    fn empty_is_unknown() {
        assert_eq!(resolve_primary_town(&[]), UNKNOWN_TOWN);
    }

    #[test]
    fn majority_wins() {
        let c = [in_town("Lowell"), in_town("Dracut"), in_town("Dracut")];
        let refs: Vec<&GeocodeCandidate> = c.iter().collect();
        assert_eq!(resolve_primary_town(&refs), "Dracut");
    }

    #[test]
    fn tie_goes_to_first_encountered_never_minority() {
        // {A:3, B:3, C:1} with B first in iteration order.
        let c = [
            in_town("B"),
            in_town("C"),
            in_town("A"),
            in_town("A"),
            in_town("B"),
            in_town("A"),
            in_town("B"),
        ];
        let refs: Vec<&GeocodeCandidate> = c.iter().collect();
        assert_eq!(resolve_primary_town(&refs), "B");

        let reversed: Vec<&GeocodeCandidate> = c.iter().rev().collect();
        // Reversed order: B, A, B, A, A, C, B → B still first.
        assert_eq!(resolve_primary_town(&reversed), "B");

        let a_first: Vec<&GeocodeCandidate> = c[2..].iter().chain(c[..2].iter()).collect();
        assert_eq!(resolve_primary_town(&a_first), "A");
    }

    #[test]
    fn locality_comparison_is_exact() {
        let c = [in_town("DRACUT"), in_town("Dracut"), in_town("Dracut")];
        let refs: Vec<&GeocodeCandidate> = c.iter().collect();
        assert_eq!(resolve_primary_town(&refs), "Dracut");
    }
}
