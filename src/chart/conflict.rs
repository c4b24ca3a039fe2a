//! Occupancy and overlap analysis for authored beat events.
//!
//! Everything here is a pure function over event values: the authoring layer
//! calls these at insertion time (gate + displacement search) and full
//! validation runs the pairwise sweep before a chart is compiled.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::{BeatEvent, BeatPosition};

/// Classification of an overlap between two events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Two taps on the same grid cell.
    SamePositionTap,
    /// A tap inside a hold's span (either insertion order).
    TapHoldOverlap,
    /// Two holds with identical measure, start and end beats.
    SamePositionHold,
    /// Two distinct holds sharing at least one beat.
    HoldHoldOverlap,
}

/// One overlap between a candidate event and an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDetail {
    pub kind: ConflictKind,
    /// The existing event that was overlapped.
    pub other: BeatEvent,
    /// The grid cells shared by both events.
    pub overlap: Vec<BeatPosition>,
}

impl fmt::Display for ConflictDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self.overlap.iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "{:?} with event at {} (cells {})",
            self.kind,
            self.other.position(),
            cells.join(", ")
        )
    }
}

/// The set of grid cells an event occupies, endpoints inclusive.
///
/// A hold whose ordering is inverted degrades to occupying only its start
/// beat. That is a defensive fallback for diagnostics, not a success path:
/// validation rejects such holds before they reach compilation.
pub fn occupied_beats(event: &BeatEvent) -> Vec<BeatPosition> {
    match *event {
        BeatEvent::Tap { position } => vec![position],
        BeatEvent::Hold { position, end_beat } => {
            if end_beat <= position.beat {
                return vec![position];
            }
            (position.beat..=end_beat)
                .map(|b| BeatPosition::new(position.measure, b))
                .collect()
        }
    }
}

/// Whether any existing event occupies `position`.
pub fn is_beat_occupied(position: BeatPosition, existing: &[BeatEvent]) -> bool {
    existing
        .iter()
        .any(|e| occupied_beats(e).contains(&position))
}

fn classify(a: &BeatEvent, b: &BeatEvent) -> ConflictKind {
    match (a, b) {
        (BeatEvent::Tap { .. }, BeatEvent::Tap { .. }) => ConflictKind::SamePositionTap,
        (BeatEvent::Tap { .. }, BeatEvent::Hold { .. })
        | (BeatEvent::Hold { .. }, BeatEvent::Tap { .. }) => ConflictKind::TapHoldOverlap,
        (
            BeatEvent::Hold { position: pa, end_beat: ea },
            BeatEvent::Hold { position: pb, end_beat: eb },
        ) => {
            if pa == pb && ea == eb {
                ConflictKind::SamePositionHold
            } else {
                ConflictKind::HoldHoldOverlap
            }
        }
    }
}

fn overlap_of(a: &BeatEvent, b: &BeatEvent) -> Vec<BeatPosition> {
    let cells_b = occupied_beats(b);
    occupied_beats(a)
        .into_iter()
        .filter(|cell| cells_b.contains(cell))
        .collect()
}

/// Every conflict between `new` and the existing events.
pub fn conflicts_of(new: &BeatEvent, existing: &[BeatEvent]) -> Vec<ConflictDetail> {
    let mut details = Vec::new();
    for other in existing {
        let overlap = overlap_of(new, other);
        if !overlap.is_empty() {
            details.push(ConflictDetail {
                kind: classify(new, other),
                other: *other,
                overlap,
            });
        }
    }
    details
}

/// Boolean projection of [`conflicts_of`], short-circuiting on the first hit.
pub fn has_conflict(new: &BeatEvent, existing: &[BeatEvent]) -> bool {
    existing.iter().any(|other| !overlap_of(new, other).is_empty())
}

/// Pairwise sweep of the whole event list; each unordered pair is reported
/// at most once. O(n^2) over authored events, which stay small.
pub fn validate_events(events: &[BeatEvent]) -> Vec<ConflictDetail> {
    let mut details = Vec::new();
    for (i, a) in events.iter().enumerate() {
        for b in &events[i + 1..] {
            let overlap = overlap_of(a, b);
            if !overlap.is_empty() {
                details.push(ConflictDetail {
                    kind: classify(a, b),
                    other: *b,
                    overlap,
                });
            }
        }
    }
    details
}

/// Find a free beat at or near the preferred position.
///
/// Returns the preferred position when it is unoccupied. Otherwise probes
/// only the two endpoint offsets `-r` and `+r` for each radius
/// `1..=search_radius` (a sparse widening search, not a dense scan), wrapping
/// beat overflow into the neighbouring measures and skipping positions
/// outside `[0, max_measures)`. Deterministic for unchanged inputs.
pub fn find_nearby_free_beat(
    preferred: BeatPosition,
    existing: &[BeatEvent],
    max_measures: u32,
    beats_per_measure: u32,
    search_radius: u32,
) -> Option<BeatPosition> {
    if beats_per_measure == 0 {
        return None;
    }
    if preferred.measure < max_measures && !is_beat_occupied(preferred, existing) {
        return Some(preferred);
    }

    let bpm = i64::from(beats_per_measure);
    for radius in 1..=i64::from(search_radius) {
        for offset in [-radius, radius] {
            let raw = i64::from(preferred.beat) + offset;
            let measure = i64::from(preferred.measure) + raw.div_euclid(bpm);
            if measure < 0 || measure >= i64::from(max_measures) {
                continue;
            }
            let candidate = BeatPosition::new(measure as u32, raw.rem_euclid(bpm) as u32);
            if !is_beat_occupied(candidate, existing) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tap_occupies_single_cell() {
        let cells = occupied_beats(&BeatEvent::tap(2, 3));
        assert_eq!(cells, vec![BeatPosition::new(2, 3)]);
    }

    #[test]
    fn hold_occupies_inclusive_span() {
        let cells = occupied_beats(&BeatEvent::hold(1, 2, 5));
        assert_eq!(
            cells,
            vec![
                BeatPosition::new(1, 2),
                BeatPosition::new(1, 3),
                BeatPosition::new(1, 4),
                BeatPosition::new(1, 5),
            ]
        );
    }

    #[test]
    fn inverted_hold_degrades_to_start_beat() {
        let cells = occupied_beats(&BeatEvent::hold(1, 5, 2));
        assert_eq!(cells, vec![BeatPosition::new(1, 5)]);
    }

    #[test]
    fn conflict_kind_classification() {
        let tap = BeatEvent::tap(0, 2);
        let hold = BeatEvent::hold(0, 1, 4);
        let same_hold = BeatEvent::hold(0, 1, 4);
        let other_hold = BeatEvent::hold(0, 3, 6);

        assert_eq!(
            conflicts_of(&tap, &[BeatEvent::tap(0, 2)])[0].kind,
            ConflictKind::SamePositionTap
        );
        assert_eq!(
            conflicts_of(&tap, &[hold])[0].kind,
            ConflictKind::TapHoldOverlap
        );
        assert_eq!(
            conflicts_of(&hold, &[BeatEvent::tap(0, 2)])[0].kind,
            ConflictKind::TapHoldOverlap
        );
        assert_eq!(
            conflicts_of(&hold, &[same_hold])[0].kind,
            ConflictKind::SamePositionHold
        );
        assert_eq!(
            conflicts_of(&hold, &[other_hold])[0].kind,
            ConflictKind::HoldHoldOverlap
        );
    }

    #[test]
    fn conflict_reports_overlap_cells() {
        let details = conflicts_of(&BeatEvent::hold(0, 2, 5), &[BeatEvent::hold(0, 4, 7)]);
        assert_eq!(details.len(), 1);
        assert_eq!(
            details[0].overlap,
            vec![BeatPosition::new(0, 4), BeatPosition::new(0, 5)]
        );
    }

    #[test]
    fn disjoint_events_do_not_conflict() {
        let existing = [BeatEvent::tap(0, 0), BeatEvent::hold(1, 0, 3)];
        assert!(!has_conflict(&BeatEvent::tap(0, 1), &existing));
        assert!(conflicts_of(&BeatEvent::hold(2, 0, 2), &existing).is_empty());
    }

    #[test]
    fn cross_measure_positions_never_collide() {
        // Same beat number, different measures.
        assert!(!has_conflict(&BeatEvent::tap(1, 3), &[BeatEvent::tap(0, 3)]));
    }

    #[test]
    fn validate_events_reports_each_pair_once() {
        let events = [
            BeatEvent::tap(0, 0),
            BeatEvent::tap(0, 0),
            BeatEvent::hold(0, 0, 2),
        ];
        let details = validate_events(&events);
        // Pairs: (0,1), (0,2), (1,2).
        assert_eq!(details.len(), 3);
    }

    #[test]
    fn free_beat_prefers_requested_position() {
        let existing = [BeatEvent::tap(0, 0)];
        let pos = find_nearby_free_beat(BeatPosition::new(1, 2), &existing, 4, 8, 2);
        assert_eq!(pos, Some(BeatPosition::new(1, 2)));
    }

    #[test]
    fn free_beat_probes_minus_then_plus() {
        let existing = [BeatEvent::tap(1, 2)];
        let pos = find_nearby_free_beat(BeatPosition::new(1, 2), &existing, 4, 8, 2);
        assert_eq!(pos, Some(BeatPosition::new(1, 1)));

        // With -1 also taken, +1 wins before radius 2.
        let existing = [BeatEvent::tap(1, 2), BeatEvent::tap(1, 1)];
        let pos = find_nearby_free_beat(BeatPosition::new(1, 2), &existing, 4, 8, 2);
        assert_eq!(pos, Some(BeatPosition::new(1, 3)));
    }

    #[test]
    fn free_beat_skips_intermediate_offsets() {
        // Occupy the radius-1 endpoints around (0,4); beat 2 and 6 stay free
        // and are only reachable at radius 2 even though nothing sits between.
        let existing = [
            BeatEvent::tap(0, 4),
            BeatEvent::tap(0, 3),
            BeatEvent::tap(0, 5),
        ];
        let pos = find_nearby_free_beat(BeatPosition::new(0, 4), &existing, 4, 8, 2);
        assert_eq!(pos, Some(BeatPosition::new(0, 2)));
    }

    #[test]
    fn free_beat_wraps_into_adjacent_measures() {
        let existing = [BeatEvent::tap(1, 0)];
        let pos = find_nearby_free_beat(BeatPosition::new(1, 0), &existing, 4, 8, 1);
        // -1 wraps to the last beat of the previous measure.
        assert_eq!(pos, Some(BeatPosition::new(0, 7)));
    }

    #[test]
    fn free_beat_respects_chart_bounds() {
        // At measure 0 beat 0, the -1 probe would land before the chart.
        let existing = [BeatEvent::tap(0, 0)];
        let pos = find_nearby_free_beat(BeatPosition::new(0, 0), &existing, 4, 8, 1);
        assert_eq!(pos, Some(BeatPosition::new(0, 1)));

        // Fully saturated single-measure chart: nothing to find.
        let full: Vec<BeatEvent> = (0..8).map(|b| BeatEvent::tap(0, b)).collect();
        let pos = find_nearby_free_beat(BeatPosition::new(0, 4), &full, 1, 8, 8);
        assert_eq!(pos, None);
    }

    proptest! {
        /// Two events reported conflict-free really have disjoint cells.
        #[test]
        fn no_conflict_means_disjoint_cells(
            m1 in 0u32..4, b1 in 0u32..8,
            m2 in 0u32..4, b2 in 0u32..6, span in 1u32..2,
        ) {
            let tap = BeatEvent::tap(m1, b1);
            let hold = BeatEvent::hold(m2, b2, b2 + span);
            if !has_conflict(&tap, &[hold]) {
                let cells = occupied_beats(&hold);
                prop_assert!(!cells.contains(&tap.position()));
            }
        }

        /// The slot search is a pure function of its arguments.
        #[test]
        fn free_beat_search_is_idempotent(
            measure in 0u32..4, beat in 0u32..8,
            taken in proptest::collection::vec((0u32..4, 0u32..8), 0..12),
        ) {
            let existing: Vec<BeatEvent> =
                taken.iter().map(|&(m, b)| BeatEvent::tap(m, b)).collect();
            let preferred = BeatPosition::new(measure, beat);
            let first = find_nearby_free_beat(preferred, &existing, 4, 8, 3);
            let second = find_nearby_free_beat(preferred, &existing, 4, 8, 3);
            prop_assert_eq!(first, second);
            if let Some(found) = first {
                prop_assert!(!is_beat_occupied(found, &existing));
                prop_assert!(found.measure < 4);
                prop_assert!(found.beat < 8);
            }
        }
    }
}
