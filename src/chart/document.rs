use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::conflict::{self, ConflictDetail};

/// Allowed tempo range in beats per minute.
pub const BPM_RANGE: RangeInclusive<u32> = 60..=300;
/// Allowed chart length in measures.
pub const MEASURES_RANGE: RangeInclusive<u32> = 1..=32;
/// Allowed beats per measure.
pub const BEATS_PER_MEASURE_RANGE: RangeInclusive<u32> = 4..=16;
/// Allowed note drop time (spawn-to-judgement travel) in seconds.
pub const DROP_TIME_RANGE: RangeInclusive<f64> = 0.5..=5.0;

/// A point on the chart's musical grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeatPosition {
    pub measure: u32,
    pub beat: u32,
}

impl BeatPosition {
    pub fn new(measure: u32, beat: u32) -> Self {
        Self { measure, beat }
    }
}

impl fmt::Display for BeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.measure, self.beat)
    }
}

/// A single authored beat event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeatEvent {
    Tap {
        position: BeatPosition,
    },
    /// Hold spanning `[position.beat, end_beat]` within one measure.
    /// Invariant (enforced by validation): `end_beat > beat` and
    /// `end_beat < beats_per_measure`.
    Hold {
        position: BeatPosition,
        end_beat: u32,
    },
}

impl BeatEvent {
    /// Create a tap event.
    pub fn tap(measure: u32, beat: u32) -> Self {
        Self::Tap {
            position: BeatPosition::new(measure, beat),
        }
    }

    /// Create a hold event.
    pub fn hold(measure: u32, beat: u32, end_beat: u32) -> Self {
        Self::Hold {
            position: BeatPosition::new(measure, beat),
            end_beat,
        }
    }

    /// Start position of the event.
    pub fn position(&self) -> BeatPosition {
        match *self {
            Self::Tap { position } | Self::Hold { position, .. } => position,
        }
    }

    /// End beat for holds, `None` for taps.
    pub fn end_beat(&self) -> Option<u32> {
        match *self {
            Self::Tap { .. } => None,
            Self::Hold { end_beat, .. } => Some(end_beat),
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self, Self::Hold { .. })
    }
}

/// A structural or conflict problem found during validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    BpmOutOfRange(u32),
    MeasuresOutOfRange(u32),
    BeatsPerMeasureOutOfRange(u32),
    DropTimeOutOfRange(f64),
    /// Event starts past the end of the chart.
    MeasureOutOfRange { index: usize, measure: u32 },
    /// Event beat does not fit the measure grid.
    BeatOutOfRange { index: usize, beat: u32 },
    /// Hold end beat does not satisfy `start < end < beats_per_measure`.
    InvalidHoldRange { index: usize, beat: u32, end_beat: u32 },
    /// Two events occupy overlapping beats.
    Conflict(ConflictDetail),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BpmOutOfRange(bpm) => {
                write!(f, "bpm {} outside [{}, {}]", bpm, BPM_RANGE.start(), BPM_RANGE.end())
            }
            Self::MeasuresOutOfRange(m) => write!(
                f,
                "measure count {} outside [{}, {}]",
                m,
                MEASURES_RANGE.start(),
                MEASURES_RANGE.end()
            ),
            Self::BeatsPerMeasureOutOfRange(b) => write!(
                f,
                "beats per measure {} outside [{}, {}]",
                b,
                BEATS_PER_MEASURE_RANGE.start(),
                BEATS_PER_MEASURE_RANGE.end()
            ),
            Self::DropTimeOutOfRange(t) => write!(
                f,
                "drop time {}s outside [{}, {}]",
                t,
                DROP_TIME_RANGE.start(),
                DROP_TIME_RANGE.end()
            ),
            Self::MeasureOutOfRange { index, measure } => {
                write!(f, "event {}: measure {} past end of chart", index, measure)
            }
            Self::BeatOutOfRange { index, beat } => {
                write!(f, "event {}: beat {} outside measure grid", index, beat)
            }
            Self::InvalidHoldRange { index, beat, end_beat } => write!(
                f,
                "event {}: hold range {}..={} is not a valid span",
                index, beat, end_beat
            ),
            Self::Conflict(detail) => write!(f, "conflict: {}", detail),
        }
    }
}

/// Immutable description of a chart: tempo/grid parameters plus the authored
/// beat events. Created by a loader, mutated only through the validated
/// insert/remove operations below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    pub bpm: u32,
    pub measures: u32,
    pub beats_per_measure: u32,
    /// Seconds a note travels from spawn to its judgement line.
    pub fixed_drop_time: f64,
    events: Vec<BeatEvent>,
}

impl ChartDocument {
    /// Create an empty chart with the given parameters.
    pub fn new(bpm: u32, measures: u32, beats_per_measure: u32, fixed_drop_time: f64) -> Self {
        Self {
            bpm,
            measures,
            beats_per_measure,
            fixed_drop_time,
            events: Vec::new(),
        }
    }

    /// Build a chart from pre-authored events. No validation is performed
    /// here; callers go through [`ChartDocument::validate`] before play.
    pub fn with_events(
        bpm: u32,
        measures: u32,
        beats_per_measure: u32,
        fixed_drop_time: f64,
        events: Vec<BeatEvent>,
    ) -> Self {
        Self {
            bpm,
            measures,
            beats_per_measure,
            fixed_drop_time,
            events,
        }
    }

    pub fn events(&self) -> &[BeatEvent] {
        &self.events
    }

    /// Structural checks for a single event against this chart's grid.
    pub fn validate_event(&self, index: usize, event: &BeatEvent) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let pos = event.position();
        if pos.measure >= self.measures {
            errors.push(ValidationError::MeasureOutOfRange {
                index,
                measure: pos.measure,
            });
        }
        if pos.beat >= self.beats_per_measure {
            errors.push(ValidationError::BeatOutOfRange {
                index,
                beat: pos.beat,
            });
        }
        if let BeatEvent::Hold { position, end_beat } = *event
            && (end_beat <= position.beat || end_beat >= self.beats_per_measure)
        {
            errors.push(ValidationError::InvalidHoldRange {
                index,
                beat: position.beat,
                end_beat,
            });
        }
        errors
    }

    /// Full-document validation: parameter ranges, per-event structure and
    /// pairwise occupancy conflicts. Returns every problem found; an empty
    /// list means the chart is playable.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !BPM_RANGE.contains(&self.bpm) {
            errors.push(ValidationError::BpmOutOfRange(self.bpm));
        }
        if !MEASURES_RANGE.contains(&self.measures) {
            errors.push(ValidationError::MeasuresOutOfRange(self.measures));
        }
        if !BEATS_PER_MEASURE_RANGE.contains(&self.beats_per_measure) {
            errors.push(ValidationError::BeatsPerMeasureOutOfRange(
                self.beats_per_measure,
            ));
        }
        if !DROP_TIME_RANGE.contains(&self.fixed_drop_time) {
            errors.push(ValidationError::DropTimeOutOfRange(self.fixed_drop_time));
        }

        for (index, event) in self.events.iter().enumerate() {
            errors.extend(self.validate_event(index, event));
        }

        errors.extend(
            conflict::validate_events(&self.events)
                .into_iter()
                .map(ValidationError::Conflict),
        );

        errors
    }

    /// Insert an event if it is structurally valid and conflict-free.
    /// On rejection the document is unchanged and every problem is reported.
    pub fn try_insert(&mut self, event: BeatEvent) -> Result<(), Vec<ValidationError>> {
        let mut errors = self.validate_event(self.events.len(), &event);
        errors.extend(
            conflict::conflicts_of(&event, &self.events)
                .into_iter()
                .map(ValidationError::Conflict),
        );
        if !errors.is_empty() {
            return Err(errors);
        }
        self.events.push(event);
        Ok(())
    }

    /// Insert an event, displacing it to a nearby free beat when the
    /// preferred position is taken. Returns the position actually used, or
    /// `None` when no free slot exists within `search_radius`.
    pub fn insert_or_displace(
        &mut self,
        event: BeatEvent,
        search_radius: u32,
    ) -> Option<BeatPosition> {
        let preferred = event.position();
        if self.try_insert(event).is_ok() {
            return Some(preferred);
        }

        let target = conflict::find_nearby_free_beat(
            preferred,
            &self.events,
            self.measures,
            self.beats_per_measure,
            search_radius,
        )?;

        let relocated = match event {
            BeatEvent::Tap { .. } => BeatEvent::Tap { position: target },
            BeatEvent::Hold { position, end_beat } => {
                let span = end_beat.saturating_sub(position.beat);
                BeatEvent::Hold {
                    position: target,
                    end_beat: target.beat + span,
                }
            }
        };
        self.try_insert(relocated).ok()?;
        Some(target)
    }

    /// Remove the event starting at `position`, returning it if present.
    pub fn remove_at(&mut self, position: BeatPosition) -> Option<BeatEvent> {
        let idx = self.events.iter().position(|e| e.position() == position)?;
        Some(self.events.remove(idx))
    }

    /// The event starting at `position`, if any.
    pub fn event_at(&self, position: BeatPosition) -> Option<&BeatEvent> {
        self.events.iter().find(|e| e.position() == position)
    }
}
