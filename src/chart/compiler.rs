//! Deterministic time compilation: musical grid positions to absolute
//! seconds. Runs once per validated chart; cannot fail over the declared
//! parameter ranges.

use log::debug;

use super::document::{BeatEvent, BeatPosition, ChartDocument};
use crate::play::note::NoteRuntime;

/// Seconds per beat at the given tempo.
pub fn beat_duration(bpm: u32) -> f64 {
    60.0 / f64::from(bpm)
}

/// Seconds per measure at the given tempo and grid.
pub fn measure_duration(bpm: u32, beats_per_measure: u32) -> f64 {
    beat_duration(bpm) * f64::from(beats_per_measure)
}

/// Absolute judgement time of a grid position, in seconds from song start.
pub fn judgement_time(position: BeatPosition, bpm: u32, beats_per_measure: u32) -> f64 {
    f64::from(position.measure) * measure_duration(bpm, beats_per_measure)
        + f64::from(position.beat) * beat_duration(bpm)
}

/// Compile a validated chart into its runtime note schedule.
///
/// The output is sorted ascending by judgement time; ties keep the original
/// event order. The scheduler drains this list front-to-back, so the stable
/// ordering is load-bearing.
pub fn compile(doc: &ChartDocument) -> Vec<NoteRuntime> {
    let beat = beat_duration(doc.bpm);
    let mut notes: Vec<NoteRuntime> = doc
        .events()
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let time = judgement_time(event.position(), doc.bpm, doc.beats_per_measure);
            match *event {
                BeatEvent::Tap { .. } => {
                    NoteRuntime::tap(index as u32, time, doc.fixed_drop_time)
                }
                BeatEvent::Hold { position, end_beat } => {
                    let hold_duration = f64::from(end_beat - position.beat) * beat;
                    NoteRuntime::hold(index as u32, time, doc.fixed_drop_time, hold_duration)
                }
            }
        })
        .collect();

    notes.sort_by(|a, b| a.judgement_time.total_cmp(&b.judgement_time));
    debug!(
        "compiled {} notes from {} events (bpm {}, {} beats/measure)",
        notes.len(),
        doc.events().len(),
        doc.bpm,
        doc.beats_per_measure
    );
    notes
}
