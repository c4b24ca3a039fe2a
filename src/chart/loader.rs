//! Chart interchange format: the JSON layout shared with the authoring
//! tools. Parsing performs no validation; callers run the document through
//! validation before play.
//!
//! ```json
//! {
//!   "bpm": 120, "measures": 4, "beatsPerMeasure": 8, "fixedDropTime": 2.0,
//!   "events": [
//!     { "measure": 0, "beat": 0, "type": "Tap", "holdEndBeat": 0 },
//!     { "measure": 0, "beat": 2, "type": "Hold", "holdEndBeat": 5 }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::document::{BeatEvent, ChartDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum EventType {
    Tap,
    Hold,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    measure: u32,
    beat: u32,
    #[serde(rename = "type")]
    event_type: EventType,
    #[serde(default)]
    hold_end_beat: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartFile {
    bpm: u32,
    measures: u32,
    beats_per_measure: u32,
    fixed_drop_time: f64,
    events: Vec<EventRecord>,
}

impl From<&BeatEvent> for EventRecord {
    fn from(event: &BeatEvent) -> Self {
        let pos = event.position();
        Self {
            measure: pos.measure,
            beat: pos.beat,
            event_type: if event.is_hold() {
                EventType::Hold
            } else {
                EventType::Tap
            },
            hold_end_beat: event.end_beat().unwrap_or(0),
        }
    }
}

impl From<EventRecord> for BeatEvent {
    fn from(record: EventRecord) -> Self {
        match record.event_type {
            EventType::Tap => BeatEvent::tap(record.measure, record.beat),
            EventType::Hold => BeatEvent::hold(record.measure, record.beat, record.hold_end_beat),
        }
    }
}

/// Parse a chart from its interchange JSON.
pub fn from_json(text: &str) -> Result<ChartDocument> {
    let file: ChartFile = serde_json::from_str(text).context("malformed chart JSON")?;
    Ok(ChartDocument::with_events(
        file.bpm,
        file.measures,
        file.beats_per_measure,
        file.fixed_drop_time,
        file.events.into_iter().map(BeatEvent::from).collect(),
    ))
}

/// Serialize a chart to interchange JSON.
pub fn to_json(doc: &ChartDocument) -> Result<String> {
    let file = ChartFile {
        bpm: doc.bpm,
        measures: doc.measures,
        beats_per_measure: doc.beats_per_measure,
        fixed_drop_time: doc.fixed_drop_time,
        events: doc.events().iter().map(EventRecord::from).collect(),
    };
    serde_json::to_string_pretty(&file).context("failed to serialize chart")
}

/// Load a chart document from a file.
pub fn load_chart_file(path: &Path) -> Result<ChartDocument> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read chart file {}", path.display()))?;
    from_json(&text).with_context(|| format!("failed to parse chart file {}", path.display()))
}

/// Write a chart document to a file.
pub fn save_chart_file(path: &Path, doc: &ChartDocument) -> Result<()> {
    let text = to_json(doc)?;
    fs::write(path, text)
        .with_context(|| format!("failed to write chart file {}", path.display()))
}
