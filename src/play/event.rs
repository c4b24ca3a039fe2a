use serde::{Deserialize, Serialize};

use super::judge::JudgeKind;
use super::note::NoteRuntime;

/// Messages produced while driving the core, drained by the host each frame.
///
/// Subscribers read a message queue rather than registering callbacks, so
/// callers own dispatch and no callback state lives inside the core. Events
/// carry note snapshots, not references into the scheduler's containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayEvent {
    /// A note entered the active window and should become visible.
    NoteSpawned(NoteRuntime),
    /// A note left `Waiting`, by input or by timeout.
    NoteProcessed(NoteRuntime),
    /// A waiting note ran out its miss window with no input.
    NoteAutoMissed(NoteRuntime),
    /// A discrete press was judged against a tap note.
    JudgeResult { kind: JudgeKind, note: NoteRuntime },
    /// A hold reached a terminal sub-state and was scored.
    HoldComplete { kind: JudgeKind, note: NoteRuntime },
    /// A miss outcome occurred; `amount` is the caller-configured damage.
    PlayerDamaged { amount: f64 },
}
