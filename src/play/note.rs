use serde::{Deserialize, Serialize};

/// Stable note identifier: the note's index in the authored event list.
pub type NoteId = u32;

/// Tap-or-hold lifecycle. `Waiting -> {Hit, Missed}`, then the scheduler
/// drops the note a fixed delay after its judgement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteState {
    Waiting,
    Hit,
    Missed,
}

/// Hold-note sub-state, independent of [`NoteState`].
/// `WaitingForPress -> Holding -> {Completed, Failed}`; both ends terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldState {
    WaitingForPress,
    Holding,
    Completed,
    Failed,
}

impl HoldState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteKind {
    Tap,
    Hold,
}

/// One scheduled note, derived from a beat event at compile time.
/// Owned exclusively by the scheduler; the judgement engine mutates it only
/// through scheduler-exposed operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRuntime {
    pub id: NoteId,
    pub kind: NoteKind,
    /// Absolute time the note should be hit, seconds from song start.
    pub judgement_time: f64,
    /// `judgement_time - fixed_drop_time`; when the note enters play.
    pub spawn_time: f64,
    pub hold_end_time: Option<f64>,
    pub hold_duration: Option<f64>,
    pub state: NoteState,
    pub hold_state: Option<HoldState>,
    /// Fraction of the hold duration sustained so far, in `[0, 1]`.
    pub hold_completion: f32,
    pub hold_start_time: Option<f64>,
}

impl NoteRuntime {
    /// Create a tap note.
    pub fn tap(id: NoteId, judgement_time: f64, drop_time: f64) -> Self {
        Self {
            id,
            kind: NoteKind::Tap,
            judgement_time,
            spawn_time: judgement_time - drop_time,
            hold_end_time: None,
            hold_duration: None,
            state: NoteState::Waiting,
            hold_state: None,
            hold_completion: 0.0,
            hold_start_time: None,
        }
    }

    /// Create a hold note spanning `hold_duration` seconds past its
    /// judgement time.
    pub fn hold(id: NoteId, judgement_time: f64, drop_time: f64, hold_duration: f64) -> Self {
        Self {
            id,
            kind: NoteKind::Hold,
            judgement_time,
            spawn_time: judgement_time - drop_time,
            hold_end_time: Some(judgement_time + hold_duration),
            hold_duration: Some(hold_duration),
            state: NoteState::Waiting,
            hold_state: Some(HoldState::WaitingForPress),
            hold_completion: 0.0,
            hold_start_time: None,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.kind == NoteKind::Hold
    }

    /// Start holding at `now`. Valid only for a hold note still waiting for
    /// its press; a repeated call is ignored.
    pub fn begin_hold(&mut self, now: f64) {
        if self.hold_state == Some(HoldState::WaitingForPress) {
            self.hold_state = Some(HoldState::Holding);
            self.hold_start_time = Some(now);
            self.hold_completion = 0.0;
        }
    }

    /// Advance the hold sub-machine. Only acts while `Holding`: a held key
    /// accrues completion and finishes at `hold_end_time`; releasing fails
    /// the hold immediately, whatever completion was reached.
    /// Returns the sub-state after the update.
    pub fn update_hold(&mut self, now: f64, is_held: bool) -> Option<HoldState> {
        if self.hold_state != Some(HoldState::Holding) {
            return self.hold_state;
        }

        if is_held {
            if let (Some(start), Some(duration), Some(end)) =
                (self.hold_start_time, self.hold_duration, self.hold_end_time)
            {
                if duration > 0.0 {
                    self.hold_completion = (((now - start) / duration).clamp(0.0, 1.0)) as f32;
                }
                if now >= end {
                    self.hold_state = Some(HoldState::Completed);
                    self.hold_completion = 1.0;
                }
            }
        } else {
            self.hold_state = Some(HoldState::Failed);
        }
        self.hold_state
    }
}
