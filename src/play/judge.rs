//! Press/release judgement against timing windows, and the driver for the
//! hold sub-protocol.
//!
//! The engine never touches the scheduler's containers directly: it selects
//! a target through `nearest_judgeable` and finalizes notes through the
//! scheduler's exposed operations.

use log::debug;
use serde::{Deserialize, Serialize};

use super::event::PlayEvent;
use super::note::{HoldState, NoteId, NoteRuntime};
use super::scheduler::NoteScheduler;
use super::score::JudgeStats;

/// Two-tier judgement result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgeKind {
    Success,
    Miss,
}

/// Minimum fraction of a hold that must be sustained for a success.
/// `Completed` forces completion to 1.0, so today this only guards the
/// final-result formula.
pub const HOLD_SUCCESS_THRESHOLD: f32 = 0.7;

/// Timing windows for press judgement, in milliseconds either side of a
/// note's judgement time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgeWindows {
    pub success_ms: f64,
    pub miss_ms: f64,
}

impl JudgeWindows {
    /// Classify a signed timing difference (press minus note time).
    /// `None` means the press does not produce a judgement.
    pub fn classify(&self, diff_ms: f64) -> Option<JudgeKind> {
        let abs = diff_ms.abs();
        if abs <= self.success_ms {
            Some(JudgeKind::Success)
        } else if abs <= self.miss_ms {
            Some(JudgeKind::Miss)
        } else {
            None
        }
    }
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self {
            success_ms: 100.0,
            miss_ms: 200.0,
        }
    }
}

/// Consumes discrete input edges and the clock, judges notes, and drives
/// hold progress. At most one hold is in flight at a time.
#[derive(Debug, Default)]
pub struct JudgementEngine {
    windows: JudgeWindows,
    current_hold: Option<NoteId>,
    is_holding_key: bool,
    stats: JudgeStats,
}

impl JudgementEngine {
    pub fn new(windows: JudgeWindows) -> Self {
        Self {
            windows,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> &JudgeStats {
        &self.stats
    }

    pub fn windows(&self) -> JudgeWindows {
        self.windows
    }

    /// Forget all per-session state.
    pub fn reset(&mut self) {
        self.current_hold = None;
        self.is_holding_key = false;
        self.stats.reset();
    }

    /// Judge a press at `now`.
    pub fn handle_press(
        &mut self,
        now: f64,
        scheduler: &mut NoteScheduler,
        events: &mut Vec<PlayEvent>,
    ) {
        self.is_holding_key = true;
        self.stats.total_inputs += 1;

        let Some(id) = scheduler.nearest_judgeable(now) else {
            self.stats.record_invalid();
            return;
        };
        let Some(target) = scheduler.note(id) else {
            self.stats.record_invalid();
            return;
        };

        let diff_ms = (now - target.judgement_time) * 1000.0;
        let kind = self.windows.classify(diff_ms);
        let is_hold = target.is_hold();
        debug!("press at {:.3}s: note {} diff {:.1}ms -> {:?}", now, id, diff_ms, kind);

        match (is_hold, kind) {
            (false, Some(JudgeKind::Success)) => {
                if let Some(note) = scheduler.mark_hit(id, events) {
                    self.stats.record_success();
                    events.push(PlayEvent::JudgeResult {
                        kind: JudgeKind::Success,
                        note,
                    });
                }
            }
            (false, Some(JudgeKind::Miss)) => {
                if let Some(note) = scheduler.mark_missed(id, events) {
                    self.stats.record_miss();
                    events.push(PlayEvent::JudgeResult {
                        kind: JudgeKind::Miss,
                        note,
                    });
                }
            }
            (false, None) => {
                // Outside the miss window: the press is swallowed and the
                // note stays eligible for auto-miss.
                self.stats.record_invalid();
            }
            (true, Some(_)) => {
                // Any in-window press begins the hold; scoring happens when
                // the sub-machine terminates.
                if scheduler.mark_hit(id, events).is_some() {
                    scheduler.begin_hold(id, now);
                    self.current_hold = Some(id);
                }
            }
            (true, None) => {
                // Failing the hold at the gate: an out-of-window press on a
                // hold consumes it as missed.
                if let Some(note) = scheduler.mark_missed(id, events) {
                    self.stats.record_miss();
                    events.push(PlayEvent::HoldComplete {
                        kind: JudgeKind::Miss,
                        note,
                    });
                }
            }
        }
    }

    /// Judge a release at `now`. Releasing while a hold is in flight fails
    /// the hold, whatever completion it had reached.
    pub fn handle_release(
        &mut self,
        now: f64,
        scheduler: &mut NoteScheduler,
        events: &mut Vec<PlayEvent>,
    ) {
        self.is_holding_key = false;
        if let Some(id) = self.current_hold.take() {
            if let Some((state, note)) = scheduler.update_hold(id, now, false) {
                self.finish_hold(state, note, events);
            }
        }
    }

    /// Continuous hold-progress update, driven from the host tick loop.
    pub fn update_hold_progress(
        &mut self,
        now: f64,
        scheduler: &mut NoteScheduler,
        events: &mut Vec<PlayEvent>,
    ) {
        let Some(id) = self.current_hold else {
            return;
        };
        match scheduler.update_hold(id, now, self.is_holding_key) {
            Some((state, note)) if state.is_terminal() => {
                self.current_hold = None;
                self.finish_hold(state, note, events);
            }
            Some(_) => {}
            None => {
                // Note vanished from tracking; nothing left to score.
                self.current_hold = None;
            }
        }
    }

    /// Bridge for scheduler-side auto-misses: counts the miss without
    /// counting an input.
    pub fn register_auto_miss(&mut self) {
        self.stats.record_miss();
    }

    fn finish_hold(&mut self, state: HoldState, note: NoteRuntime, events: &mut Vec<PlayEvent>) {
        let kind = if state == HoldState::Completed
            && note.hold_completion >= HOLD_SUCCESS_THRESHOLD
        {
            JudgeKind::Success
        } else {
            JudgeKind::Miss
        };
        match kind {
            JudgeKind::Success => self.stats.record_success(),
            JudgeKind::Miss => self.stats.record_miss(),
        }
        debug!("hold {} finished: {:?} ({:?})", note.id, kind, state);
        events.push(PlayEvent::HoldComplete { kind, note });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::note::NoteState;

    fn setup_tap(judgement_time: f64) -> NoteScheduler {
        let mut sched = NoteScheduler::new();
        sched.load(vec![NoteRuntime::tap(0, judgement_time, 2.0)]);
        let mut events = Vec::new();
        sched.tick(judgement_time - 0.5, &mut events);
        sched
    }

    fn setup_hold(judgement_time: f64, duration: f64) -> NoteScheduler {
        let mut sched = NoteScheduler::new();
        sched.load(vec![NoteRuntime::hold(0, judgement_time, 2.0, duration)]);
        let mut events = Vec::new();
        sched.tick(judgement_time - 0.5, &mut events);
        sched
    }

    #[test]
    fn window_classification() {
        let windows = JudgeWindows::default();
        assert_eq!(windows.classify(95.0), Some(JudgeKind::Success));
        assert_eq!(windows.classify(-95.0), Some(JudgeKind::Success));
        assert_eq!(windows.classify(100.0), Some(JudgeKind::Success));
        assert_eq!(windows.classify(150.0), Some(JudgeKind::Miss));
        assert_eq!(windows.classify(200.0), Some(JudgeKind::Miss));
        assert_eq!(windows.classify(250.0), None);
    }

    #[test]
    fn press_in_success_window_hits_tap() {
        let mut sched = setup_tap(10.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_press(9.905, &mut sched, &mut events);

        assert_eq!(sched.note(0).unwrap().state, NoteState::Hit);
        assert!(events.iter().any(|e| matches!(
            e,
            PlayEvent::JudgeResult { kind: JudgeKind::Success, .. }
        )));
        assert_eq!(engine.stats().success_count, 1);
        assert_eq!(engine.stats().combo, 1);
    }

    #[test]
    fn press_in_miss_window_consumes_tap() {
        let mut sched = setup_tap(10.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_press(9.85, &mut sched, &mut events);

        assert_eq!(sched.note(0).unwrap().state, NoteState::Missed);
        assert!(events.iter().any(|e| matches!(
            e,
            PlayEvent::JudgeResult { kind: JudgeKind::Miss, .. }
        )));
        assert_eq!(engine.stats().miss_count, 1);

        // A second press cannot re-judge the consumed note.
        engine.handle_press(9.95, &mut sched, &mut events);
        assert_eq!(engine.stats().invalid_inputs, 1);
    }

    #[test]
    fn press_outside_miss_window_is_swallowed() {
        let mut sched = setup_tap(10.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        // 250ms early: selected by the look-ahead, but no judgement.
        engine.handle_press(9.75, &mut sched, &mut events);

        assert_eq!(sched.note(0).unwrap().state, NoteState::Waiting);
        assert_eq!(engine.stats().invalid_inputs, 1);
        assert!(!events.iter().any(|e| matches!(e, PlayEvent::JudgeResult { .. })));
    }

    #[test]
    fn press_with_no_note_counts_invalid() {
        let mut sched = NoteScheduler::new();
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_press(1.0, &mut sched, &mut events);
        assert_eq!(engine.stats().total_inputs, 1);
        assert_eq!(engine.stats().invalid_inputs, 1);
    }

    #[test]
    fn hold_press_begins_holding() {
        let mut sched = setup_hold(10.0, 2.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_press(10.0, &mut sched, &mut events);

        let note = sched.note(0).unwrap();
        assert_eq!(note.state, NoteState::Hit);
        assert_eq!(note.hold_state, Some(HoldState::Holding));
        assert_eq!(note.hold_start_time, Some(10.0));
        // No score yet; it lands when the hold terminates.
        assert_eq!(engine.stats().success_count, 0);
    }

    #[test]
    fn hold_completes_to_success() {
        let mut sched = setup_hold(10.0, 2.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_press(10.0, &mut sched, &mut events);
        engine.update_hold_progress(11.0, &mut sched, &mut events);
        assert_eq!(engine.stats().success_count, 0);

        engine.update_hold_progress(12.0, &mut sched, &mut events);
        assert!(events.iter().any(|e| matches!(
            e,
            PlayEvent::HoldComplete { kind: JudgeKind::Success, .. }
        )));
        assert_eq!(engine.stats().success_count, 1);

        // The engine is idle again.
        engine.update_hold_progress(13.0, &mut sched, &mut events);
        assert_eq!(engine.stats().success_count, 1);
    }

    #[test]
    fn early_release_fails_hold() {
        let mut sched = setup_hold(10.0, 2.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_press(10.0, &mut sched, &mut events);
        // 99% through: still a miss on release.
        engine.handle_release(11.98, &mut sched, &mut events);

        assert!(events.iter().any(|e| matches!(
            e,
            PlayEvent::HoldComplete { kind: JudgeKind::Miss, .. }
        )));
        assert_eq!(engine.stats().miss_count, 1);
        assert_eq!(sched.note(0).unwrap().hold_state, Some(HoldState::Failed));
    }

    #[test]
    fn out_of_window_press_fails_hold_at_gate() {
        let mut sched = setup_hold(10.0, 2.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        // 300ms early: within look-ahead, outside the miss window.
        engine.handle_press(9.7, &mut sched, &mut events);

        let note = sched.note(0).unwrap();
        assert_eq!(note.state, NoteState::Missed);
        assert_eq!(note.hold_state, Some(HoldState::Failed));
        assert!(events.iter().any(|e| matches!(
            e,
            PlayEvent::HoldComplete { kind: JudgeKind::Miss, .. }
        )));
        assert_eq!(engine.stats().miss_count, 1);
    }

    #[test]
    fn release_without_hold_is_a_no_op() {
        let mut sched = setup_tap(10.0);
        let mut engine = JudgementEngine::default();
        let mut events = Vec::new();

        engine.handle_release(9.9, &mut sched, &mut events);
        assert!(events.is_empty());
        assert_eq!(engine.stats(), &JudgeStats::default());
    }

    #[test]
    fn auto_miss_bridge_counts_without_input() {
        let mut engine = JudgementEngine::default();
        engine.stats.record_success();
        engine.register_auto_miss();
        assert_eq!(engine.stats().miss_count, 1);
        assert_eq!(engine.stats().total_inputs, 0);
        assert_eq!(engine.stats().combo, 0);
    }
}
