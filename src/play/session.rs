//! The battle-facing facade: chart loading, the per-frame entry points, and
//! the event queue the surrounding game drains.

use log::{info, warn};

use crate::chart::compiler;
use crate::chart::document::{ChartDocument, ValidationError};
use crate::play::event::PlayEvent;
use crate::play::judge::{JudgeKind, JudgeWindows, JudgementEngine};
use crate::play::note::NoteRuntime;
use crate::play::scheduler::NoteScheduler;
use crate::play::score::JudgeStats;

/// Timing/judgement core for one battle session.
///
/// Single-threaded and tick-driven: the host calls [`BattleCore::tick`] and
/// [`BattleCore::update_hold_progress`] once per frame with the music
/// clock's current time, feeds input edges through
/// [`BattleCore::on_press`]/[`BattleCore::on_release`], and drains
/// [`PlayEvent`]s. Every entry point is a no-op until a chart loads.
#[derive(Debug, Default)]
pub struct BattleCore {
    scheduler: NoteScheduler,
    engine: JudgementEngine,
    events: Vec<PlayEvent>,
    /// Damage attached to `PlayerDamaged`; owned by the caller, not by the
    /// core.
    miss_damage: f64,
    loaded: bool,
}

impl BattleCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows(windows: JudgeWindows) -> Self {
        Self {
            engine: JudgementEngine::new(windows),
            ..Self::default()
        }
    }

    /// Set the damage amount reported with miss outcomes.
    pub fn set_miss_damage(&mut self, amount: f64) {
        self.miss_damage = amount;
    }

    /// Validate and compile a chart, replacing any previous session state.
    /// On validation failure nothing is mutated and every problem is
    /// returned.
    pub fn load_chart(&mut self, doc: &ChartDocument) -> Result<(), Vec<ValidationError>> {
        let errors = doc.validate();
        if !errors.is_empty() {
            warn!("chart rejected with {} validation error(s)", errors.len());
            return Err(errors);
        }

        let notes = compiler::compile(doc);
        info!(
            "chart loaded: {} notes, bpm {}, {} measures",
            notes.len(),
            doc.bpm,
            doc.measures
        );
        self.scheduler.load(notes);
        self.engine.reset();
        self.events.clear();
        self.loaded = true;
        Ok(())
    }

    /// Advance the note lifecycle to `now`. Call at least once per frame.
    pub fn tick(&mut self, now: f64) {
        if !self.loaded {
            return;
        }
        let from = self.events.len();
        self.scheduler.tick(now, &mut self.events);

        let auto_misses = self.events[from..]
            .iter()
            .filter(|e| matches!(e, PlayEvent::NoteAutoMissed(_)))
            .count();
        for _ in 0..auto_misses {
            self.engine.register_auto_miss();
        }
        self.push_damage_since(from);
    }

    /// A press edge at `now`.
    pub fn on_press(&mut self, now: f64) {
        if !self.loaded {
            return;
        }
        let from = self.events.len();
        self.engine
            .handle_press(now, &mut self.scheduler, &mut self.events);
        self.push_damage_since(from);
    }

    /// A release edge at `now`.
    pub fn on_release(&mut self, now: f64) {
        if !self.loaded {
            return;
        }
        let from = self.events.len();
        self.engine
            .handle_release(now, &mut self.scheduler, &mut self.events);
        self.push_damage_since(from);
    }

    /// Continuous hold-progress update, typically from the same loop as
    /// [`BattleCore::tick`].
    pub fn update_hold_progress(&mut self, now: f64) {
        if !self.loaded {
            return;
        }
        let from = self.events.len();
        self.engine
            .update_hold_progress(now, &mut self.scheduler, &mut self.events);
        self.push_damage_since(from);
    }

    /// Take all pending events, oldest first.
    pub fn drain_events(&mut self) -> Vec<PlayEvent> {
        std::mem::take(&mut self.events)
    }

    /// End the session. Ready for a fresh [`BattleCore::load_chart`].
    pub fn reset(&mut self) {
        self.scheduler.reset();
        self.engine.reset();
        self.events.clear();
        self.loaded = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_complete(&self) -> bool {
        self.loaded && self.scheduler.is_complete()
    }

    pub fn progress(&self) -> f64 {
        self.scheduler.progress()
    }

    pub fn stats(&self) -> &JudgeStats {
        self.engine.stats()
    }

    /// Active notes for rendering. Read-only.
    pub fn active_notes(&self) -> &[NoteRuntime] {
        self.scheduler.active_notes()
    }

    /// Raise `PlayerDamaged` for each miss outcome appended since `from`.
    fn push_damage_since(&mut self, from: usize) {
        let misses = self.events[from..]
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    PlayEvent::NoteAutoMissed(_)
                        | PlayEvent::JudgeResult {
                            kind: JudgeKind::Miss,
                            ..
                        }
                        | PlayEvent::HoldComplete {
                            kind: JudgeKind::Miss,
                            ..
                        }
                )
            })
            .count();
        for _ in 0..misses {
            self.events.push(PlayEvent::PlayerDamaged {
                amount: self.miss_damage,
            });
        }
    }
}
