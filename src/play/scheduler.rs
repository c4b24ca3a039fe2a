//! Tick-driven note lifecycle: admission from the upcoming queue, auto-miss
//! of overdue waiting notes, and cleanup of processed ones.
//!
//! The scheduler is the single writer for both containers. The judgement
//! engine reads through [`NoteScheduler::nearest_judgeable`] and mutates
//! through the exposed `mark_*`/hold operations only.

use std::collections::VecDeque;

use log::debug;

use super::event::PlayEvent;
use super::note::{HoldState, NoteId, NoteRuntime, NoteState};

/// Grace period after judgement time before a waiting note auto-misses.
pub const MISS_WINDOW: f64 = 0.2;
/// Retention after judgement time before a processed note is dropped.
pub const CLEANUP_DELAY: f64 = 1.0;
/// Look-ahead for press matching: only notes not yet reached, at most this
/// far in the future, are judgeable. Late presses never match; the note
/// resolves through auto-miss instead.
pub const EARLY_HIT_WINDOW: f64 = 0.5;

/// Owns the compiled note schedule and advances it against the music clock.
#[derive(Debug, Default)]
pub struct NoteScheduler {
    /// Time-sorted FIFO of notes not yet spawned.
    upcoming: VecDeque<NoteRuntime>,
    /// Spawned notes still being tracked. Unordered.
    active: Vec<NoteRuntime>,
    /// Notes that have left `Waiting`.
    processed: usize,
    /// Note count of the loaded chart.
    total: usize,
}

impl NoteScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the schedule with a freshly compiled note list
    /// (already sorted by judgement time).
    pub fn load(&mut self, notes: Vec<NoteRuntime>) {
        self.reset();
        self.total = notes.len();
        self.upcoming = notes.into();
        debug!("scheduler loaded {} notes", self.total);
    }

    /// Clear all state. Safe at any tick boundary; the scheduler is ready
    /// for a fresh load afterwards.
    pub fn reset(&mut self) {
        self.upcoming.clear();
        self.active.clear();
        self.processed = 0;
        self.total = 0;
    }

    /// Advance the lifecycle to `now`. Within one tick, admission runs
    /// before auto-miss, and auto-miss before cleanup.
    pub fn tick(&mut self, now: f64, events: &mut Vec<PlayEvent>) {
        // Admission.
        while self.upcoming.front().is_some_and(|n| now >= n.spawn_time) {
            if let Some(note) = self.upcoming.pop_front() {
                events.push(PlayEvent::NoteSpawned(note.clone()));
                self.active.push(note);
            }
        }

        // Auto-miss overdue waiting notes.
        for note in &mut self.active {
            if note.state == NoteState::Waiting && now > note.judgement_time + MISS_WINDOW {
                note.state = NoteState::Missed;
                if note.is_hold() {
                    note.hold_state = Some(HoldState::Failed);
                }
                self.processed += 1;
                events.push(PlayEvent::NoteAutoMissed(note.clone()));
                events.push(PlayEvent::NoteProcessed(note.clone()));
            }
        }

        // Cleanup. Candidates are collected first, then removed, so the scan
        // never mutates the collection it iterates. A hold still being held
        // is kept alive until its sub-machine terminates.
        let mut expired: Vec<NoteId> = Vec::new();
        for note in &self.active {
            if note.state != NoteState::Waiting
                && note.hold_state != Some(HoldState::Holding)
                && now > note.judgement_time + CLEANUP_DELAY
            {
                expired.push(note.id);
            }
        }
        if !expired.is_empty() {
            self.active.retain(|n| !expired.contains(&n.id));
        }
    }

    /// Among active waiting notes, the one closest to `input_time` whose
    /// judgement time lies in `[input_time, input_time + EARLY_HIT_WINDOW]`.
    pub fn nearest_judgeable(&self, input_time: f64) -> Option<NoteId> {
        self.active
            .iter()
            .filter(|n| {
                let ahead = n.judgement_time - input_time;
                n.state == NoteState::Waiting && (0.0..=EARLY_HIT_WINDOW).contains(&ahead)
            })
            .min_by(|a, b| {
                (a.judgement_time - input_time)
                    .abs()
                    .total_cmp(&(b.judgement_time - input_time).abs())
            })
            .map(|n| n.id)
    }

    /// Read access to a tracked note.
    pub fn note(&self, id: NoteId) -> Option<&NoteRuntime> {
        self.active.iter().find(|n| n.id == id)
    }

    /// All active notes, for rendering. Read-only.
    pub fn active_notes(&self) -> &[NoteRuntime] {
        &self.active
    }

    /// Finalize a waiting note as hit. Emits `NoteProcessed` and returns a
    /// snapshot of the note, or `None` when the note is unknown or already
    /// out of `Waiting`.
    pub fn mark_hit(&mut self, id: NoteId, events: &mut Vec<PlayEvent>) -> Option<NoteRuntime> {
        self.finalize(id, NoteState::Hit, events)
    }

    /// Finalize a waiting note as missed. A hold note's sub-machine fails
    /// with it. Emits `NoteProcessed` and returns a snapshot.
    pub fn mark_missed(&mut self, id: NoteId, events: &mut Vec<PlayEvent>) -> Option<NoteRuntime> {
        self.finalize(id, NoteState::Missed, events)
    }

    fn finalize(
        &mut self,
        id: NoteId,
        state: NoteState,
        events: &mut Vec<PlayEvent>,
    ) -> Option<NoteRuntime> {
        let note = self
            .active
            .iter_mut()
            .find(|n| n.id == id && n.state == NoteState::Waiting)?;
        note.state = state;
        if state == NoteState::Missed && note.is_hold() {
            note.hold_state = Some(HoldState::Failed);
        }
        self.processed += 1;
        let snapshot = note.clone();
        events.push(PlayEvent::NoteProcessed(snapshot.clone()));
        Some(snapshot)
    }

    /// Transition a hold note into `Holding` at `now`.
    pub fn begin_hold(&mut self, id: NoteId, now: f64) {
        if let Some(note) = self.active.iter_mut().find(|n| n.id == id) {
            note.begin_hold(now);
        }
    }

    /// Drive a hold note's sub-machine. Returns the sub-state after the
    /// update plus a snapshot, or `None` if the note is no longer tracked.
    pub fn update_hold(
        &mut self,
        id: NoteId,
        now: f64,
        is_held: bool,
    ) -> Option<(HoldState, NoteRuntime)> {
        let note = self.active.iter_mut().find(|n| n.id == id)?;
        let state = note.update_hold(now, is_held)?;
        Some((state, note.clone()))
    }

    /// True once every compiled note has been processed and dropped.
    pub fn is_complete(&self) -> bool {
        self.upcoming.is_empty() && self.active.is_empty() && self.processed == self.total
    }

    /// Fraction of notes processed, 1.0 for an empty chart.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.processed as f64 / self.total as f64).min(1.0)
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.processed
    }
}
