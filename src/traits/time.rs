//! Abstraction over the music clock the core samples.
//! The core itself only ever receives `now: f64` arguments; these providers
//! exist for hosts (`SystemTimeProvider`) and tests (`MockTimeProvider`).
//! Transport control is owned by the caller; the core never mutates it.

use std::cell::Cell;
use std::time::Instant;

/// A monotonic play clock in seconds.
pub trait TimeProvider {
    /// Seconds of play time elapsed. Monotonic while playing, frozen while
    /// stopped.
    fn now_seconds(&self) -> f64;

    /// Whether the transport is currently running.
    fn is_playing(&self) -> bool;
}

/// Wall-clock provider driven by `std::time::Instant`, with start/stop
/// transport. Time accumulates only across playing intervals.
#[derive(Debug, Default)]
pub struct SystemTimeProvider {
    accumulated: f64,
    playing_since: Option<Instant>,
}

impl SystemTimeProvider {
    /// Create a stopped clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or resume) the transport. No-op if already playing.
    pub fn start(&mut self) {
        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
    }

    /// Stop the transport, freezing the current time.
    pub fn stop(&mut self) {
        if let Some(since) = self.playing_since.take() {
            self.accumulated += since.elapsed().as_secs_f64();
        }
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_seconds(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.accumulated + since.elapsed().as_secs_f64(),
            None => self.accumulated,
        }
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }
}

/// Deterministic clock for tests.
#[derive(Debug, Default)]
pub struct MockTimeProvider {
    now: Cell<f64>,
    playing: Cell<bool>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, delta: f64) {
        self.now.set(self.now.get() + delta);
    }

    pub fn start(&self) {
        self.playing.set(true);
    }

    pub fn stop(&self) {
        self.playing.set(false);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_seconds(&self) -> f64 {
        self.now.get()
    }

    fn is_playing(&self) -> bool {
        self.playing.get()
    }
}
