use serde::{Deserialize, Serialize};

/// Input and outcome counters for one play session.
///
/// `total_inputs` counts every press; `invalid_inputs` counts presses that
/// matched no eligible note. Auto-misses add to `miss_count` without adding
/// an input, since no press occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JudgeStats {
    pub total_inputs: u32,
    pub invalid_inputs: u32,
    pub success_count: u32,
    pub miss_count: u32,
    pub combo: u32,
    pub max_combo: u32,
}

impl JudgeStats {
    pub fn record_success(&mut self) {
        self.success_count += 1;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
    }

    pub fn record_miss(&mut self) {
        self.miss_count += 1;
        self.combo = 0;
    }

    pub fn record_invalid(&mut self) {
        self.invalid_inputs += 1;
    }

    /// Presses that were judged against a note.
    pub fn valid_inputs(&self) -> u32 {
        self.total_inputs.saturating_sub(self.invalid_inputs)
    }

    /// `(valid - misses) / valid`, clamped to `[0, 1]`. Zero when the
    /// player produced no valid input (auto-misses can push the raw ratio
    /// below zero).
    pub fn accuracy(&self) -> f64 {
        let valid = self.valid_inputs();
        if valid == 0 {
            return 0.0;
        }
        let raw = (f64::from(valid) - f64::from(self.miss_count)) / f64::from(valid);
        raw.clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
