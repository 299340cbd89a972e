//! Progress estimator
//!
//! Advances a percentage and a stage label on a fixed wall-clock schedule.
//! The estimate is cosmetic: it is not synchronized with the feed polling
//! loop and says nothing about real backend progress.

use crate::config::ProgressConfig;
use crate::types::ProgressState;

/// Label shown while no session is scanning
pub const WAITING_LABEL: &str = "Waiting to start";

/// Result of advancing the estimator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed (no new ticks elapsed, or already complete)
    Unchanged,
    /// Percentage advanced
    Advanced {
        /// Whether the stage label changed
        stage_changed: bool,
    },
    /// Percentage reached 100. Returned exactly once.
    Completed {
        /// Whether the stage label changed
        stage_changed: bool,
    },
}

/// Elapsed-time progress estimate over a fixed number of ticks
#[derive(Clone, Debug)]
pub struct ProgressEstimator {
    stages: Vec<String>,
    initializing_label: String,
    completed_label: String,
    total_ticks: u64,
    ticks: u64,
    state: ProgressState,
    completed: bool,
}

impl ProgressEstimator {
    /// Create an estimator at 0%, showing the initializing label
    pub fn new(config: &ProgressConfig) -> Self {
        let stages = if config.stages.is_empty() {
            vec![String::new()]
        } else {
            config.stages.clone()
        };
        let state = ProgressState {
            percent: 0.0,
            stage_index: 0,
            stage_label: config.initializing_label.clone(),
        };

        Self {
            stages,
            initializing_label: config.initializing_label.clone(),
            completed_label: config.completed_label.clone(),
            total_ticks: config.total_ticks(),
            ticks: 0,
            state,
            completed: false,
        }
    }

    /// Current estimate
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Whether 100% has been reached
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Ticks counted so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance by one tick
    pub fn tick(&mut self) -> TickOutcome {
        self.advance_to(self.ticks + 1)
    }

    /// Advance to `elapsed_ticks` ticks since the start
    ///
    /// Counts lower than the current one are ignored, so the estimate never
    /// moves backwards. A jump over several bands lands on the highest band
    /// whose threshold was crossed.
    pub fn advance_to(&mut self, elapsed_ticks: u64) -> TickOutcome {
        if self.completed || elapsed_ticks <= self.ticks {
            return TickOutcome::Unchanged;
        }

        self.ticks = elapsed_ticks.min(self.total_ticks);
        let previous_label = std::mem::take(&mut self.state.stage_label);
        let stage = self.stage_for(self.ticks);

        if self.ticks >= self.total_ticks {
            self.completed = true;
            self.state.percent = 100.0;
            self.state.stage_index = stage.unwrap_or(0);
            self.state.stage_label = self.completed_label.clone();
            let stage_changed = self.state.stage_label != previous_label;
            return TickOutcome::Completed { stage_changed };
        }

        self.state.percent = self.ticks as f64 * 100.0 / self.total_ticks as f64;
        match stage {
            Some(index) => {
                self.state.stage_index = index;
                self.state.stage_label = self.stages[index].clone();
            }
            None => self.state.stage_label = self.initializing_label.clone(),
        }
        TickOutcome::Advanced {
            stage_changed: self.state.stage_label != previous_label,
        }
    }

    // Stage k is entered once (k+1)/N of the run has elapsed; None before the first band
    fn stage_for(&self, ticks: u64) -> Option<usize> {
        let n = self.stages.len() as u64;
        let crossed = ticks.saturating_mul(n) / self.total_ticks;
        crossed.checked_sub(1).map(|k| k.min(n - 1) as usize)
    }
}
