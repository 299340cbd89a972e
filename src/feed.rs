//! Feed mode switch
//!
//! Holds which live feed is authoritative and enforces the one-way
//! `Screenshot → Log` transition. Driven by decoded poll responses, never by
//! a timer.

use crate::types::{FeedMode, FeedState, Screenshot};

/// Single-writer owner of a session's [`FeedState`]
#[derive(Debug, Default)]
pub struct FeedSwitch {
    state: FeedState,
}

impl FeedSwitch {
    /// Fresh switch in screenshot mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Current feed state
    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Currently authoritative feed
    pub fn mode(&self) -> FeedMode {
        self.state.mode
    }

    /// Whether the log feed has delivered its snapshot
    pub fn is_finished(&self) -> bool {
        self.state.scraping_finished
    }

    /// Feed the next poll tick should request, `None` once polling is over
    pub fn next_poll(&self) -> Option<FeedMode> {
        if self.state.scraping_finished {
            None
        } else {
            Some(self.state.mode)
        }
    }

    /// Store a new screenshot frame, releasing the previous one
    ///
    /// Returns `false` (and stores nothing) once the switch is in log mode.
    pub fn record_screenshot(&mut self, shot: Screenshot) -> bool {
        if self.state.mode != FeedMode::Screenshot {
            return false;
        }
        self.state.last_screenshot = Some(shot);
        true
    }

    /// Apply a finish signal from the screenshot feed
    ///
    /// Returns `true` if this call performed the switch. Signals received
    /// after the switch are no-ops.
    pub fn apply_finish_signal(&mut self) -> bool {
        if self.state.mode == FeedMode::Log {
            return false;
        }
        self.state.mode = FeedMode::Log;
        true
    }

    /// Store the log snapshot fetched after the switch and mark the feed finished
    ///
    /// Returns `false` if not in log mode or the feed already finished.
    pub fn record_logs(&mut self, text: String) -> bool {
        if self.state.mode != FeedMode::Log || self.state.scraping_finished {
            return false;
        }
        self.state.log_text = text;
        self.state.scraping_finished = true;
        true
    }
}
