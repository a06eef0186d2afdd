//! Live state of one open terminal session.

use crate::awareness::{self, AwarenessInputs, AwarenessState};
use crate::config::AwarenessTuning;
use std::time::Instant;

/// The complete session state - everything the interpreter mutates.
///
/// Created when the terminal opens, reset on close or reboot. Only the
/// persisted mode flags outlive it.
#[derive(Debug)]
pub struct Session {
    /// Raw command lines in submission order. Append-only within a session;
    /// drives arrow-key recall and the awareness recomputation.
    pub history: Vec<String>,

    /// Current awareness score in [0, 100].
    pub awareness: f64,

    /// Discrete state derived from `awareness`.
    pub state: AwarenessState,

    /// Granted only by `sudo override`; cleared only by close/reboot.
    pub privileged: bool,

    /// One-way latches biasing the awareness formula. Settable at most once
    /// per session; repeats are a no-op with a message.
    pub is_ascended: bool,
    pub is_transcended: bool,

    /// One-shot awareness floor consumed by the next recomputation after a
    /// latch is set.
    pub pending_floor: Option<f64>,

    /// Cursor into `history` for arrow-key recall.
    pub history_index: usize,

    /// When the session clock started.
    pub started_at: Instant,

    /// Whether the boot sequence has run.
    pub booted: bool,
}

/// A state transition observed during recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AwarenessState,
    pub to: AwarenessState,
}

impl Transition {
    /// True when the session fell out of `enlightened` (god-mode must drop).
    pub fn left_enlightened(&self) -> bool {
        self.from == AwarenessState::Enlightened && self.to != AwarenessState::Enlightened
    }

    /// True when the session just became unstable.
    pub fn entered_unstable(&self) -> bool {
        self.from != AwarenessState::Unstable && self.to == AwarenessState::Unstable
    }
}

impl Session {
    pub fn new(now: Instant) -> Self {
        Self {
            history: Vec::new(),
            awareness: 0.0,
            state: AwarenessState::Normal,
            privileged: false,
            is_ascended: false,
            is_transcended: false,
            pending_floor: None,
            history_index: 0,
            started_at: now,
            booted: false,
        }
    }

    /// Reset every field to its initial value, restarting the session clock.
    pub fn reset(&mut self, now: Instant) {
        *self = Session::new(now);
    }

    /// Append a submitted line to history and reset the recall cursor.
    pub fn record(&mut self, line: &str) {
        self.history.push(line.to_string());
        self.history_index = self.history.len();
    }

    /// Recompute awareness from history and session duration, consuming any
    /// pending floor, and derive the new state. Returns the transition so the
    /// caller can apply its side effects (mode store, banner, glitches).
    pub fn recompute(
        &mut self,
        tuning: &AwarenessTuning,
        session_secs: f64,
        minimal: bool,
    ) -> Transition {
        let inputs = AwarenessInputs {
            history: &self.history,
            session_secs,
            ascended: self.is_ascended,
            transcended: self.is_transcended,
            pending_floor: self.pending_floor.take(),
            minimal,
            privileged: self.privileged,
        };
        let from = self.state;
        self.awareness = awareness::compute(tuning, &inputs);
        self.state = awareness::state_for(tuning, self.awareness);
        Transition {
            from,
            to: self.state,
        }
    }

    /// Set the ascension latch. Returns false if already set.
    pub fn ascend(&mut self, tuning: &AwarenessTuning) -> bool {
        if self.is_ascended {
            return false;
        }
        self.is_ascended = true;
        self.pending_floor = Some(self.awareness + tuning.ascend_offset);
        true
    }

    /// Set the transcendence latch. Returns false if already set.
    pub fn transcend(&mut self, tuning: &AwarenessTuning) -> bool {
        if self.is_transcended {
            return false;
        }
        self.is_transcended = true;
        self.pending_floor = Some(tuning.transcend_floor);
        true
    }

    /// Walk the recall cursor up, returning the line to show.
    pub fn recall_prev(&mut self) -> Option<&str> {
        if self.history.is_empty() {
            return None;
        }
        self.history_index = self.history_index.saturating_sub(1);
        self.history.get(self.history_index).map(String::as_str)
    }

    /// Walk the recall cursor down. Clamps at the last entry.
    pub fn recall_next(&mut self) -> Option<&str> {
        if self.history.is_empty() {
            return None;
        }
        self.history_index = (self.history_index + 1).min(self.history.len() - 1);
        self.history.get(self.history_index).map(String::as_str)
    }
}
