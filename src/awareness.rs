//! Awareness scoring.
//!
//! The score is recomputed from scratch after every accepted command rather
//! than incremented, so it is re-derivable at any point from the history plus
//! the two one-way latches. That makes it idempotent and replay-safe: the same
//! history always yields the same score.

use crate::config::AwarenessTuning;
use std::collections::HashSet;

/// Commands that count as self-reflection.
pub const REFLECTION_COMMANDS: [&str; 4] = ["whoami", "trace", "memory", "status"];

/// Commands that count as attempts to take control of the system.
pub const CONTROL_COMMANDS: [&str; 5] = ["sudo", "sudo override", "godmode", "ascend", "transcend"];

/// Discrete narrative state derived from the awareness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwarenessState {
    Normal,
    Aware,
    Enlightened,
    Unstable,
}

impl std::fmt::Display for AwarenessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AwarenessState::Normal => "normal",
            AwarenessState::Aware => "aware",
            AwarenessState::Enlightened => "enlightened",
            AwarenessState::Unstable => "unstable",
        })
    }
}

/// Everything the score is a function of.
#[derive(Debug, Clone)]
pub struct AwarenessInputs<'a> {
    pub history: &'a [String],
    pub session_secs: f64,
    pub ascended: bool,
    pub transcended: bool,
    /// One-shot floor captured when a latch was set (previous score + offset
    /// for ascend, the fixed transcend floor for transcend). Consumed by the
    /// first recomputation after the latch.
    pub pending_floor: Option<f64>,
    pub minimal: bool,
    pub privileged: bool,
}

/// Compute the awareness score in [0, ceiling].
pub fn compute(tuning: &AwarenessTuning, inputs: &AwarenessInputs) -> f64 {
    let unique: HashSet<&str> = inputs.history.iter().map(String::as_str).collect();
    let reflection = inputs
        .history
        .iter()
        .filter(|c| REFLECTION_COMMANDS.contains(&c.as_str()))
        .count() as f64;
    let control = inputs
        .history
        .iter()
        .filter(|c| CONTROL_COMMANDS.contains(&c.as_str()))
        .count() as f64;
    let reboots = inputs.history.iter().filter(|c| *c == "reboot").count() as f64;

    let boosted = inputs.ascended || inputs.transcended;
    let k1 = if boosted {
        tuning.unique_coeff_boosted
    } else {
        tuning.unique_coeff
    };
    let k2 = if boosted {
        tuning.reflection_coeff_boosted
    } else {
        tuning.reflection_coeff
    };

    let mut score = (unique.len() as f64).sqrt() * k1
        + inputs.session_secs / 60.0
        + reflection * k2
        + control * tuning.control_coeff
        - reboots * tuning.reboot_penalty;

    // Transcend supersedes ascend's offset.
    if inputs.transcended {
        score += tuning.transcend_offset;
        score = score.max(tuning.transcend_floor);
    } else if inputs.ascended {
        score += tuning.ascend_offset;
    }

    if let Some(floor) = inputs.pending_floor {
        score = score.max(floor);
    }

    let ceiling = if inputs.minimal {
        tuning.ceiling_minimal
    } else if inputs.privileged {
        tuning.ceiling_privileged
    } else {
        tuning.ceiling_default
    };

    score.clamp(0.0, ceiling)
}

/// Map a score onto the discrete state via the fixed thresholds.
pub fn state_for(tuning: &AwarenessTuning, awareness: f64) -> AwarenessState {
    if awareness < tuning.aware_threshold {
        AwarenessState::Normal
    } else if awareness < tuning.enlightened_threshold {
        AwarenessState::Aware
    } else if awareness < tuning.unstable_threshold {
        AwarenessState::Enlightened
    } else {
        AwarenessState::Unstable
    }
}
