//! Runtime configuration.
//!
//! Every tuned constant of the terminal lives here: the awareness formula
//! coefficients and thresholds, the reveal/glitch timing, and the mini-game
//! grid parameters. The values mirror the behavior the terminal shipped with;
//! they are configuration, not derived quantities.
//!
//! An optional user file at `~/.config/lucid/config.json` overrides the
//! defaults field by field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub awareness: AwarenessTuning,

    #[serde(default)]
    pub games: GameConfig,
}

/// Output rendering and effect timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Delay between revealed characters when printing a line
    #[serde(default = "default_reveal_interval_ms")]
    pub reveal_interval_ms: u64,

    /// Redraw interval for the UI loop
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Re-corruption interval for glitched lines
    #[serde(default = "default_glitch_interval_ms")]
    pub glitch_interval_ms: u64,

    /// Per-character corruption chance while a line is glitching
    #[serde(default = "default_glitch_probability")]
    pub glitch_probability: f64,

    /// Total duration of the decode randomize-then-restore animation
    #[serde(default = "default_decode_duration_ms")]
    pub decode_duration_ms: u64,

    /// Per-character corruption chance during the decode animation
    #[serde(default = "default_decode_probability")]
    pub decode_probability: f64,
}

fn default_reveal_interval_ms() -> u64 {
    20
}

fn default_frame_interval_ms() -> u64 {
    33
}

fn default_glitch_interval_ms() -> u64 {
    100
}

fn default_glitch_probability() -> f64 {
    0.3
}

fn default_decode_duration_ms() -> u64 {
    2000
}

fn default_decode_probability() -> f64 {
    0.2
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            reveal_interval_ms: default_reveal_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            glitch_interval_ms: default_glitch_interval_ms(),
            glitch_probability: default_glitch_probability(),
            decode_duration_ms: default_decode_duration_ms(),
            decode_probability: default_decode_probability(),
        }
    }
}

/// Awareness formula coefficients and state thresholds.
///
/// The coefficient values (1.5/2.5 baseline, 4/5 once ascended or
/// transcended) and the clamp ceilings were tuned by hand in the original and
/// are preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwarenessTuning {
    #[serde(default = "default_unique_coeff")]
    pub unique_coeff: f64,

    #[serde(default = "default_unique_coeff_boosted")]
    pub unique_coeff_boosted: f64,

    #[serde(default = "default_reflection_coeff")]
    pub reflection_coeff: f64,

    #[serde(default = "default_reflection_coeff_boosted")]
    pub reflection_coeff_boosted: f64,

    #[serde(default = "default_control_coeff")]
    pub control_coeff: f64,

    #[serde(default = "default_reboot_penalty")]
    pub reboot_penalty: f64,

    /// Flat offset once ascended; also the one-shot floor above the
    /// pre-ascension score
    #[serde(default = "default_ascend_offset")]
    pub ascend_offset: f64,

    /// Flat offset once transcended (supersedes the ascend offset)
    #[serde(default = "default_transcend_offset")]
    pub transcend_offset: f64,

    /// Hard floor applied while transcended
    #[serde(default = "default_transcend_floor")]
    pub transcend_floor: f64,

    #[serde(default = "default_ceiling_minimal")]
    pub ceiling_minimal: f64,

    #[serde(default = "default_ceiling_privileged")]
    pub ceiling_privileged: f64,

    #[serde(default = "default_ceiling_default")]
    pub ceiling_default: f64,

    /// Below this the state is `normal`
    #[serde(default = "default_aware_threshold")]
    pub aware_threshold: f64,

    /// Below this (and at or above `aware_threshold`) the state is `aware`
    #[serde(default = "default_enlightened_threshold")]
    pub enlightened_threshold: f64,

    /// At or above this the state is `unstable`
    #[serde(default = "default_unstable_threshold")]
    pub unstable_threshold: f64,
}

fn default_unique_coeff() -> f64 {
    1.5
}

fn default_unique_coeff_boosted() -> f64 {
    4.0
}

fn default_reflection_coeff() -> f64 {
    2.5
}

fn default_reflection_coeff_boosted() -> f64 {
    5.0
}

fn default_control_coeff() -> f64 {
    1.5
}

fn default_reboot_penalty() -> f64 {
    3.0
}

fn default_ascend_offset() -> f64 {
    25.0
}

fn default_transcend_offset() -> f64 {
    75.0
}

fn default_transcend_floor() -> f64 {
    75.0
}

fn default_ceiling_minimal() -> f64 {
    75.0
}

fn default_ceiling_privileged() -> f64 {
    100.0
}

fn default_ceiling_default() -> f64 {
    50.0
}

fn default_aware_threshold() -> f64 {
    25.0
}

fn default_enlightened_threshold() -> f64 {
    75.0
}

fn default_unstable_threshold() -> f64 {
    90.0
}

impl Default for AwarenessTuning {
    fn default() -> Self {
        Self {
            unique_coeff: default_unique_coeff(),
            unique_coeff_boosted: default_unique_coeff_boosted(),
            reflection_coeff: default_reflection_coeff(),
            reflection_coeff_boosted: default_reflection_coeff_boosted(),
            control_coeff: default_control_coeff(),
            reboot_penalty: default_reboot_penalty(),
            ascend_offset: default_ascend_offset(),
            transcend_offset: default_transcend_offset(),
            transcend_floor: default_transcend_floor(),
            ceiling_minimal: default_ceiling_minimal(),
            ceiling_privileged: default_ceiling_privileged(),
            ceiling_default: default_ceiling_default(),
            aware_threshold: default_aware_threshold(),
            enlightened_threshold: default_enlightened_threshold(),
            unstable_threshold: default_unstable_threshold(),
        }
    }
}

/// Mini-game parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Simulation tick for both games
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default = "default_snake_width")]
    pub snake_width: usize,

    #[serde(default = "default_snake_height")]
    pub snake_height: usize,

    #[serde(default = "default_life_rows")]
    pub life_rows: usize,

    #[serde(default = "default_life_cols")]
    pub life_cols: usize,

    /// Fraction of cells seeded alive in a fresh Life grid
    #[serde(default = "default_life_seed_density")]
    pub life_seed_density: f64,
}

fn default_tick_ms() -> u64 {
    300
}

fn default_snake_width() -> usize {
    20
}

fn default_snake_height() -> usize {
    20
}

fn default_life_rows() -> usize {
    20
}

fn default_life_cols() -> usize {
    40
}

fn default_life_seed_density() -> f64 {
    0.3
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            snake_width: default_snake_width(),
            snake_height: default_snake_height(),
            life_rows: default_life_rows(),
            life_cols: default_life_cols(),
            life_seed_density: default_life_seed_density(),
        }
    }
}

/// Default user config path: `~/.config/lucid/config.json`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lucid").join("config.json"))
}

impl Config {
    /// Load configuration from an explicit path, or the user config path, or
    /// fall back to defaults. A malformed file is reported and ignored rather
    /// than aborting startup.
    pub fn load(explicit: Option<&Path>) -> Config {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => user_config_path().filter(|p| p.exists()),
        };

        let Some(path) = path else {
            return Config::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("ignoring malformed config {:?}: {}", path, e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("could not read config {:?}: {}", path, e);
                Config::default()
            }
        }
    }
}
