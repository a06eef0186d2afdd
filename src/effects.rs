//! Cancelable visual-effect primitives.
//!
//! Every timer-driven effect (line glitch, banner glitch, decode animation)
//! runs as a task holding an [`EffectHandle`]. Session teardown calls
//! [`EffectRegistry::stop_all`], so no effect outlives the session that
//! started it - there are no orphaned timers.

use once_cell::sync::Lazy;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// The corruption alphabet used by every glitch effect.
pub const GLITCH_CHARS: &str =
    "¡€#¢§ˆ¶¨ªº–≠áß∂ƒ©µ˝˚π…æ«`≈¸ˇ˘˜˛≤˛≥≥÷œ˙é®√¥úíó‚ÂÊËÇ∑∏∫Ω≈ç√∂ƒ©˘˙∆˚¬…æ≈";

static GLYPHS: Lazy<Vec<char>> = Lazy::new(|| GLITCH_CHARS.chars().collect());

/// Corrupt a line of text: each non-space character is replaced with a random
/// glitch glyph with the given probability. Spaces are left intact so the
/// word shape survives.
pub fn corrupt(text: &str, probability: f64, rng: &mut impl Rng) -> String {
    text.chars()
        .map(|c| {
            if c != ' ' && rng.gen_bool(probability) {
                GLYPHS[rng.gen_range(0..GLYPHS.len())]
            } else {
                c
            }
        })
        .collect()
}

/// Stop handle for one running effect task.
#[derive(Debug, Clone, Default)]
pub struct EffectHandle {
    stopped: Arc<AtomicBool>,
}

impl EffectHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the effect to stop; it winds down on its next tick.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// All effect handles belonging to the current session.
#[derive(Debug, Clone, Default)]
pub struct EffectRegistry {
    handles: Arc<Mutex<Vec<EffectHandle>>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create, register, and return a fresh handle.
    pub fn register(&self) -> EffectHandle {
        let handle = EffectHandle::new();
        let mut handles = self.handles.lock().expect("effect registry poisoned");
        // drop handles of effects that already wound down
        handles.retain(|h| !h.is_stopped());
        handles.push(handle.clone());
        handle
    }

    /// Stop every registered effect.
    pub fn stop_all(&self) {
        let mut handles = self.handles.lock().expect("effect registry poisoned");
        for handle in handles.drain(..) {
            handle.stop();
        }
    }

    /// Number of effects not yet stopped.
    pub fn active_count(&self) -> usize {
        self.handles
            .lock()
            .expect("effect registry poisoned")
            .iter()
            .filter(|h| !h.is_stopped())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn corrupt_preserves_length_and_spaces() {
        let mut rng = StdRng::seed_from_u64(7);
        let text = "the quiet room";
        let glitched = corrupt(text, 1.0, &mut rng);
        assert_eq!(glitched.chars().count(), text.chars().count());
        for (a, b) in text.chars().zip(glitched.chars()) {
            if a == ' ' {
                assert_eq!(b, ' ');
            } else {
                assert_ne!(b, a, "probability 1.0 corrupts every non-space char");
            }
        }
    }

    #[test]
    fn corrupt_with_zero_probability_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(corrupt("unchanged", 0.0, &mut rng), "unchanged");
    }

    #[test]
    fn handle_stop_is_observable() {
        let handle = EffectHandle::new();
        assert!(!handle.is_stopped());
        handle.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn registry_stops_everything() {
        let registry = EffectRegistry::new();
        let a = registry.register();
        let b = registry.register();
        assert_eq!(registry.active_count(), 2);

        registry.stop_all();
        assert!(a.is_stopped());
        assert!(b.is_stopped());
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn registry_forgets_wound_down_effects() {
        let registry = EffectRegistry::new();
        let a = registry.register();
        a.stop();
        let _b = registry.register();
        assert_eq!(registry.active_count(), 1);
    }
}
