//! The output surface: an append-only scrollback with a character-by-character
//! reveal, plus the awareness banner.
//!
//! `print` is asynchronous and resolves once its line is fully revealed. Each
//! call owns its own line; multiple prints may be pending at once (handlers
//! simply await them in sequence for readability). While god-mode is active
//! every requested color is overridden to gold; while the session is unstable
//! a completed line is registered for continuous glitch corruption until the
//! effects are stopped.

use crate::config::RenderConfig;
use crate::effects::{corrupt, EffectRegistry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Decorative line color. These are hints for the renderer, not a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Default,
    Red,
    Gold,
    White,
    Grey,
    /// The ripple accent used for privileged flavor text.
    Accent,
}

impl Default for TextColor {
    fn default() -> Self {
        TextColor::Default
    }
}

/// One scrollback line.
#[derive(Debug, Clone)]
pub struct Line {
    /// Full text of the line.
    pub text: String,
    /// Portion revealed so far.
    pub shown: String,
    pub color: TextColor,
    /// Glitch corruption currently displayed instead of the revealed text.
    pub corrupted: Option<String>,
}

impl Line {
    fn new(text: String, color: TextColor) -> Self {
        Self {
            text,
            shown: String::new(),
            color,
            corrupted: None,
        }
    }

    /// What the renderer should display right now.
    pub fn display(&self) -> &str {
        self.corrupted.as_deref().unwrap_or(&self.shown)
    }
}

/// The one-line state message shown above the scrollback.
#[derive(Debug, Clone, Default)]
pub struct Banner {
    pub text: String,
    pub color: TextColor,
    pub corrupted: Option<String>,
}

impl Banner {
    pub fn display(&self) -> &str {
        self.corrupted.as_deref().unwrap_or(&self.text)
    }
}

/// Shared handle to the output surface. Cheap to clone; all clones view the
/// same scrollback.
#[derive(Debug, Clone)]
pub struct Console {
    lines: Arc<Mutex<Vec<Line>>>,
    banner: Arc<Mutex<Banner>>,
    render: RenderConfig,
    gold: Arc<AtomicBool>,
    unstable: Arc<AtomicBool>,
    minimal: Arc<AtomicBool>,
    ripple: Arc<AtomicBool>,
    effects: EffectRegistry,
}

impl Console {
    pub fn new(render: RenderConfig) -> Self {
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            banner: Arc::new(Mutex::new(Banner::default())),
            render,
            gold: Arc::new(AtomicBool::new(false)),
            unstable: Arc::new(AtomicBool::new(false)),
            minimal: Arc::new(AtomicBool::new(false)),
            ripple: Arc::new(AtomicBool::new(false)),
            effects: EffectRegistry::new(),
        }
    }

    /// Append a line and reveal it character by character. Resolves when the
    /// line is complete. An empty string renders a blank line immediately.
    pub async fn print(&self, text: &str, color: TextColor) {
        let color = if self.gold.load(Ordering::SeqCst) {
            TextColor::Gold
        } else {
            color
        };

        let index = {
            let mut lines = self.lines.lock().expect("scrollback poisoned");
            lines.push(Line::new(text.to_string(), color));
            lines.len() - 1
        };

        if text.is_empty() {
            return;
        }

        let interval = self.reveal_interval();
        if interval.is_zero() {
            let mut lines = self.lines.lock().expect("scrollback poisoned");
            lines[index].shown = text.to_string();
        } else {
            for c in text.chars() {
                tokio::time::sleep(interval).await;
                let mut lines = self.lines.lock().expect("scrollback poisoned");
                lines[index].shown.push(c);
            }
        }

        if self.unstable.load(Ordering::SeqCst) && !self.minimal.load(Ordering::SeqCst) {
            self.start_line_glitch(index);
        }
    }

    /// Fire-and-forget print, for detached flavor lines.
    pub fn print_detached(&self, text: impl Into<String>, color: TextColor) {
        let console = self.clone();
        let text = text.into();
        tokio::spawn(async move {
            console.print(&text, color).await;
        });
    }

    /// Redraw cadence for the owning event loop.
    pub fn frame_interval_ms(&self) -> u64 {
        self.render.frame_interval_ms
    }

    fn reveal_interval(&self) -> Duration {
        if self.minimal.load(Ordering::SeqCst) {
            return Duration::ZERO;
        }
        Duration::from_millis(self.render.reveal_interval_ms)
    }

    /// Register continuous glitch corruption for one line until stopped.
    pub fn start_line_glitch(&self, index: usize) {
        let handle = self.effects.register();
        let lines = self.lines.clone();
        let interval = Duration::from_millis(self.render.glitch_interval_ms);
        let probability = self.render.glitch_probability;
        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            while !handle.is_stopped() {
                tokio::time::sleep(interval).await;
                let mut lines = lines.lock().expect("scrollback poisoned");
                let Some(line) = lines.get_mut(index) else {
                    break;
                };
                if handle.is_stopped() {
                    line.corrupted = None;
                    break;
                }
                line.corrupted = Some(corrupt(&line.text, probability, &mut rng));
            }
        });
    }

    /// Register glitch corruption for every existing line.
    pub fn start_glitch_all(&self) {
        let count = self.lines.lock().expect("scrollback poisoned").len();
        for index in 0..count {
            self.start_line_glitch(index);
        }
    }

    /// Continuously corrupt the banner until stopped.
    pub fn start_banner_glitch(&self) {
        let handle = self.effects.register();
        let banner = self.banner.clone();
        let interval = Duration::from_millis(self.render.glitch_interval_ms);
        let probability = self.render.glitch_probability;
        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            while !handle.is_stopped() {
                tokio::time::sleep(interval).await;
                let mut banner = banner.lock().expect("banner poisoned");
                if handle.is_stopped() {
                    banner.corrupted = None;
                    break;
                }
                banner.corrupted = Some(corrupt(&banner.text, probability, &mut rng));
            }
        });
    }

    /// Run the decode animation on one line: corrupt it at a fixed cadence for
    /// the configured duration, then restore the original text. Resolves when
    /// the line is restored.
    pub async fn decode_animation(&self, index: usize) {
        if self.minimal.load(Ordering::SeqCst) {
            return;
        }
        let handle = self.effects.register();
        let duration = Duration::from_millis(self.render.decode_duration_ms);
        let interval = Duration::from_millis(self.render.glitch_interval_ms);
        let probability = self.render.decode_probability;
        let started = tokio::time::Instant::now();
        let mut rng = StdRng::from_entropy();

        while started.elapsed() < duration && !handle.is_stopped() {
            tokio::time::sleep(interval).await;
            let mut lines = self.lines.lock().expect("scrollback poisoned");
            let Some(line) = lines.get_mut(index) else {
                return;
            };
            line.corrupted = Some(corrupt(&line.text, probability, &mut rng));
        }

        handle.stop();
        let mut lines = self.lines.lock().expect("scrollback poisoned");
        if let Some(line) = lines.get_mut(index) {
            line.corrupted = None;
        }
    }

    /// Set the awareness banner text and color.
    pub fn set_banner(&self, text: impl Into<String>, color: TextColor) {
        let mut banner = self.banner.lock().expect("banner poisoned");
        banner.text = text.into();
        banner.color = color;
        banner.corrupted = None;
    }

    /// Stop all running effects and clear any corruption they left behind.
    pub fn stop_effects(&self) {
        self.effects.stop_all();
        let mut lines = self.lines.lock().expect("scrollback poisoned");
        for line in lines.iter_mut() {
            line.corrupted = None;
        }
        self.banner.lock().expect("banner poisoned").corrupted = None;
    }

    /// Stop effects and drop the whole scrollback.
    pub fn clear(&self) {
        self.stop_effects();
        self.lines.lock().expect("scrollback poisoned").clear();
    }

    pub fn set_gold(&self, on: bool) {
        self.gold.store(on, Ordering::SeqCst);
    }

    pub fn is_gold(&self) -> bool {
        self.gold.load(Ordering::SeqCst)
    }

    pub fn set_unstable(&self, on: bool) {
        self.unstable.store(on, Ordering::SeqCst);
    }

    pub fn is_unstable(&self) -> bool {
        self.unstable.load(Ordering::SeqCst)
    }

    pub fn set_minimal(&self, on: bool) {
        self.minimal.store(on, Ordering::SeqCst);
    }

    pub fn is_minimal(&self) -> bool {
        self.minimal.load(Ordering::SeqCst)
    }

    pub fn set_ripple(&self, on: bool) {
        self.ripple.store(on, Ordering::SeqCst);
    }

    pub fn is_ripple(&self) -> bool {
        self.ripple.load(Ordering::SeqCst)
    }

    pub fn line_count(&self) -> usize {
        self.lines.lock().expect("scrollback poisoned").len()
    }

    /// Index of the most recently printed line.
    pub fn last_index(&self) -> Option<usize> {
        let lines = self.lines.lock().expect("scrollback poisoned");
        lines.len().checked_sub(1)
    }

    /// Copy of the scrollback as display text, for the renderer and tests.
    pub fn snapshot(&self) -> Vec<(String, TextColor)> {
        self.lines
            .lock()
            .expect("scrollback poisoned")
            .iter()
            .map(|l| (l.display().to_string(), l.color))
            .collect()
    }

    pub fn banner_snapshot(&self) -> Banner {
        self.banner.lock().expect("banner poisoned").clone()
    }

    /// Number of effects still running, for teardown assertions.
    pub fn active_effects(&self) -> usize {
        self.effects.active_count()
    }
}
