//! Mini-game runtimes.
//!
//! While a game runs it owns the keyboard and the display surface: the app
//! forwards raw key codes into the host's channel and the UI draws the shared
//! [`GameView`] instead of the scrollback. Normal command handling resumes
//! only after the game loop returns.

pub mod life;
pub mod snake;

use crate::config::GameConfig;
use crate::games::life::LifeGrid;
use crate::games::snake::{Direction, SnakeGame, SnakeStep};
use crossterm::event::KeyCode;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

/// What the UI draws while a game is active.
#[derive(Debug, Clone)]
pub struct GameView {
    pub title: String,
    pub rows: Vec<String>,
    pub status: String,
}

/// Outcome of a snake run.
#[derive(Debug, Clone, Copy)]
pub struct SnakeResult {
    pub ticks: u64,
    pub length: usize,
    pub survival: Duration,
    pub interrupted: bool,
}

/// Outcome of a Life run.
#[derive(Debug, Clone, Copy)]
pub struct LifeResult {
    pub generations: u64,
    pub interrupted: bool,
}

/// Shared handle between the app (which feeds keys and reads the view) and
/// the interpreter (which runs the game loops).
#[derive(Debug, Clone)]
pub struct GameHost {
    view: Arc<Mutex<Option<GameView>>>,
    keys: Arc<AsyncMutex<mpsc::UnboundedReceiver<KeyCode>>>,
    sender: mpsc::UnboundedSender<KeyCode>,
}

impl Default for GameHost {
    fn default() -> Self {
        Self::new()
    }
}

impl GameHost {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            view: Arc::new(Mutex::new(None)),
            keys: Arc::new(AsyncMutex::new(receiver)),
            sender,
        }
    }

    /// Whether a game currently owns the input and display.
    pub fn active(&self) -> bool {
        self.view.lock().expect("game view poisoned").is_some()
    }

    /// Current frame, if a game is running.
    pub fn view(&self) -> Option<GameView> {
        self.view.lock().expect("game view poisoned").clone()
    }

    /// Forward one key code to the running game.
    pub fn feed_key(&self, key: KeyCode) {
        // ignored when no game loop is draining the channel
        let _ = self.sender.send(key);
    }

    fn set_view(&self, view: Option<GameView>) {
        *self.view.lock().expect("game view poisoned") = view;
    }

    /// Run snake to completion (death or Escape).
    pub async fn run_snake(&self, config: &GameConfig) -> SnakeResult {
        let mut keys = self.keys.lock().await;
        while keys.try_recv().is_ok() {} // drop keys typed before launch

        let tick = Duration::from_millis(config.tick_ms);
        let mut rng = StdRng::from_entropy();
        let mut game = SnakeGame::new(config.snake_width, config.snake_height, &mut rng);
        let mut interrupted = false;

        self.set_view(Some(GameView {
            title: "snake".to_string(),
            rows: game.rows(),
            status: "w/a/s/d to steer - esc to give up".to_string(),
        }));

        let mut timer = tokio::time::interval(tick);
        timer.tick().await; // first tick fires immediately
        'game: loop {
            timer.tick().await;

            while let Ok(key) = keys.try_recv() {
                match key {
                    KeyCode::Esc => {
                        interrupted = true;
                        break 'game;
                    }
                    KeyCode::Char('w') | KeyCode::Up => game.set_direction(Direction::Up),
                    KeyCode::Char('s') | KeyCode::Down => game.set_direction(Direction::Down),
                    KeyCode::Char('a') | KeyCode::Left => game.set_direction(Direction::Left),
                    KeyCode::Char('d') | KeyCode::Right => game.set_direction(Direction::Right),
                    _ => {}
                }
            }

            let outcome = game.step(&mut rng);
            self.set_view(Some(GameView {
                title: "snake".to_string(),
                rows: game.rows(),
                status: format!("length {}  ticks {}", game.length(), game.ticks()),
            }));
            if outcome == SnakeStep::Died {
                break;
            }
        }

        self.set_view(None);
        SnakeResult {
            ticks: game.ticks(),
            length: game.length(),
            survival: tick * game.ticks() as u32,
            interrupted,
        }
    }

    /// Run Life until the grid settles or Escape interrupts.
    pub async fn run_life(&self, config: &GameConfig) -> LifeResult {
        let mut keys = self.keys.lock().await;
        while keys.try_recv().is_ok() {}

        let tick = Duration::from_millis(config.tick_ms);
        let mut rng = StdRng::from_entropy();
        let mut grid = LifeGrid::new_random(
            config.life_rows,
            config.life_cols,
            config.life_seed_density,
            &mut rng,
        );
        let mut interrupted = false;

        self.set_view(Some(GameView {
            title: "life".to_string(),
            rows: grid.rows_display(),
            status: "esc to interrupt".to_string(),
        }));

        let mut timer = tokio::time::interval(tick);
        timer.tick().await;
        loop {
            timer.tick().await;

            let mut stop = false;
            while let Ok(key) = keys.try_recv() {
                if key == KeyCode::Esc {
                    stop = true;
                }
            }
            if stop {
                interrupted = true;
                break;
            }

            let evolving = grid.step();
            self.set_view(Some(GameView {
                title: "life".to_string(),
                rows: grid.rows_display(),
                status: format!(
                    "generation {}  population {}",
                    grid.generation(),
                    grid.live_count()
                ),
            }));
            if !evolving {
                break;
            }
        }

        self.set_view(None);
        LifeResult {
            generations: grid.generation(),
            interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn fast_config() -> GameConfig {
        GameConfig {
            tick_ms: 1,
            ..GameConfig::default()
        }
    }

    /// Wait until the game loop has taken over the view, then press Escape.
    async fn escape_once_running(host: &GameHost) {
        while !host.active() {
            tokio::task::yield_now().await;
        }
        host.feed_key(KeyCode::Esc);
    }

    #[tokio::test(start_paused = true)]
    async fn snake_run_ends_on_escape() {
        let host = GameHost::new();
        let runner = host.clone();
        let config = fast_config();
        let handle = tokio::spawn(async move { runner.run_snake(&config).await });

        escape_once_running(&host).await;
        let result = handle.await.unwrap();
        assert!(result.interrupted);
        assert!(!host.active());
    }

    #[tokio::test(start_paused = true)]
    async fn snake_runs_into_the_wall_without_input() {
        let host = GameHost::new();
        let result = host.run_snake(&fast_config()).await;
        // 20-wide grid, head starts at x=10 heading right
        assert!(!result.interrupted);
        assert_eq!(result.ticks, 10);
        assert_eq!(result.survival, Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn life_run_ends_on_escape() {
        let host = GameHost::new();
        let runner = host.clone();
        let config = fast_config();
        let handle = tokio::spawn(async move { runner.run_life(&config).await });

        escape_once_running(&host).await;
        let result = handle.await.unwrap();
        assert!(result.interrupted);
        assert!(!host.active());
    }

    #[tokio::test(start_paused = true)]
    async fn view_is_cleared_after_a_run() {
        let host = GameHost::new();
        let result = host.run_snake(&fast_config()).await;
        assert!(!result.interrupted);
        assert!(host.view().is_none());
    }
}
