//! The interactive event loop.
//!
//! Crossterm events are read on a dedicated thread and forwarded over a
//! channel, so the async loop can select over key input, the redraw tick, and
//! interpreter control events. While a mini-game is active every key goes to
//! the game instead of the input line.

use crate::command;
use crate::interpreter::{ControlEvent, Interpreter};
use crate::ui::{self, UiState};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use std::time::Duration;
use tokio::sync::mpsc;

const INPUT_POLL_MS: u64 = 50;

pub struct App {
    interpreter: Interpreter,
    control: mpsc::UnboundedReceiver<ControlEvent>,
    input: String,
}

impl App {
    pub fn new(interpreter: Interpreter, control: mpsc::UnboundedReceiver<ControlEvent>) -> Self {
        Self {
            interpreter,
            control,
            input: String::new(),
        }
    }

    /// Spawn the blocking crossterm reader. Only key presses are forwarded;
    /// repeats and releases are dropped.
    fn spawn_input_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        std::thread::spawn(move || loop {
            match event::poll(Duration::from_millis(INPUT_POLL_MS)) {
                Ok(true) => {
                    if let Ok(Event::Key(key)) = event::read() {
                        if key.kind == KeyEventKind::Press && sender.send(key).is_err() {
                            return;
                        }
                    }
                }
                Ok(false) => {
                    if sender.is_closed() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::error!("input reader failed: {}", e);
                    return;
                }
            }
        });
        receiver
    }

    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> anyhow::Result<()> {
        let mut keys = Self::spawn_input_reader();
        let mut frame_tick = tokio::time::interval(Duration::from_millis(
            self.interpreter.console().frame_interval_ms(),
        ));

        self.interpreter.boot().await;

        loop {
            tokio::select! {
                _ = frame_tick.tick() => {
                    self.draw(&mut terminal)?;
                }
                Some(key) = keys.recv() => {
                    if !self.handle_key(key) {
                        break;
                    }
                }
                Some(event) = self.control.recv() => {
                    match event {
                        ControlEvent::Exit => break,
                    }
                }
            }
        }

        self.interpreter.teardown();
        Ok(())
    }

    /// Returns false when the loop should end.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.interpreter.games().active() {
            self.interpreter.games().feed_key(key.code);
            return true;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return false;
        }

        match key.code {
            KeyCode::Esc => false,
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.input);
                if !line.trim().is_empty() {
                    let interpreter = self.interpreter.clone();
                    tokio::spawn(async move {
                        interpreter.submit(&line).await;
                    });
                }
                true
            }
            KeyCode::Up => {
                let recalled = self
                    .interpreter
                    .session()
                    .lock()
                    .expect("session poisoned")
                    .recall_prev()
                    .map(str::to_string);
                if let Some(line) = recalled {
                    self.input = line;
                }
                true
            }
            KeyCode::Down => {
                let recalled = self
                    .interpreter
                    .session()
                    .lock()
                    .expect("session poisoned")
                    .recall_next()
                    .map(str::to_string);
                if let Some(line) = recalled {
                    self.input = line;
                }
                true
            }
            KeyCode::Backspace => {
                self.input.pop();
                true
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                true
            }
            _ => true,
        }
    }

    fn draw(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        let console = self.interpreter.console();
        let lines = console.snapshot();
        let banner = console.banner_snapshot();
        let game = self.interpreter.games().view();

        let ui = UiState {
            banner: &banner,
            lines: &lines,
            input: &self.input,
            input_valid: command::is_known(&self.input),
            game: game.as_ref(),
            gold_frame: console.is_gold(),
            accent_frame: console.is_ripple(),
        };
        terminal.draw(|frame| ui::draw(frame, &ui))?;
        Ok(())
    }
}
