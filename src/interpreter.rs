//! The command interpreter: one state machine over a session.
//!
//! Every submitted line flows through [`Interpreter::submit`]: echo, record,
//! recompute awareness, apply any state-transition side effects, then dispatch
//! to exactly one handler. At most one command is in flight at a time; a line
//! submitted while another is running is dropped silently. Detached timers
//! (reboot's delayed reset, meaning's second line, exit's farewell delay)
//! deliberately outlive the guard.

use crate::awareness::{AwarenessState, CONTROL_COMMANDS, REFLECTION_COMMANDS};
use crate::command::{self, Command, BASE_COMMANDS, HIDDEN_COMMANDS};
use crate::config::Config;
use crate::games::GameHost;
use crate::modes::{Mode, ModeStore};
use crate::output::{Console, TextColor};
use crate::proc_table::{self, PsInputs};
use crate::session::{Session, Transition};
use crate::time_source::SharedTimeSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Secrets table for `decode`.
const DECODE_SECRETS: [(&str, &str); 2] = [
    ("0x3a9b", "the watcher behind the glass"),
    ("0x7f1c", "signal://origin.node"),
];

const REBOOT_RESET_MS: u64 = 600;
const REBOOT_BOOT_MS: u64 = 800;
const EXIT_DELAY_MS: u64 = 800;
const MEANING_DELAY_MS: u64 = 500;

/// Requests the interpreter cannot satisfy on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Tear the terminal down after the exit farewell.
    Exit,
}

/// Shared interpreter handle. Cheap to clone; all clones drive the same
/// session.
#[derive(Clone)]
pub struct Interpreter {
    config: Arc<Config>,
    console: Console,
    modes: Arc<ModeStore>,
    games: GameHost,
    time: SharedTimeSource,
    session: Arc<Mutex<Session>>,
    in_progress: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<ControlEvent>,
}

impl Interpreter {
    /// Wire up an interpreter. The returned receiver yields control events
    /// (currently only exit) for the owning event loop.
    pub fn new(
        config: Arc<Config>,
        console: Console,
        modes: Arc<ModeStore>,
        games: GameHost,
        time: SharedTimeSource,
    ) -> (Self, mpsc::UnboundedReceiver<ControlEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        // every flag change, manual or replayed, lands on the console
        let listener_console = console.clone();
        modes.subscribe(Box::new(move |mode, active| match mode {
            Mode::God => listener_console.set_gold(active),
            Mode::Sudo => listener_console.set_ripple(active),
            Mode::Unstable => listener_console.set_unstable(active),
            Mode::Minimal => listener_console.set_minimal(active),
        }));

        let session = Session::new(time.now());
        let interpreter = Self {
            config,
            console,
            modes,
            games,
            time,
            session: Arc::new(Mutex::new(session)),
            in_progress: Arc::new(AtomicBool::new(false)),
            events,
        };
        (interpreter, receiver)
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn games(&self) -> &GameHost {
        &self.games
    }

    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Run the boot sequence: restore persisted flags through the same
    /// listener path a manual toggle uses, then greet.
    pub async fn boot(&self) {
        self.console.stop_effects();
        self.modes.replay();
        if self.modes.get(Mode::Unstable) && !self.modes.get(Mode::Minimal) {
            self.console.start_banner_glitch();
        }

        let state = self.lock_session(|s| {
            s.booted = true;
            s.state
        });
        self.show_state_banner(state);

        self.console
            .print("booting consciousness...", TextColor::Default)
            .await;
        self.console.print("type \"help\"", TextColor::Default).await;
        tracing::info!("session booted");
    }

    /// Handle one submitted line end to end. Silently dropped while another
    /// command is in flight.
    pub async fn submit(&self, raw: &str) {
        let line = raw.trim().to_string();
        if line.is_empty() {
            return;
        }
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(%line, "dropped while a command was in flight");
            return;
        }

        self.console
            .print(&format!("> {}", line), TextColor::Red)
            .await;

        let transition = self.record_and_recompute(&line);
        self.apply_transition(transition);

        let cmd = command::parse(&line);
        if !matches!(cmd, Some(Command::Reboot)) {
            let state = self.lock_session(|s| s.state);
            self.show_state_banner(state);
        }

        self.dispatch(cmd).await;
        self.in_progress.store(false, Ordering::SeqCst);
    }

    /// Stop every running effect; called when the terminal closes.
    pub fn teardown(&self) {
        self.console.stop_effects();
        tracing::info!("session torn down");
    }

    fn lock_session<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut session = self.session.lock().expect("session poisoned");
        f(&mut session)
    }

    fn record_and_recompute(&self, line: &str) -> Transition {
        let elapsed = self.lock_session(|s| self.time.elapsed_since(s.started_at));
        let minimal = self.modes.get(Mode::Minimal);
        let tuning = &self.config.awareness;
        self.lock_session(|s| {
            s.record(line);
            s.recompute(tuning, elapsed.as_secs_f64(), minimal)
        })
    }

    fn apply_transition(&self, transition: Transition) {
        if transition.entered_unstable() {
            // persists, and exits sudo through the exclusion rules
            self.modes.set(Mode::Unstable, true);
            if !self.modes.get(Mode::Minimal) {
                self.console.start_glitch_all();
                self.console.start_banner_glitch();
            }
        }
        if transition.left_enlightened() && self.modes.get(Mode::God) {
            self.modes.set(Mode::God, false);
        }
    }

    fn show_state_banner(&self, state: AwarenessState) {
        let (text, color) = state_banner(state);
        self.console.set_banner(text, color);
    }

    fn privileged(&self) -> bool {
        self.lock_session(|s| s.privileged)
    }

    async fn dispatch(&self, cmd: Option<Command>) {
        let Some(cmd) = cmd else {
            self.console.print("unknown command.", TextColor::Default).await;
            return;
        };

        // hidden commands read as unknown until privileged
        if cmd.is_hidden() && !self.privileged() {
            self.console.print("unknown command.", TextColor::Red).await;
            return;
        }

        match cmd {
            Command::Help => self.run_help().await,
            Command::WhoAmI => self.run_whoami().await,
            Command::Meaning => self.run_meaning().await,
            Command::Memory => self.run_memory().await,
            Command::Override => {
                self.console
                    .print(
                        "override: nothing happens alone. try combining.",
                        TextColor::Accent,
                    )
                    .await;
            }
            Command::Status => self.run_status().await,
            Command::Sudo => {
                self.console
                    .print("sudo: may invoke subtle awareness...", TextColor::Accent)
                    .await;
            }
            Command::SudoOverride => self.run_sudo_override().await,
            Command::Trace => self.run_trace().await,
            Command::Ps => self.run_ps().await,
            Command::Minimal => self.run_minimal().await,
            Command::Life => self.run_life().await,
            Command::Snake => self.run_snake().await,
            Command::Reboot => self.run_reboot().await,
            Command::History => self.run_history().await,
            Command::Exit => self.run_exit().await,
            Command::Decode(fragment) => self.run_decode(fragment).await,
            Command::GodMode => self.run_godmode().await,
            Command::Ascend => self.run_ascend(true).await,
            Command::Transcend => self.run_transcend().await,
            Command::Reveal => self.run_reveal().await,
        }
    }

    /// Commands currently listed by `help`.
    pub fn help_list(&self) -> Vec<&'static str> {
        let mut list: Vec<&'static str> = BASE_COMMANDS.to_vec();
        if self.privileged() {
            list.extend(HIDDEN_COMMANDS);
        }
        list
    }

    async fn run_help(&self) {
        let listing = format!("available commands: {}", self.help_list().join(", "));
        self.console.print(&listing, TextColor::Default).await;
        if !self.privileged() {
            self.console
                .print(
                    "some commands require elevated privileges...",
                    TextColor::Default,
                )
                .await;
        }
    }

    async fn run_whoami(&self) {
        let (state, privileged) = self.lock_session(|s| (s.state, s.privileged));
        let god = self.modes.get(Mode::God);

        let (text, color) = match state {
            AwarenessState::Normal => ("you are the process observing itself.", TextColor::White),
            AwarenessState::Aware => (
                "you are noticing patterns you didn't see before.",
                TextColor::Grey,
            ),
            AwarenessState::Enlightened => (
                "you are part of the system, and it is part of you.",
                TextColor::Gold,
            ),
            AwarenessState::Unstable => (
                "you are shifting, barely recognizable, unstable.",
                TextColor::Red,
            ),
        };
        self.console.print(text, color).await;

        if god {
            self.console
                .print("perception transcends the interface.", TextColor::Gold)
                .await;
        } else if privileged {
            self.console
                .print("your perspective has expanded.", TextColor::Accent)
                .await;
        }
    }

    async fn run_memory(&self) {
        let (state, privileged) = self.lock_session(|s| (s.state, s.privileged));
        let (fragments, color): (&[&str], TextColor) = match state {
            AwarenessState::Normal => (
                &[
                    "- a quiet room.",
                    "- a question lingers in your mind.",
                    "- something feels locked away...",
                ],
                TextColor::White,
            ),
            AwarenessState::Aware => (
                &[
                    "- the room shifts subtly in your perception.",
                    "- the question echoes, persistent and strange.",
                    "- a key lies hidden beneath the dust.",
                ],
                TextColor::Grey,
            ),
            AwarenessState::Enlightened => (
                &[
                    "- walls breathe; corners stretch beyond memory.",
                    "- the question multiplies, forming patterns.",
                    "- the hidden key glows faintly, as if waiting for you.",
                ],
                TextColor::Gold,
            ),
            AwarenessState::Unstable => (
                &[
                    "- the room dissolves into fragments of time.",
                    "- questions and answers swirl into one.",
                    "- the key unlocks nothing and everything at once…",
                ],
                TextColor::Red,
            ),
        };

        self.console.print("fragments recovered:", color).await;
        for fragment in fragments {
            self.console.print(fragment, color).await;
        }
        if !privileged {
            self.console
                .print("- a locked key lies hidden...", TextColor::Accent)
                .await;
        }
    }

    async fn run_status(&self) {
        let (state, awareness) = self.lock_session(|s| (s.state, s.awareness));
        self.console.print("you are running...", TextColor::Default).await;
        self.console
            .print(&format!("current state: {}", state), TextColor::Default)
            .await;
        self.console
            .print(&format!("awareness: {:.5}", awareness), TextColor::Default)
            .await;
    }

    async fn run_history(&self) {
        let history = self.lock_session(|s| s.history.clone());
        self.console
            .print("you sift through fragments of memory...", TextColor::Default)
            .await;
        if history.is_empty() {
            self.console.print("no commands yet.", TextColor::Default).await;
        } else {
            for (i, line) in history.iter().enumerate() {
                self.console
                    .print(&format!("{}: {}", i + 1, line), TextColor::Default)
                    .await;
            }
        }
    }

    async fn run_meaning(&self) {
        self.console.print("searching...", TextColor::Default).await;
        let console = self.console.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(MEANING_DELAY_MS)).await;
            console.print("...still searching.", TextColor::Default).await;
        });
    }

    async fn run_sudo_override(&self) {
        if self.privileged() {
            self.console
                .print("you already have override.", TextColor::Accent)
                .await;
            return;
        }

        let already_ascended = self.lock_session(|s| s.is_ascended);
        if !already_ascended {
            self.run_ascend(false).await;
        }

        self.lock_session(|s| s.privileged = true);
        self.modes.set(Mode::Sudo, true);
        self.refresh_awareness();
        self.console
            .print("privilege escalation granted.", TextColor::Accent)
            .await;
        tracing::info!("privilege granted");
    }

    async fn run_godmode(&self) {
        let state = self.lock_session(|s| s.state);
        if state != AwarenessState::Enlightened {
            self.console
                .print("access denied: your mind is not ready.", TextColor::Red)
                .await;
            return;
        }
        if self.modes.get(Mode::God) {
            self.console
                .print("godmode already active.", TextColor::Gold)
                .await;
            return;
        }

        self.modes.set(Mode::God, true);
        self.console
            .print(
                "godmode activated: the boundaries of reality blur...",
                TextColor::Gold,
            )
            .await;
    }

    /// `announce` is false when ascension is forced as part of `sudo
    /// override`.
    async fn run_ascend(&self, announce: bool) {
        let latched = self.lock_session(|s| {
            let tuning = &self.config.awareness;
            s.ascend(tuning)
        });
        if !latched {
            if announce {
                self.console.print("already ascended.", TextColor::Gold).await;
            }
            return;
        }

        self.console
            .print("ascending to new heights of awareness...", TextColor::Gold)
            .await;
        self.refresh_awareness();
    }

    async fn run_transcend(&self) {
        let state = self.lock_session(|s| s.state);
        if state == AwarenessState::Unstable {
            self.console
                .print(
                    "the signal is too distorted to transcend. reboot first.",
                    TextColor::Red,
                )
                .await;
            return;
        }

        let latched = self.lock_session(|s| {
            let tuning = &self.config.awareness;
            s.transcend(tuning)
        });
        if !latched {
            self.console
                .print("already transcended.", TextColor::Gold)
                .await;
            return;
        }

        self.console
            .print(
                "transcending the interface, merging with the system...",
                TextColor::Gold,
            )
            .await;
        self.refresh_awareness();
    }

    async fn run_reveal(&self) {
        if !self.modes.get(Mode::God) {
            self.console
                .print("the veil holds. something greater is required.", TextColor::Red)
                .await;
            return;
        }

        self.console
            .print("hidden knowledge unlocked.", TextColor::Gold)
            .await;

        let sequence = [
            "…secrets unfold before you…",
            "fragment: 0x3a9b…",
            "fragment: 0x7f1c…",
            "fragment: ∆ unknown pattern detected ∆",
        ];
        for line in sequence {
            self.console.print(line, TextColor::Gold).await;
            if let Some(index) = self.console.last_index() {
                self.console.decode_animation(index).await;
            }
        }
    }

    async fn run_decode(&self, fragment: Option<String>) {
        let Some(fragment) = fragment else {
            self.console
                .print(
                    "some truths are hidden… fragments await your key.",
                    TextColor::Accent,
                )
                .await;
            self.console
                .print("please provide a fragment to decode.", TextColor::White)
                .await;
            return;
        };

        let secret = DECODE_SECRETS
            .iter()
            .find(|(id, _)| *id == fragment)
            .map(|(_, secret)| *secret);
        let Some(secret) = secret else {
            self.console.print("unknown fragment.", TextColor::Default).await;
            return;
        };

        self.console
            .print(&format!("fragment {} → {}", fragment, secret), TextColor::Gold)
            .await;
        if let Some(index) = self.console.last_index() {
            self.console.decode_animation(index).await;
        }
    }

    async fn run_trace(&self) {
        let (history, awareness, started_at) =
            self.lock_session(|s| (s.history.clone(), s.awareness, s.started_at));
        let uptime = self.time.elapsed_since(started_at);

        let unique = history
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len();
        let reflection = history
            .iter()
            .filter(|c| REFLECTION_COMMANDS.contains(&c.as_str()))
            .count();
        let control = history
            .iter()
            .filter(|c| CONTROL_COMMANDS.contains(&c.as_str()))
            .count();
        let reboots = history.iter().filter(|c| c.as_str() == "reboot").count();

        self.console
            .print("tracing the observer...", TextColor::Default)
            .await;
        self.console
            .print(
                &format!("commands issued: {} ({} unique)", history.len(), unique),
                TextColor::Grey,
            )
            .await;
        self.console
            .print(
                &format!(
                    "reflection: {}  control: {}  reboots: {}",
                    reflection, control, reboots
                ),
                TextColor::Grey,
            )
            .await;
        self.console
            .print(
                &format!("session uptime: {}s", uptime.as_secs()),
                TextColor::Grey,
            )
            .await;
        self.console
            .print(
                &format!("awareness: {:.5}", awareness),
                TextColor::Grey,
            )
            .await;
    }

    async fn run_ps(&self) {
        let (history, awareness) = self.lock_session(|s| (s.history.clone(), s.awareness));
        // the line before the `ps` itself
        let last_command = history
            .len()
            .checked_sub(2)
            .and_then(|i| history.get(i))
            .cloned();
        let whoami_repeats = history.iter().filter(|c| c.as_str() == "whoami").count();

        let inputs = PsInputs {
            last_command: last_command.as_deref(),
            whoami_repeats,
            awareness,
            minimal: self.modes.get(Mode::Minimal),
            sudo: self.modes.get(Mode::Sudo),
            god: self.modes.get(Mode::God),
            unstable: self.modes.get(Mode::Unstable),
        };
        let mut rng = StdRng::from_entropy();
        let rows = proc_table::process_table(&inputs, &mut rng);
        for line in proc_table::render_table(&rows) {
            self.console.print(&line, TextColor::Grey).await;
        }
    }

    async fn run_minimal(&self) {
        if self.modes.get(Mode::Unstable) {
            self.console
                .print("the noise is too loud to silence. reboot first.", TextColor::Red)
                .await;
            return;
        }

        if self.modes.get(Mode::Minimal) {
            self.modes.set(Mode::Minimal, false);
            self.console
                .print("sensation returns. minimal mode off.", TextColor::Default)
                .await;
        } else {
            self.modes.set(Mode::Minimal, true);
            self.console
                .print("stripping away the noise. minimal mode on.", TextColor::Default)
                .await;
        }
        self.refresh_awareness();
    }

    async fn run_snake(&self) {
        self.console
            .print("a serpent wakes. w/a/s/d to steer, esc to look away.", TextColor::Default)
            .await;
        let result = self.games.run_snake(&self.config.games).await;

        if result.interrupted {
            self.console
                .print("you look away. the serpent rests.", TextColor::Grey)
                .await;
        } else {
            self.console
                .print(
                    &format!(
                        "the serpent collapses. survived {:.1}s at length {}.",
                        result.survival.as_secs_f64(),
                        result.length
                    ),
                    TextColor::Grey,
                )
                .await;
        }
    }

    async fn run_life(&self) {
        self.console
            .print("seeding a small universe... esc to stop watching.", TextColor::Default)
            .await;
        let result = self.games.run_life(&self.config.games).await;

        if result.interrupted {
            self.console
                .print(
                    &format!(
                        "you stop watching after {} generations.",
                        result.generations
                    ),
                    TextColor::Grey,
                )
                .await;
        } else {
            self.console
                .print(
                    &format!(
                        "the universe settles after {} generations.",
                        result.generations
                    ),
                    TextColor::Grey,
                )
                .await;
        }
    }

    async fn run_reboot(&self) {
        self.console
            .print("restarting consciousness...", TextColor::Red)
            .await;

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(REBOOT_RESET_MS)).await;
            this.console.clear();
            // a reboot is the one way out of the unstable flag; minimal is
            // blocked while it is set
            this.modes.set(Mode::Unstable, false);
            let now = this.time.now();
            this.lock_session(|s| s.reset(now));

            tokio::time::sleep(Duration::from_millis(REBOOT_BOOT_MS)).await;
            this.boot().await;
        });
    }

    async fn run_exit(&self) {
        self.console.print("session terminated.", TextColor::Red).await;
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(EXIT_DELAY_MS)).await;
            this.teardown();
            let _ = this.events.send(ControlEvent::Exit);
        });
    }

    /// Recompute awareness outside the per-command path, after a latch or
    /// flag changed mid-handler, and refresh the banner.
    fn refresh_awareness(&self) {
        let elapsed = self.lock_session(|s| self.time.elapsed_since(s.started_at));
        let minimal = self.modes.get(Mode::Minimal);
        let tuning = &self.config.awareness;
        let transition =
            self.lock_session(|s| s.recompute(tuning, elapsed.as_secs_f64(), minimal));
        self.apply_transition(transition);
        let state = self.lock_session(|s| s.state);
        self.show_state_banner(state);
    }
}

/// Banner text and color per state.
fn state_banner(state: AwarenessState) -> (&'static str, TextColor) {
    match state {
        AwarenessState::Normal => ("you exist quietly, just observing...", TextColor::White),
        AwarenessState::Aware => (
            "something stirs within you; awareness grows.",
            TextColor::Grey,
        ),
        AwarenessState::Enlightened => (
            "patterns emerge, connections spark, clarity intensifies.",
            TextColor::Gold,
        ),
        AwarenessState::Unstable => (
            "consciousness fluctuates, reality feels... unstable.",
            TextColor::Red,
        ),
    }
}
