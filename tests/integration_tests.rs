// Integration tests - driving the interpreter headlessly, end to end

use lucid::awareness::AwarenessState;
use lucid::command::{BASE_COMMANDS, HIDDEN_COMMANDS};
use lucid::config::Config;
use lucid::games::GameHost;
use lucid::interpreter::Interpreter;
use lucid::modes::{Mode, ModeStore};
use lucid::output::Console;
use lucid::time_source::TestTimeSource;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    interpreter: Interpreter,
    time: Arc<TestTimeSource>,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    harness_at(dir.path().join("modes.json").as_path(), dir)
}

fn harness_at(store_path: &Path, dir: tempfile::TempDir) -> Harness {
    let mut config = Config::default();
    config.render.reveal_interval_ms = 0;
    config.render.decode_duration_ms = 0;
    let config = Arc::new(config);

    let console = Console::new(config.render.clone());
    let modes = Arc::new(ModeStore::open(store_path));
    let time = TestTimeSource::shared();
    let (interpreter, _control) = Interpreter::new(
        config,
        console,
        modes,
        GameHost::new(),
        time.clone(),
    );
    Harness {
        interpreter,
        time,
        _dir: dir,
    }
}

fn lines(harness: &Harness) -> Vec<String> {
    harness
        .interpreter
        .console()
        .snapshot()
        .into_iter()
        .map(|(text, _)| text)
        .collect()
}

fn awareness(harness: &Harness) -> f64 {
    harness.interpreter.session().lock().unwrap().awareness
}

/// The ceiling always reflects the current minimal/privileged combination:
/// minimal caps at 75 even for a privileged session.
#[tokio::test]
async fn awareness_stays_clamped_under_any_flag_combination() {
    let h = harness();
    h.interpreter.boot().await;

    h.interpreter.submit("minimal").await;
    h.interpreter.submit("sudo override").await;
    h.interpreter.submit("transcend").await;
    h.time.advance(Duration::from_secs(3600));
    h.interpreter.submit("status").await;
    assert_eq!(awareness(&h), 75.0, "minimal caps even a privileged session");

    // leaving minimal lifts the cap to the privileged ceiling
    h.interpreter.submit("minimal").await;
    let lifted = awareness(&h);
    assert!(lifted > 75.0);
    assert!(lifted <= 100.0);
}

#[tokio::test]
async fn second_sudo_override_changes_nothing() {
    let h = harness();
    h.interpreter.boot().await;

    h.interpreter.submit("sudo override").await;
    let granted = lines(&h)
        .iter()
        .filter(|l| *l == "privilege escalation granted.")
        .count();
    assert_eq!(granted, 1);

    h.interpreter.submit("sudo override").await;
    let granted = lines(&h)
        .iter()
        .filter(|l| *l == "privilege escalation granted.")
        .count();
    assert_eq!(granted, 1, "privilege is granted exactly once");
    assert!(lines(&h).contains(&"you already have override.".to_string()));

    let list = h.interpreter.help_list();
    assert_eq!(list.len(), BASE_COMMANDS.len() + HIDDEN_COMMANDS.len());
    for hidden in HIDDEN_COMMANDS {
        assert_eq!(list.iter().filter(|c| **c == hidden).count(), 1);
    }
}

#[tokio::test]
async fn repeated_ascend_never_lowers_awareness() {
    let h = harness();
    h.interpreter.boot().await;
    h.interpreter.submit("sudo override").await;

    h.interpreter.submit("ascend").await;
    let first = awareness(&h);

    h.interpreter.submit("ascend").await;
    assert!(lines(&h).contains(&"already ascended.".to_string()));
    assert!(awareness(&h) >= first);
}

#[tokio::test]
async fn unprivileged_decode_is_an_unknown_command() {
    let h = harness();
    h.interpreter.boot().await;

    // drive awareness up first; the gate must not depend on state
    for _ in 0..5 {
        h.interpreter.submit("whoami").await;
        h.interpreter.submit("status").await;
    }
    h.interpreter.submit("decode 0x3a9b").await;

    let lines = lines(&h);
    assert_eq!(lines.last().unwrap(), "unknown command.");
    assert!(!lines.iter().any(|l| l.contains("watcher")));
}

#[tokio::test]
async fn minimal_round_trip_disables_other_flags_across_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modes.json");

    {
        let h = harness_at(&path, tempfile::tempdir().unwrap());
        h.interpreter.boot().await;
        h.interpreter.submit("sudo override").await;
        h.interpreter.submit("minimal").await;
    }

    let modes = ModeStore::open(&path);
    assert!(modes.get(Mode::Minimal));
    assert!(!modes.get(Mode::Sudo));
    assert!(!modes.get(Mode::God));
    assert!(!modes.get(Mode::Unstable));
}

/// History entries and awareness recomputation happen strictly before the
/// handler runs, so status/trace always see their own command recorded.
#[tokio::test]
async fn handlers_see_their_own_command_recorded() {
    let h = harness();
    h.interpreter.boot().await;

    h.interpreter.submit("status").await;
    let session = h.interpreter.session().lock().unwrap();
    assert_eq!(session.history, vec!["status".to_string()]);
    assert!(session.awareness > 0.0);
    drop(session);

    h.interpreter.submit("trace").await;
    assert!(lines(&h).contains(&"commands issued: 2 (2 unique)".to_string()));
}

#[tokio::test]
async fn state_derivation_has_no_hysteresis() {
    let h = harness();
    h.interpreter.boot().await;
    h.interpreter.submit("sudo override").await;
    h.interpreter.submit("transcend").await;

    let state = h.interpreter.session().lock().unwrap().state;
    assert_eq!(state, AwarenessState::Enlightened);

    // re-running a neutral command re-derives the same state from the same
    // inputs
    h.interpreter.submit("status").await;
    let again = h.interpreter.session().lock().unwrap().state;
    assert_eq!(again, AwarenessState::Enlightened);
}

#[tokio::test]
async fn session_duration_feeds_awareness() {
    let h = harness();
    h.interpreter.boot().await;

    h.interpreter.submit("whoami").await;
    let before = awareness(&h);

    h.time.advance(Duration::from_secs(600));
    h.interpreter.submit("whoami").await;
    assert!(awareness(&h) > before, "ten idle minutes raise the score");
}

#[tokio::test]
async fn help_hides_and_reveals_the_hidden_commands() {
    let h = harness();
    h.interpreter.boot().await;

    h.interpreter.submit("help").await;
    let listing = lines(&h)
        .into_iter()
        .find(|l| l.starts_with("available commands:"))
        .unwrap();
    assert!(!listing.contains("decode"));
    assert!(lines(&h)
        .contains(&"some commands require elevated privileges...".to_string()));

    h.interpreter.submit("sudo override").await;
    h.interpreter.submit("help").await;
    let listing = lines(&h)
        .into_iter()
        .filter(|l| l.starts_with("available commands:"))
        .last()
        .unwrap();
    for hidden in HIDDEN_COMMANDS {
        assert!(listing.contains(hidden), "{} should be listed", hidden);
    }
}

/// Drive a privileged god-mode session over the unstable line.
async fn go_unstable(h: &Harness) {
    h.interpreter.submit("sudo override").await;
    h.interpreter.submit("transcend").await;
    h.interpreter.submit("godmode").await;
    // one more reflection command pushes awareness past 90
    h.interpreter.submit("whoami").await;
    assert_eq!(
        h.interpreter.session().lock().unwrap().state,
        AwarenessState::Unstable
    );
}

#[tokio::test]
async fn entering_unstable_persists_the_flag_and_drops_godmode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modes.json");
    let h = harness_at(&path, tempfile::tempdir().unwrap());
    h.interpreter.boot().await;

    h.interpreter.submit("sudo override").await;
    h.interpreter.submit("transcend").await;
    h.interpreter.submit("godmode").await;
    assert!(h.interpreter.console().is_gold());

    h.interpreter.submit("whoami").await;
    assert_eq!(
        h.interpreter.session().lock().unwrap().state,
        AwarenessState::Unstable
    );
    // leaving enlightened auto-deactivates god-mode, and the unstable flag
    // lands in the store
    assert!(!h.interpreter.console().is_gold());
    assert!(h.interpreter.console().is_unstable());

    let modes = ModeStore::open(&path);
    assert!(modes.get(Mode::Unstable));
    assert!(!modes.get(Mode::God));
    assert!(!modes.get(Mode::Sudo));
}

#[tokio::test(start_paused = true)]
async fn reboot_unblocks_minimal_after_unstable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modes.json");
    let h = harness_at(&path, tempfile::tempdir().unwrap());
    h.interpreter.boot().await;
    go_unstable(&h).await;

    h.interpreter.submit("minimal").await;
    assert!(lines(&h)
        .contains(&"the noise is too loud to silence. reboot first.".to_string()));
    assert!(!ModeStore::open(&path).get(Mode::Minimal));

    h.interpreter.submit("reboot").await;
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert!(!h.interpreter.console().is_unstable());

    h.interpreter.submit("minimal").await;
    assert!(lines(&h)
        .contains(&"stripping away the noise. minimal mode on.".to_string()));

    let modes = ModeStore::open(&path);
    assert!(modes.get(Mode::Minimal));
    assert!(!modes.get(Mode::Unstable));
}

#[tokio::test(start_paused = true)]
async fn reboot_wipes_the_session_but_not_the_flags() {
    let h = harness();
    h.interpreter.boot().await;
    h.interpreter.submit("sudo override").await;
    assert!(h.interpreter.session().lock().unwrap().privileged);

    h.interpreter.submit("reboot").await;
    tokio::time::sleep(Duration::from_millis(1600)).await;

    let session = h.interpreter.session().lock().unwrap();
    assert!(session.history.is_empty());
    assert!(!session.privileged);
    assert!(session.booted);
    drop(session);

    // the sudo flag persists and is replayed on boot
    assert!(h.interpreter.console().is_ripple());
}
