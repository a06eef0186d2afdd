//! Persisted mode flags.
//!
//! Four named booleans survive across runs: `minimalmode`, `sudomode`,
//! `godmode`, `unstablemode`. They are stored under those fixed keys with the
//! literal string values `"true"`/`"false"`, and an absent key reads as false.
//!
//! The store is an explicit service (get/set/subscribe) rather than ambient
//! global state. Mutual exclusion is enforced on entry:
//! - entering sudo exits god
//! - entering god exits sudo
//! - entering unstable exits sudo
//! - entering minimal exits all others
//!
//! There is no cross-process locking; last writer wins, and the only
//! discipline protecting against drift is read-on-boot.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A persisted mode flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Minimal,
    Sudo,
    God,
    Unstable,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Minimal, Mode::Sudo, Mode::God, Mode::Unstable];

    /// Fixed storage key for this flag.
    pub fn key(self) -> &'static str {
        match self {
            Mode::Minimal => "minimalmode",
            Mode::Sudo => "sudomode",
            Mode::God => "godmode",
            Mode::Unstable => "unstablemode",
        }
    }

    fn index(self) -> usize {
        match self {
            Mode::Minimal => 0,
            Mode::Sudo => 1,
            Mode::God => 2,
            Mode::Unstable => 3,
        }
    }

    /// Modes forcibly exited when this one is entered.
    fn excludes(self) -> &'static [Mode] {
        match self {
            Mode::Minimal => &[Mode::Sudo, Mode::God, Mode::Unstable],
            Mode::Sudo => &[Mode::God],
            Mode::God => &[Mode::Sudo],
            Mode::Unstable => &[Mode::Sudo],
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Callback invoked with `(mode, active)` after every flag change, and again
/// for each active flag when the store is replayed on boot.
pub type ModeListener = Box<dyn Fn(Mode, bool) + Send + Sync>;

/// Persisted flag store with change notification.
pub struct ModeStore {
    path: PathBuf,
    values: Mutex<[bool; 4]>,
    listeners: Mutex<Vec<ModeListener>>,
}

impl ModeStore {
    /// Open the store at `path`, reading any existing flags. A missing or
    /// unreadable file yields an all-false store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_file(&path);
        Self {
            path,
            values: Mutex::new(values),
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn read_file(path: &Path) -> [bool; 4] {
        let mut values = [false; 4];
        let Ok(text) = fs::read_to_string(path) else {
            return values;
        };
        let Ok(map) = serde_json::from_str::<BTreeMap<String, String>>(&text) else {
            tracing::warn!("ignoring malformed mode store at {:?}", path);
            return values;
        };
        for mode in Mode::ALL {
            // only the literal string "true" counts
            values[mode.index()] = map.get(mode.key()).map(|v| v == "true").unwrap_or(false);
        }
        values
    }

    /// Read a single flag.
    pub fn get(&self, mode: Mode) -> bool {
        self.values.lock().expect("mode store poisoned")[mode.index()]
    }

    /// Set a flag, applying mutual-exclusion rules, persisting, and notifying
    /// listeners of every flag that actually changed.
    pub fn set(&self, mode: Mode, active: bool) {
        let mut changed: Vec<(Mode, bool)> = Vec::new();
        {
            let mut values = self.values.lock().expect("mode store poisoned");
            if active {
                for &other in mode.excludes() {
                    if values[other.index()] {
                        values[other.index()] = false;
                        changed.push((other, false));
                    }
                }
            }
            if values[mode.index()] != active {
                values[mode.index()] = active;
                changed.push((mode, active));
            }
            if !changed.is_empty() {
                self.persist(&values);
            }
        }

        if !changed.is_empty() {
            let listeners = self.listeners.lock().expect("mode listeners poisoned");
            for (mode, active) in &changed {
                tracing::debug!(%mode, active, "mode flag changed");
                for listener in listeners.iter() {
                    listener(*mode, *active);
                }
            }
        }
    }

    /// Register a change listener.
    pub fn subscribe(&self, listener: ModeListener) {
        self.listeners
            .lock()
            .expect("mode listeners poisoned")
            .push(listener);
    }

    /// Re-announce every currently active flag to all listeners.
    ///
    /// Boot restoration goes through the same notification path as a manual
    /// toggle, so a restored flag has exactly the side effects of entering it.
    pub fn replay(&self) {
        let values = *self.values.lock().expect("mode store poisoned");
        let listeners = self.listeners.lock().expect("mode listeners poisoned");
        for mode in Mode::ALL {
            if values[mode.index()] {
                for listener in listeners.iter() {
                    listener(mode, true);
                }
            }
        }
    }

    /// Snapshot of all flags, for diagnostics.
    pub fn snapshot(&self) -> [(Mode, bool); 4] {
        let values = *self.values.lock().expect("mode store poisoned");
        [
            (Mode::Minimal, values[0]),
            (Mode::Sudo, values[1]),
            (Mode::God, values[2]),
            (Mode::Unstable, values[3]),
        ]
    }

    fn persist(&self, values: &[bool; 4]) {
        let mut map = BTreeMap::new();
        for mode in Mode::ALL {
            let literal = if values[mode.index()] { "true" } else { "false" };
            map.insert(mode.key().to_string(), literal.to_string());
        }

        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp = self.path.with_extension("tmp");
            let json = serde_json::to_string_pretty(&map).expect("flag map serializes");
            fs::write(&tmp, json)?;
            fs::rename(&tmp, &self.path)?;
            Ok(())
        };

        if let Err(e) = write() {
            tracing::warn!("could not persist mode flags to {:?}: {}", self.path, e);
        }
    }
}

impl std::fmt::Debug for ModeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeStore")
            .field("path", &self.path)
            .field("values", &self.values)
            .finish()
    }
}

/// Default store path: `~/.local/state/lucid/modes.json` (per `dirs`),
/// falling back to the temp dir.
pub fn default_store_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("lucid")
        .join("modes.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn temp_store() -> (tempfile::TempDir, ModeStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ModeStore::open(dir.path().join("modes.json"));
        (dir, store)
    }

    #[test]
    fn absent_flags_read_false() {
        let (_dir, store) = temp_store();
        for mode in Mode::ALL {
            assert!(!store.get(mode));
        }
    }

    #[test]
    fn set_and_get_round_trip() {
        let (_dir, store) = temp_store();
        store.set(Mode::Sudo, true);
        assert!(store.get(Mode::Sudo));
        store.set(Mode::Sudo, false);
        assert!(!store.get(Mode::Sudo));
    }

    #[test]
    fn flags_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes.json");

        let store = ModeStore::open(&path);
        store.set(Mode::God, true);
        drop(store);

        let store = ModeStore::open(&path);
        assert!(store.get(Mode::God));
        assert!(!store.get(Mode::Sudo));
    }

    #[test]
    fn file_uses_literal_true_false_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes.json");

        let store = ModeStore::open(&path);
        store.set(Mode::Unstable, true);

        let map: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(map.get("unstablemode").unwrap(), "true");
        assert_eq!(map.get("godmode").unwrap(), "false");
    }

    #[test]
    fn sudo_and_god_are_mutually_exclusive() {
        let (_dir, store) = temp_store();
        store.set(Mode::Sudo, true);
        store.set(Mode::God, true);
        assert!(store.get(Mode::God));
        assert!(!store.get(Mode::Sudo));

        store.set(Mode::Sudo, true);
        assert!(store.get(Mode::Sudo));
        assert!(!store.get(Mode::God));
    }

    #[test]
    fn unstable_exits_sudo() {
        let (_dir, store) = temp_store();
        store.set(Mode::Sudo, true);
        store.set(Mode::Unstable, true);
        assert!(!store.get(Mode::Sudo));
        assert!(store.get(Mode::Unstable));
    }

    #[test]
    fn minimal_suppresses_all_others() {
        let (_dir, store) = temp_store();
        store.set(Mode::God, true);
        store.set(Mode::Unstable, true);
        store.set(Mode::Minimal, true);

        assert!(store.get(Mode::Minimal));
        assert!(!store.get(Mode::Sudo));
        assert!(!store.get(Mode::God));
        assert!(!store.get(Mode::Unstable));
    }

    #[test]
    fn minimal_exclusion_survives_reload() {
        // set minimal, reload, others must read inactive
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes.json");

        let store = ModeStore::open(&path);
        store.set(Mode::Sudo, true);
        store.set(Mode::Minimal, true);
        drop(store);

        let store = ModeStore::open(&path);
        assert!(store.get(Mode::Minimal));
        assert!(!store.get(Mode::Sudo));
        assert!(!store.get(Mode::God));
        assert!(!store.get(Mode::Unstable));
    }

    #[test]
    fn listeners_see_exclusion_cascade() {
        let (_dir, store) = temp_store();
        let events: Arc<Mutex<Vec<(Mode, bool)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(Box::new(move |mode, active| {
            sink.lock().unwrap().push((mode, active));
        }));

        store.set(Mode::Sudo, true);
        store.set(Mode::God, true);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![(Mode::Sudo, true), (Mode::Sudo, false), (Mode::God, true)]
        );
    }

    #[test]
    fn redundant_set_does_not_notify() {
        let (_dir, store) = temp_store();
        let count = Arc::new(AtomicUsize::new(0));
        let sink = count.clone();
        store.subscribe(Box::new(move |_, _| {
            sink.fetch_add(1, Ordering::SeqCst);
        }));

        store.set(Mode::God, true);
        store.set(Mode::God, true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replay_announces_only_active_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modes.json");

        let store = ModeStore::open(&path);
        store.set(Mode::God, true);
        drop(store);

        let store = ModeStore::open(&path);
        let events: Arc<Mutex<Vec<(Mode, bool)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(Box::new(move |mode, active| {
            sink.lock().unwrap().push((mode, active));
        }));

        store.replay();
        assert_eq!(*events.lock().unwrap(), vec![(Mode::God, true)]);
    }
}
