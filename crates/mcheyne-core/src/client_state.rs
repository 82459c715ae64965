//! Client-side reading state: selected plan, theme, completed readings.
//!
//! State lives behind the narrow [`KeyValueStore`] interface so the storage
//! technology (browser local storage, a JSON file, memory) never leaks into
//! the resolver or formatter. The server never touches this module.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Key holding the selected plan identifier.
pub const SELECTED_PLAN_KEY: &str = "selectedPlan";
/// Key holding the colour theme.
pub const THEME_KEY: &str = "theme";
/// Key holding the JSON completion map.
pub const COMPLETED_KEY: &str = "completedReadings";

/// Plan the client starts on before the user picks one.
pub const DEFAULT_CLIENT_PLAN: &str = "24_month";

#[derive(Debug, Error)]
pub enum ClientStateError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("state file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Minimal string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), ClientStateError>;
    fn remove(&mut self, key: &str) -> Result<(), ClientStateError>;
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Volatile store, for tests and one-shot use.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ClientStateError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientStateError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A JSON object file, rewritten in full on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientStateError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(ClientStateError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), ClientStateError> {
        let io_err = |source| ClientStateError::Io {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, contents).map_err(io_err)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), ClientStateError> {
        self.entries.insert(key.to_owned(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientStateError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Colour theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Completion summary for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
    /// Percentage rounded to one decimal place.
    pub percentage: f64,
}

impl Progress {
    pub fn new(completed: u32, total: u32) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            (f64::from(completed) / f64::from(total) * 1000.0).round() / 10.0
        };
        Self {
            completed,
            total,
            percentage,
        }
    }
}

/// Completion-map key for the entry at `index` (0-based) in a plan.
///
/// Keyed by position, not date: multi-year plans repeat calendar dates.
pub fn entry_key(plan_id: &str, index: usize) -> String {
    format!("{plan_id}-{index}")
}

/// Typed accessors over a [`KeyValueStore`].
#[derive(Debug)]
pub struct ClientState<S> {
    store: S,
}

impl<S: KeyValueStore> ClientState<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn selected_plan(&self) -> String {
        self.store
            .get(SELECTED_PLAN_KEY)
            .unwrap_or_else(|| DEFAULT_CLIENT_PLAN.to_owned())
    }

    pub fn set_selected_plan(&mut self, plan_id: &str) -> Result<(), ClientStateError> {
        self.store.set(SELECTED_PLAN_KEY, plan_id.to_owned())
    }

    /// Stored theme; unknown or missing values read as light.
    pub fn theme(&self) -> Theme {
        match self.store.get(THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn toggle_theme(&mut self) -> Result<Theme, ClientStateError> {
        let next = self.theme().toggled();
        self.store.set(THEME_KEY, next.as_str().to_owned())?;
        Ok(next)
    }

    /// The completion map. A corrupt value reads as empty.
    pub fn completed(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.store
            .get(COMPLETED_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(map) => Some(map),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring unreadable completion map");
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn completed_at(&self, plan_id: &str, index: usize) -> Option<DateTime<Utc>> {
        self.completed().get(&entry_key(plan_id, index)).copied()
    }

    pub fn is_completed(&self, plan_id: &str, index: usize) -> bool {
        self.completed_at(plan_id, index).is_some()
    }

    /// Flip the completion state of the entry at `index`. Returns `true` if
    /// the entry is now complete.
    pub fn toggle_completed(
        &mut self,
        plan_id: &str,
        index: usize,
        now: DateTime<Utc>,
    ) -> Result<bool, ClientStateError> {
        let mut map = self.completed();
        let key = entry_key(plan_id, index);
        let now_complete = if map.remove(&key).is_some() {
            false
        } else {
            map.insert(key, now);
            true
        };
        if map.is_empty() {
            self.store.remove(COMPLETED_KEY)?;
        } else {
            self.store.set(COMPLETED_KEY, serde_json::to_string(&map)?)?;
        }
        Ok(now_complete)
    }

    /// Number of completed days recorded for `plan_id`.
    pub fn completed_count(&self, plan_id: &str) -> u32 {
        let prefix = format!("{plan_id}-");
        let count = self
            .completed()
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub fn progress(&self, plan_id: &str, total_days: u32) -> Progress {
        Progress::new(self.completed_count(plan_id), total_days)
    }
}
