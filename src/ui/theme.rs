use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

/// Storage key the client uses for the persisted theme.
pub const THEME_STORAGE_KEY: &str = "theme";

/// ThemeMode
///
/// The two page themes. Serialized lowercase, matching the persisted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

/// ThemeStorage
///
/// Synchronous string key/value store, the shape of browser local storage.
pub trait ThemeStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// MemoryStorage
///
/// In-process `ThemeStorage`, used for server-side rendering and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut storage = Self::default();
        storage.set(key, value);
        storage
    }
}

impl ThemeStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// ThemeToggle
///
/// Two-state light/dark switch. The initial state comes from storage (light when absent or
/// unrecognised); every toggle writes the new state back immediately.
#[derive(Debug)]
pub struct ThemeToggle<S: ThemeStorage> {
    storage: S,
    mode: ThemeMode,
}

impl<S: ThemeStorage> ThemeToggle<S> {
    pub fn new(storage: S) -> Self {
        let mode = storage
            .get(THEME_STORAGE_KEY)
            .as_deref()
            .and_then(ThemeMode::parse)
            .unwrap_or_default();
        Self { storage, mode }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn toggle(&mut self) -> ThemeMode {
        self.mode = self.mode.toggled();
        self.storage.set(THEME_STORAGE_KEY, self.mode.as_str());
        self.mode
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
