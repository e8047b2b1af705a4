//! Persistence port.
//!
//! [`KeyValueStore`] is the raw string map (browser `localStorage` in
//! production). [`GameStore`] layers typed accessors over it and is the only
//! place stored strings are parsed. Stored data is user-editable, so every
//! read repairs out-of-range or garbled values to a default instead of
//! failing, and every write is best-effort.

use std::collections::HashMap;

use log::warn;

use crate::error::StorageError;
use crate::game::round::RandomSource;
use crate::model::{ComparisonMode, Language};

#[cfg(target_arch = "wasm32")]
mod local;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageStore;

pub mod keys {
    pub const ROUND: &str = "gameRound";
    pub const STREAK: &str = "gameStreak";
    pub const MODE: &str = "gameMode";
    pub const PLAYER_NAME: &str = "playerName";
    pub const LANGUAGE: &str = "gameLanguage";
    pub const TEXT_TO_SPEECH: &str = "textToSpeechEnabled";
    pub const MUSIC: &str = "backgroundMusicEnabled";
}

pub const DEFAULT_ROUND_INDEX: u32 = 1;
/// Stored indices at or above this are treated as tampered. The session wraps
/// back to the start before reaching it.
pub const MAX_ROUND_INDEX: u32 = 1_000_000;
pub const MAX_PLAYER_NAME_CHARS: usize = 20;

/// Names handed out when no player name is stored.
pub const FUN_NAMES: &[&str] = &[
    "ACE", "BLAZE", "COMET", "DASH", "ECHO", "FLASH", "GALAXY", "HERO", "IMPACT", "JAZZ",
    "KNIGHT", "LEGEND", "MAVERICK", "NOVA", "PIXEL",
];

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. `set_failing(true)` makes every call error, which is how
/// tests simulate a full quota or disabled storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            failing: false,
        }
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Direct read that bypasses the failure switch.
    pub fn peek(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::WriteRejected {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable);
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed view of the persisted game state.
#[derive(Debug)]
pub struct GameStore<S> {
    inner: S,
}

impl<S: KeyValueStore> GameStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.inner.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("storage read of '{key}' failed: {e}");
                None
            }
        }
    }

    /// Returns whether the write landed. Failures are logged, never raised.
    fn write(&mut self, key: &str, value: &str) -> bool {
        match self.inner.set(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("storage write of '{key}' failed, keeping in-memory value: {e}");
                false
            }
        }
    }

    fn delete(&mut self, key: &str) -> bool {
        match self.inner.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("storage remove of '{key}' failed: {e}");
                false
            }
        }
    }

    fn read_flag(&self, key: &str) -> bool {
        self.read(key).as_deref() == Some("true")
    }

    /// Stored round index; absent, non-numeric, zero or out-of-range reads as 1.
    pub fn round_index(&self) -> u32 {
        match self.read(keys::ROUND) {
            None => DEFAULT_ROUND_INDEX,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if (1..MAX_ROUND_INDEX).contains(&n) => n,
                _ => {
                    warn!("repairing stored round index '{raw}' to {DEFAULT_ROUND_INDEX}");
                    DEFAULT_ROUND_INDEX
                }
            },
        }
    }

    pub fn set_round_index(&mut self, index: u32) -> bool {
        self.write(keys::ROUND, &index.to_string())
    }

    pub fn clear_round_index(&mut self) -> bool {
        self.delete(keys::ROUND)
    }

    /// Raw stored streak; garbled values read as 0. Range repair against the
    /// cap happens in [`crate::game::streak::StreakTracker::restore`].
    pub fn streak(&self) -> u32 {
        match self.read(keys::STREAK) {
            None => 0,
            Some(raw) => raw.trim().parse::<u32>().unwrap_or_else(|_| {
                warn!("repairing stored streak '{raw}' to 0");
                0
            }),
        }
    }

    pub fn set_streak(&mut self, streak: u8) -> bool {
        self.write(keys::STREAK, &streak.to_string())
    }

    pub fn clear_streak(&mut self) -> bool {
        self.delete(keys::STREAK)
    }

    pub fn mode(&self) -> ComparisonMode {
        self.read(keys::MODE)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_mode(&mut self, mode: ComparisonMode) -> bool {
        self.write(keys::MODE, mode.as_str())
    }

    pub fn language(&self) -> Language {
        self.read(keys::LANGUAGE)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_language(&mut self, language: Language) -> bool {
        self.write(keys::LANGUAGE, language.code())
    }

    /// Stored player name, if a usable one exists.
    pub fn stored_player_name(&self) -> Option<String> {
        self.read(keys::PLAYER_NAME)
            .and_then(|raw| normalize_player_name(&raw))
    }

    /// Stored player name, or a freshly picked fun name that is persisted.
    pub fn player_name(&mut self, rng: &mut impl RandomSource) -> String {
        if let Some(name) = self.stored_player_name() {
            return name;
        }
        let idx = ((rng.next_unit() * FUN_NAMES.len() as f64) as usize).min(FUN_NAMES.len() - 1);
        let name = FUN_NAMES[idx].to_string();
        self.write(keys::PLAYER_NAME, &name);
        name
    }

    pub fn set_player_name(&mut self, name: &str) -> bool {
        self.write(keys::PLAYER_NAME, name)
    }

    pub fn text_to_speech(&self) -> bool {
        self.read_flag(keys::TEXT_TO_SPEECH)
    }

    pub fn set_text_to_speech(&mut self, enabled: bool) -> bool {
        self.write(keys::TEXT_TO_SPEECH, if enabled { "true" } else { "false" })
    }

    pub fn music(&self) -> bool {
        self.read_flag(keys::MUSIC)
    }

    pub fn set_music(&mut self, enabled: bool) -> bool {
        self.write(keys::MUSIC, if enabled { "true" } else { "false" })
    }
}

/// Trim and cap a player name; blank names are rejected.
pub fn normalize_player_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_PLAYER_NAME_CHARS).collect())
}
