use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{default_avoid_phrases, default_positive_phrases, PhraseDefinition};

/// Fixed options handed to the speech recognizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".into(),
            continuous: true,
            interim_results: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    recognition: RecognitionConfig,
    /// Whether recording should resume after a restart or remount.
    keep_recording: bool,
    save_debounce_ms: u64,
    default_positive: Vec<PhraseDefinition>,
    default_avoid: Vec<PhraseDefinition>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            recognition: RecognitionConfig::default(),
            keep_recording: false,
            save_debounce_ms: 500,
            default_positive: default_positive_phrases(),
            default_avoid: default_avoid_phrases(),
        }
    }
}

/// JSON-file backed user settings. `path == None` keeps settings in memory only.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable settings at {}: {err}; using defaults",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(UserSettings::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn recognition(&self) -> RecognitionConfig {
        self.read().recognition.clone()
    }

    pub fn update_recognition(&self, config: RecognitionConfig) -> Result<()> {
        let mut guard = self.write();
        guard.recognition = config;
        self.persist(&guard)
    }

    pub fn keep_recording(&self) -> bool {
        self.read().keep_recording
    }

    pub fn set_keep_recording(&self, keep_recording: bool) -> Result<()> {
        let mut guard = self.write();
        if guard.keep_recording == keep_recording {
            return Ok(());
        }
        guard.keep_recording = keep_recording;
        self.persist(&guard)
    }

    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.read().save_debounce_ms)
    }

    pub fn set_save_debounce(&self, debounce: Duration) -> Result<()> {
        let mut guard = self.write();
        guard.save_debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self.persist(&guard)
    }

    /// Phrase definitions used to seed a day when no earlier record exists.
    pub fn default_phrases(&self) -> (Vec<PhraseDefinition>, Vec<PhraseDefinition>) {
        let guard = self.read();
        (guard.default_positive.clone(), guard.default_avoid.clone())
    }

    pub fn update_default_phrases(
        &self,
        positive: Vec<PhraseDefinition>,
        avoid: Vec<PhraseDefinition>,
    ) -> Result<()> {
        let mut guard = self.write();
        guard.default_positive = positive;
        guard.default_avoid = avoid;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = fs::read_to_string(path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.recognition(), RecognitionConfig::default());
        assert!(!store.keep_recording());
        assert_eq!(store.save_debounce(), Duration::from_millis(500));
        let (positive, avoid) = store.default_phrases();
        assert_eq!(positive.len(), 3);
        assert_eq!(avoid[2].text, "never");
    }

    #[test]
    fn keep_recording_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store.set_keep_recording(true).unwrap();
        store
            .update_recognition(RecognitionConfig {
                language: "en-GB".into(),
                ..RecognitionConfig::default()
            })
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert!(reopened.keep_recording());
        assert_eq!(reopened.recognition().language, "en-GB");
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"keepRecording": true}"#).unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert!(store.keep_recording());
        assert_eq!(store.recognition().language, "en-US");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::new(path).unwrap();
        assert!(!store.keep_recording());
    }
}
