//! Persisted voice settings.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceSettings {
    pub always_listening: bool,
    /// Commands executed so far
    pub usage_count: u64,
}

/// Key-value storage for [`VoiceSettings`]
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<VoiceSettings, SettingsError>;

    fn save(&self, settings: &VoiceSettings) -> Result<(), SettingsError>;

    /// Load, modify and save in one step
    fn update(&self, apply: &mut dyn FnMut(&mut VoiceSettings)) -> Result<VoiceSettings, SettingsError> {
        let mut settings = self.load()?;
        apply(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Settings kept in a JSON file
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    // Serialises read-modify-write within this process
    lock: Mutex<()>,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<config dir>/playgate/settings.json`
    pub fn default_location() -> Result<Self, SettingsError> {
        let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(dir.join("playgate").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<VoiceSettings, SettingsError> {
        if !self.path.exists() {
            debug!("No settings at {}, using defaults", self.path.display());
            return Ok(VoiceSettings::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, settings: &VoiceSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<VoiceSettings, SettingsError> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn save(&self, settings: &VoiceSettings) -> Result<(), SettingsError> {
        let _guard = self.lock.lock();
        self.write(settings)
    }

    fn update(&self, apply: &mut dyn FnMut(&mut VoiceSettings)) -> Result<VoiceSettings, SettingsError> {
        let _guard = self.lock.lock();
        let mut settings = self.read()?;
        apply(&mut settings);
        self.write(&settings)?;
        Ok(settings)
    }
}

/// Settings that live only as long as the process
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<VoiceSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: VoiceSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<VoiceSettings, SettingsError> {
        Ok(self.settings.lock().clone())
    }

    fn save(&self, settings: &VoiceSettings) -> Result<(), SettingsError> {
        *self.settings.lock() = settings.clone();
        Ok(())
    }

    fn update(&self, apply: &mut dyn FnMut(&mut VoiceSettings)) -> Result<VoiceSettings, SettingsError> {
        let mut settings = self.settings.lock();
        apply(&mut settings);
        Ok(settings.clone())
    }
}
