// Process-wide defaults for simulations started without explicit arguments.
use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::material::Material;
use crate::settings::Settings;

// Global defaults used by `Simulator::simulate_default`
pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

/// Run defaults for the simulation drivers.
///
/// A single global instance is exposed via the `CONFIG` static. Most code
/// should obtain a guard with [`Config::global`] rather than locking the mutex
/// directly. Drivers read from it once, before any worker starts, so the hot
/// loop never touches the lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Material used when none is given.
    pub material: Material,
    /// History count used when none is given.
    pub histories: u64,
    /// Worker threads for the multithreaded driver; `None` means one per core.
    pub threads: Option<usize>,
    /// Lanes kept in flight by the offload emulator.
    pub lanes: usize,
    /// Transport settings.
    pub settings: Settings,
}

impl Config {
    pub const DEFAULT_HISTORIES: u64 = 1_000_000;
    pub const DEFAULT_LANES: usize = 64;

    pub fn new() -> Self {
        Config {
            material: Material::Gold,
            histories: Self::DEFAULT_HISTORIES,
            threads: None,
            lanes: Self::DEFAULT_LANES,
            settings: Settings::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.histories == 0 {
            return Err(Error::InvalidHistoryCount(0));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidSettings("threads must be > 0".to_string()));
        }
        if self.lanes == 0 {
            return Err(Error::InvalidSettings("lanes must be > 0".to_string()));
        }
        self.settings.validate()
    }

    /// Parse and validate a JSON configuration. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Get the global configuration instance
    pub fn global() -> std::sync::MutexGuard<'static, Self> {
        CONFIG
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the global configuration after validating it.
    pub fn install(self) -> Result<()> {
        self.validate()?;
        *Self::global() = self;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
