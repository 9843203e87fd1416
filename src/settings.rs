use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Transport settings shared by every driver variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master seed; each RNG stream is derived from it.
    pub seed: u64,
    /// Total path length of every history, in first transport mean free paths.
    pub path_length_tmfp: f64,
    /// Step budget per history; a track that exhausts it is recorded where it stands.
    pub max_steps: u64,
}

impl Settings {
    pub const DEFAULT_SEED: u64 = 8_253_729;

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.path_length_tmfp.is_finite() && self.path_length_tmfp > 0.0) {
            return Err(Error::InvalidSettings(format!(
                "path_length_tmfp must be positive and finite, got {}",
                self.path_length_tmfp
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidSettings("max_steps must be > 0".to_string()));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: Self::DEFAULT_SEED,
            path_length_tmfp: 1.0,
            max_steps: 1_000_000,
        }
    }
}
