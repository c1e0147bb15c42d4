//! # Player Configuration
//!
//! YAML configuration for playback and numeric entry. Every key is optional;
//! missing keys take the defaults shown here.
//!
//! ```yaml
//! default-tempo: 120
//! base-octave: 4
//! envelope:
//!   attack: 0.01          # seconds from silence to peak
//!   peak: 0.5
//!   sustain: 0.3
//!   decay-fraction: 0.3   # fraction of the note where sustain is reached
//! output:
//!   buffer-size: 512      # frames per audio callback (audio feature)
//! ```
//!
//! ## Example
//! ```rust
//! use jianpu::PlayerConfig;
//!
//! let config = PlayerConfig::from_str("default-tempo: 90\nenvelope:\n  peak: 0.8\n")?;
//! assert_eq!(config.default_tempo, 90);
//! assert_eq!(config.envelope.peak, 0.8);
//! assert_eq!(config.envelope.attack, 0.01);
//! # Ok::<(), jianpu::JianpuError>(())
//! ```

use crate::error::JianpuError;
use crate::score::Octave;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shape of the amplitude envelope applied to every tone
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct EnvelopeConfig {
    pub attack: f64,
    pub peak: f64,
    pub sustain: f64,
    pub decay_fraction: f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.01,
            peak: 0.5,
            sustain: 0.3,
            decay_fraction: 0.3,
        }
    }
}

/// Audio output settings, only read by the cpal backend
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    pub buffer_size: Option<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct PlayerConfig {
    pub default_tempo: u16,
    pub base_octave: u8,
    pub envelope: EnvelopeConfig,
    pub output: OutputConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_tempo: 120,
            base_octave: Octave::MIDDLE.value(),
            envelope: EnvelopeConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JianpuError> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, JianpuError> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: PlayerConfig = serde_yaml::from_str(content)
            .map_err(|e| JianpuError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The configured base octave for unmarked shorthand digits.
    pub fn base_octave(&self) -> Result<Octave, JianpuError> {
        Octave::new(self.base_octave)
            .map_err(|_| JianpuError::ConfigError(format!("base-octave {} is outside 2..=6", self.base_octave)))
    }

    pub fn validate(&self) -> Result<(), JianpuError> {
        if self.default_tempo == 0 {
            return Err(JianpuError::ConfigError("default-tempo must be positive".to_string()));
        }
        self.base_octave()?;

        let envelope = &self.envelope;
        if !(envelope.attack >= 0.0) {
            return Err(JianpuError::ConfigError("envelope attack must not be negative".to_string()));
        }
        if !(0.0..=1.0).contains(&envelope.peak) {
            return Err(JianpuError::ConfigError("envelope peak must be within 0..=1".to_string()));
        }
        if !(0.0..=envelope.peak).contains(&envelope.sustain) {
            return Err(JianpuError::ConfigError(
                "envelope sustain must be within 0..=peak".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&envelope.decay_fraction) {
            return Err(JianpuError::ConfigError(
                "envelope decay-fraction must be within 0..=1".to_string(),
            ));
        }
        if self.output.buffer_size == Some(0) {
            return Err(JianpuError::ConfigError("output buffer-size must be positive".to_string()));
        }
        Ok(())
    }
}
