//! # Sonification Configuration
//!
//! Provides configuration management for the sonification core.
//!
//! ## Overview
//!
//! [`SonificationConfig`] captures the host-facing policy knobs: whether the
//! platform supports audio output at all, the initial master gain and mute
//! state, and per-level enablement and gain. The struct is serde-friendly so
//! hosts can load it from settings storage, and every field has a sensible
//! default so a plain `SonificationConfig::default()` produces an audible,
//! basic-level configuration.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::{SonificationConfig, SonificationLevel};
//!
//! let config = SonificationConfig::default()
//!     .with_master_gain(0.8)
//!     .with_level_enabled(SonificationLevel::Enhanced, true);
//!
//! config.validate().expect("valid configuration");
//! assert!(config.level_enabled(SonificationLevel::Enhanced));
//! ```
//!
//! ## Validation
//!
//! [`SonificationConfig::validate`] rejects out-of-range gains with
//! actionable messages rather than silently clamping; host-supplied settings
//! should be checked once at startup.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification gating which generators are audible under current settings.
///
/// Basic sounds convey core interaction feedback every user hears by
/// default; enhanced sounds add richer detail for users who opt in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SonificationLevel {
    Basic,
    Enhanced,
}

impl SonificationLevel {
    /// Stable lowercase name, used in logs and serialized settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            SonificationLevel::Basic => "basic",
            SonificationLevel::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for SonificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level settings for the sonification core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SonificationConfig {
    /// Whether the host supports audio output at all.
    ///
    /// When `false`, shared players skip constructing their decode pipeline
    /// entirely and expose no-op triggers.
    ///
    /// Default: true.
    #[serde(default = "default_audio_enabled")]
    pub audio_enabled: bool,

    /// Whether output starts unmuted.
    ///
    /// Muting preserves every stored gain; unmuting restores them exactly.
    ///
    /// Default: true.
    #[serde(default = "default_master_enabled")]
    pub master_enabled: bool,

    /// Master gain multiplier applied to every generator (0.0..=1.0).
    ///
    /// Default: 1.0.
    #[serde(default = "default_unity_gain")]
    pub master_gain: f32,

    /// Whether basic-level generators are audible.
    ///
    /// Default: true.
    #[serde(default = "default_basic_enabled")]
    pub basic_enabled: bool,

    /// Gain multiplier for basic-level generators (0.0..=1.0).
    ///
    /// Default: 1.0.
    #[serde(default = "default_unity_gain")]
    pub basic_gain: f32,

    /// Whether enhanced-level generators are audible.
    ///
    /// Enhanced sonification is opt-in, so this starts disabled.
    ///
    /// Default: false.
    #[serde(default = "default_enhanced_enabled")]
    pub enhanced_enabled: bool,

    /// Gain multiplier for enhanced-level generators (0.0..=1.0).
    ///
    /// Default: 1.0.
    #[serde(default = "default_unity_gain")]
    pub enhanced_gain: f32,

    /// Buffer capacity of the event bus channel.
    ///
    /// Default: 100.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for SonificationConfig {
    fn default() -> Self {
        Self {
            audio_enabled: default_audio_enabled(),
            master_enabled: default_master_enabled(),
            master_gain: default_unity_gain(),
            basic_enabled: default_basic_enabled(),
            basic_gain: default_unity_gain(),
            enhanced_enabled: default_enhanced_enabled(),
            enhanced_gain: default_unity_gain(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl SonificationConfig {
    /// Configuration for hosts that run with sound support disabled.
    ///
    /// Shared players built under this configuration never decode.
    pub fn silent() -> Self {
        Self {
            audio_enabled: false,
            master_enabled: false,
            ..Default::default()
        }
    }

    /// Configuration with every level enabled, for full sonification.
    pub fn full() -> Self {
        Self {
            enhanced_enabled: true,
            ..Default::default()
        }
    }

    /// Set the master gain.
    pub fn with_master_gain(mut self, gain: f32) -> Self {
        self.master_gain = gain;
        self
    }

    /// Set the initial mute state.
    pub fn with_master_enabled(mut self, enabled: bool) -> Self {
        self.master_enabled = enabled;
        self
    }

    /// Declare whether the host supports audio output.
    pub fn with_audio_enabled(mut self, enabled: bool) -> Self {
        self.audio_enabled = enabled;
        self
    }

    /// Enable or disable one sonification level.
    pub fn with_level_enabled(mut self, level: SonificationLevel, enabled: bool) -> Self {
        match level {
            SonificationLevel::Basic => self.basic_enabled = enabled,
            SonificationLevel::Enhanced => self.enhanced_enabled = enabled,
        }
        self
    }

    /// Set the gain multiplier for one sonification level.
    pub fn with_level_gain(mut self, level: SonificationLevel, gain: f32) -> Self {
        match level {
            SonificationLevel::Basic => self.basic_gain = gain,
            SonificationLevel::Enhanced => self.enhanced_gain = gain,
        }
        self
    }

    /// Set the event bus buffer capacity.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Whether the given level is enabled.
    pub fn level_enabled(&self, level: SonificationLevel) -> bool {
        match level {
            SonificationLevel::Basic => self.basic_enabled,
            SonificationLevel::Enhanced => self.enhanced_enabled,
        }
    }

    /// Gain multiplier for the given level.
    pub fn level_gain(&self, level: SonificationLevel) -> f32 {
        match level {
            SonificationLevel::Basic => self.basic_gain,
            SonificationLevel::Enhanced => self.enhanced_gain,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        validate_gain("master_gain", self.master_gain)?;
        validate_gain("basic_gain", self.basic_gain)?;
        validate_gain("enhanced_gain", self.enhanced_gain)?;

        if self.event_capacity == 0 {
            return Err(Error::Config(
                "event_capacity must be > 0; the event bus needs room to buffer at least one event"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_gain(name: &str, gain: f32) -> Result<()> {
    if !gain.is_finite() || !(0.0..=1.0).contains(&gain) {
        return Err(Error::Config(format!(
            "{} must be within 0.0..=1.0 (got {})",
            name, gain
        )));
    }
    Ok(())
}

fn default_audio_enabled() -> bool {
    true
}

fn default_master_enabled() -> bool {
    true
}

fn default_unity_gain() -> f32 {
    1.0
}

fn default_basic_enabled() -> bool {
    true
}

fn default_enhanced_enabled() -> bool {
    false
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_BUFFER_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_audible_and_basic_only() {
        let config = SonificationConfig::default();
        assert!(config.audio_enabled);
        assert!(config.master_enabled);
        assert!(config.basic_enabled);
        assert!(!config.enhanced_enabled);
        assert_eq!(config.master_gain, 1.0);
        config.validate().unwrap();
    }

    #[test]
    fn silent_preset_disables_audio_support() {
        let config = SonificationConfig::silent();
        assert!(!config.audio_enabled);
        assert!(!config.master_enabled);
        config.validate().unwrap();
    }

    #[test]
    fn fluent_setters_apply() {
        let config = SonificationConfig::default()
            .with_master_gain(0.5)
            .with_level_enabled(SonificationLevel::Enhanced, true)
            .with_level_gain(SonificationLevel::Basic, 0.8)
            .with_event_capacity(16);

        assert_eq!(config.master_gain, 0.5);
        assert!(config.level_enabled(SonificationLevel::Enhanced));
        assert_eq!(config.level_gain(SonificationLevel::Basic), 0.8);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn out_of_range_gain_is_rejected() {
        let config = SonificationConfig::default().with_master_gain(1.5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("master_gain"));

        let config = SonificationConfig::default().with_level_gain(SonificationLevel::Basic, -0.1);
        assert!(config.validate().is_err());

        let config = SonificationConfig::default().with_master_gain(f32::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let config = SonificationConfig::default().with_event_capacity(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: SonificationConfig = serde_json::from_str("{}").unwrap();
        assert!(config.audio_enabled);
        assert!(!config.enhanced_enabled);
        assert_eq!(config.event_capacity, DEFAULT_EVENT_BUFFER_SIZE);

        let config: SonificationConfig =
            serde_json::from_str(r#"{"master_gain": 0.25, "enhanced_enabled": true}"#).unwrap();
        assert_eq!(config.master_gain, 0.25);
        assert!(config.enhanced_enabled);
    }

    #[test]
    fn level_names_are_stable() {
        assert_eq!(SonificationLevel::Basic.as_str(), "basic");
        assert_eq!(SonificationLevel::Enhanced.to_string(), "enhanced");
        let json = serde_json::to_string(&SonificationLevel::Enhanced).unwrap();
        assert_eq!(json, "\"enhanced\"");
    }
}
