#![forbid(unsafe_code)]

//! Popover configuration.
//!
//! [`PopoverConfig`] carries everything a popover needs besides its activator
//! and children. With the `config` feature it can be loaded from TOML or JSON:
//!
//! ```toml
//! settle_duration_ms = 250
//! prevent_autofocus = true
//!
//! [preferences]
//! preferred_position = "above"
//! preferred_alignment = "left"
//! ```
//!
//! ```rust,ignore
//! let config = PopoverConfig::from_toml_file("popover.toml")?;
//! ```

#[cfg(feature = "config")]
use std::path::Path;
use std::time::Duration;

use crate::popover::placement::PlacementPreferences;
use crate::popover::transition::DEFAULT_SETTLE;

/// Upper bound accepted by [`PopoverConfig::validate`].
pub const MAX_SETTLE: Duration = Duration::from_secs(10);

/// Popover configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PopoverConfig {
    /// How long entering and exiting take to settle.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "settle_duration_ms", with = "duration_ms")
    )]
    pub settle_duration: Duration,

    /// Skip autofocus when the panel settles open.
    pub prevent_autofocus: bool,

    /// Wrap plain children in a sectioned pane.
    pub sectioned: bool,

    /// Placement preferences forwarded to the geometry provider.
    pub preferences: PlacementPreferences,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            settle_duration: DEFAULT_SETTLE,
            prevent_autofocus: false,
            sectioned: false,
            preferences: PlacementPreferences::default(),
        }
    }
}

impl PopoverConfig {
    /// Set the settle duration.
    #[must_use]
    pub fn settle_duration(mut self, duration: Duration) -> Self {
        self.settle_duration = duration;
        self
    }

    /// Suppress autofocus.
    #[must_use]
    pub fn prevent_autofocus(mut self, prevent: bool) -> Self {
        self.prevent_autofocus = prevent;
        self
    }

    /// Set the sectioned flag.
    #[must_use]
    pub fn sectioned(mut self, sectioned: bool) -> Self {
        self.sectioned = sectioned;
        self
    }

    /// Set placement preferences.
    #[must_use]
    pub fn preferences(mut self, preferences: PlacementPreferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Validate parameters. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.settle_duration > MAX_SETTLE {
            errors.push(format!(
                "settle_duration must be at most {}ms, got {}ms",
                MAX_SETTLE.as_millis(),
                self.settle_duration.as_millis()
            ));
        }
        errors
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing wrong.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load from a TOML string. The result is validated.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(s)?.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string. The result is validated.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(s)?.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to TOML.
    #[cfg(feature = "config")]
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)
    }
}

/// Errors from loading a [`PopoverConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// TOML serialize error.
    #[cfg(feature = "config")]
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[source] toml::ser::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(feature = "serde")]
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
