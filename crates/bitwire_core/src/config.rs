//! # Codec Configuration
//!
//! Behaviour switches shared by a writer/reader pair. Both ends of a
//! connection must agree on the diff layout; the read mode is local.
//!
//! ```toml
//! read_mode = "permissive"
//! diff_layout = "interleaved"
//! initial_capacity = 64
//! ```

use serde::{Deserialize, Serialize};

use bitwire_shared::DEFAULT_INITIAL_CAPACITY;

use crate::error::ConfigError;

/// How a reader reacts to input that ends mid-value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// Fail the read with [`CodecError::Truncated`](crate::CodecError::Truncated).
    #[default]
    Strict,
    /// Return zero / zero-filled values and count the failure.
    Permissive,
}

/// Placement of the changed-bitmap inside a diff record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLayout {
    /// Whole bitmap first, then every payload.
    #[default]
    Premap,
    /// Each changed bit directly followed by its payload.
    Interleaved,
}

/// Codec configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Truncated-read policy.
    pub read_mode: ReadMode,
    /// Diff record layout.
    pub diff_layout: DiffLayout,
    /// Initial capacity of internally allocated buffers, in bytes.
    pub initial_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            read_mode: ReadMode::Strict,
            diff_layout: DiffLayout::Premap,
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl CodecConfig {
    /// Parses a configuration from a TOML document.
    ///
    /// Missing keys take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for a zero initial capacity.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `initial_capacity` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::Invalid("initial_capacity must be at least 1"));
        }
        Ok(())
    }

    /// Same configuration with a different read mode.
    #[must_use]
    pub const fn with_read_mode(mut self, read_mode: ReadMode) -> Self {
        self.read_mode = read_mode;
        self
    }

    /// Same configuration with a different diff layout.
    #[must_use]
    pub const fn with_diff_layout(mut self, diff_layout: DiffLayout) -> Self {
        self.diff_layout = diff_layout;
        self
    }
}
