// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Factory configuration.
//!
//! Defaults live in the `DEFAULT_*` constants. With the `config-file`
//! feature a [`DynAnyConfig`] can also be read from TOML:
//!
//! ```toml
//! max_decode_depth = 32
//! max_collection_length = 65536
//! default_sequence_length = 0
//! ```

use crate::cdr::DecodeLimits;
#[cfg(feature = "config-file")]
use std::path::Path;
use thiserror::Error;

/// Default maximum nesting accepted when decoding an encoding.
pub const DEFAULT_MAX_DECODE_DEPTH: usize = 64;

/// Default maximum element count of a decoded sequence.
pub const DEFAULT_MAX_COLLECTION_LENGTH: usize = 1 << 20;

/// Default initial length of sequences created from a type alone.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-file")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Limits and defaults applied by a factory and every value it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
pub struct DynAnyConfig {
    /// Maximum nesting accepted when decoding an encoding.
    #[cfg_attr(feature = "config-file", serde(default = "default_max_decode_depth"))]
    pub max_decode_depth: usize,

    /// Maximum element count of a decoded sequence.
    #[cfg_attr(
        feature = "config-file",
        serde(default = "default_max_collection_length")
    )]
    pub max_collection_length: usize,

    /// Initial length of sequences created from a type alone.
    #[cfg_attr(feature = "config-file", serde(default))]
    pub default_sequence_length: usize,
}

#[cfg(feature = "config-file")]
fn default_max_decode_depth() -> usize {
    DEFAULT_MAX_DECODE_DEPTH
}

#[cfg(feature = "config-file")]
fn default_max_collection_length() -> usize {
    DEFAULT_MAX_COLLECTION_LENGTH
}

impl Default for DynAnyConfig {
    fn default() -> Self {
        Self {
            max_decode_depth: DEFAULT_MAX_DECODE_DEPTH,
            max_collection_length: DEFAULT_MAX_COLLECTION_LENGTH,
            default_sequence_length: DEFAULT_SEQUENCE_LENGTH,
        }
    }
}

impl DynAnyConfig {
    /// Load configuration from a TOML file.
    #[cfg(feature = "config-file")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_decode_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_decode_depth must be at least 1".into(),
            ));
        }
        if self.max_collection_length == 0 {
            return Err(ConfigError::Invalid(
                "max_collection_length must be at least 1".into(),
            ));
        }
        if self.default_sequence_length > self.max_collection_length {
            return Err(ConfigError::Invalid(format!(
                "default_sequence_length {} exceeds max_collection_length {}",
                self.default_sequence_length, self.max_collection_length
            )));
        }
        Ok(())
    }

    /// Decoder limits derived from this configuration.
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_depth: self.max_decode_depth,
            max_collection_length: self.max_collection_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DynAnyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decode_limits(), DecodeLimits::default());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = DynAnyConfig {
            max_decode_depth: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = DynAnyConfig {
            max_collection_length: 4,
            default_sequence_length: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml_fills_defaults() {
        let config = DynAnyConfig::from_toml_str("max_decode_depth = 8\n").expect("parse");
        assert_eq!(config.max_decode_depth, 8);
        assert_eq!(config.max_collection_length, DEFAULT_MAX_COLLECTION_LENGTH);
        assert_eq!(config.default_sequence_length, 0);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "max_collection_length = 16").expect("write");
        writeln!(file, "default_sequence_length = 2").expect("write");
        let config = DynAnyConfig::from_file(file.path()).expect("load");
        assert_eq!(config.max_collection_length, 16);
        assert_eq!(config.default_sequence_length, 2);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(matches!(
            DynAnyConfig::from_toml_str("max_decode_depth = 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DynAnyConfig::from_toml_str("max_decode_depth = \"deep\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }
}
