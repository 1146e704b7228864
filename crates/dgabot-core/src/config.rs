//! Encoding configuration shared by the encoder and the classifier.
//!
//! The values mirror the preprocessing used when the model was trained and
//! must not drift from it: a model trained on 100-wide rows with `-1`
//! sentinels will silently produce garbage on anything else.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Encoded width used by the published DGA model.
pub const DEFAULT_MAX_LEN: usize = 100;

/// Sentinel written into unused positions.
pub const DEFAULT_PAD_VALUE: i64 = -1;

/// Highest ordinal accepted by the `reject` and `clamp` policies (ASCII).
pub const DEFAULT_MAX_ORDINAL: u32 = 127;

/// Which end of a sequence padding is added to, or truncation removes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Pre,
    Post,
}

/// Handling of characters whose ordinal exceeds `max_ordinal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalPolicy {
    /// Emit the raw code point.
    PassThrough,
    /// Fail with [`EncodeError::Unrepresentable`](crate::EncodeError).
    Reject,
    /// Replace with `max_ordinal`.
    Clamp,
}

/// Preprocessing contract between raw domain strings and model input rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub max_len: usize,
    pub pad_value: i64,
    /// Where sentinels go for short domains. `post` keeps the domain at the
    /// start of the row.
    pub padding: Side,
    /// Which end is dropped for long domains. `pre` keeps the last
    /// `max_len` characters, so the TLD survives.
    pub truncating: Side,
    pub ordinals: OrdinalPolicy,
    pub max_ordinal: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            pad_value: DEFAULT_PAD_VALUE,
            padding: Side::Post,
            truncating: Side::Pre,
            ordinals: OrdinalPolicy::PassThrough,
            max_ordinal: DEFAULT_MAX_ORDINAL,
        }
    }
}

impl EncodingConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(path = %path.display(), max_len = config.max_len, "loaded encoding config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_len == 0 {
            return Err(ConfigError::InvalidMaxLen);
        }
        Ok(())
    }
}
