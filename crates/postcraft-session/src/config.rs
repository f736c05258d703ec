// SPDX-License-Identifier: AGPL-3.0-or-later
//! Session configuration
//!
//! Loaded from TOML. Every field is optional; missing values take the
//! defaults below.
//!
//! ```toml
//! autosave_delay_ms = 3000
//! history_limit = 100
//! transform_timeout_ms = 10000
//!
//! [parse]
//! strict = true
//!
//! [markup]
//! em_delimiter = "_"
//! bullet_list_marker = "-"
//! ```

use postcraft_core::history::DEFAULT_HISTORY_LIMIT;
use postcraft_core::{MarkupOptions, ParseConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 3000;
pub const DEFAULT_TRANSFORM_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("autosave_delay_ms must be greater than zero")]
    ZeroDelay,

    #[error("history_limit must be greater than zero")]
    ZeroHistoryLimit,

    #[error("transform_timeout_ms must be greater than zero")]
    ZeroTransformTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Quiet period after the last edit before an auto-save fires
    pub autosave_delay_ms: u64,
    /// Undo levels kept per session
    pub history_limit: usize,
    /// Upper bound on one text-transform call
    pub transform_timeout_ms: u64,
    pub parse: ParseConfig,
    pub markup: MarkupOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            transform_timeout_ms: DEFAULT_TRANSFORM_TIMEOUT_MS,
            parse: ParseConfig::default(),
            markup: MarkupOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.autosave_delay_ms == 0 {
            return Err(ConfigError::ZeroDelay);
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        if self.transform_timeout_ms == 0 {
            return Err(ConfigError::ZeroTransformTimeout);
        }
        Ok(())
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn transform_timeout(&self) -> Duration {
        Duration::from_millis(self.transform_timeout_ms)
    }
}
