// SPDX-License-Identifier: AGPL-3.0-or-later
//! Text-transform port
//!
//! Rewrites a post's raw markup for one platform in a chosen tone. The
//! backing service may be slow or unavailable, so callers treat it as
//! fallible.

use async_trait::async_trait;
use postcraft_core::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Witty,
}

impl Tone {
    pub const ALL: [Tone; 3] = [Tone::Professional, Tone::Casual, Tone::Witty];

    pub fn parse(name: &str) -> Option<Tone> {
        match name.trim().to_ascii_lowercase().as_str() {
            "professional" => Some(Tone::Professional),
            "casual" => Some(Tone::Casual),
            "witty" => Some(Tone::Witty),
            _ => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tone::Professional => write!(f, "professional"),
            Tone::Casual => write!(f, "casual"),
            Tone::Witty => write!(f, "witty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    pub platform: Platform,
    #[serde(default)]
    pub tone: Tone,
}

impl TransformOptions {
    pub fn new(platform: Platform, tone: Tone) -> Self {
        Self { platform, tone }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("transform service unavailable: {0}")]
    Unavailable(String),

    #[error("transform for {platform} timed out after {millis} ms")]
    TimedOut { platform: Platform, millis: u64 },

    #[error("nothing to transform")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, TransformError>;

#[async_trait]
pub trait TextTransform: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn transform(&self, raw: &str, options: TransformOptions) -> Result<String>;
}
