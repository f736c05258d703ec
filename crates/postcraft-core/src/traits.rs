// SPDX-License-Identifier: AGPL-3.0-or-later
//! Parser and renderer traits shared by the format handlers

use crate::ast::{Document, SourceFormat};
use crate::markup::MarkupOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default upper bound on the size of a document accepted for parsing
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Errors raised while converting between formats
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("parse error{}: {message}", .offset.map(|o| format!(" at byte {o}")).unwrap_or_default())]
    ParseError {
        message: String,
        offset: Option<usize>,
    },

    #[error("input of {size} bytes exceeds the {limit} byte limit")]
    InputTooLarge { size: usize, limit: usize },
}

impl ConversionError {
    pub fn parse(message: impl Into<String>, offset: Option<usize>) -> Self {
        ConversionError::ParseError {
            message: message.into(),
            offset,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;

/// Parsing knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Reject structurally broken input instead of repairing it
    pub strict: bool,
    pub max_input_bytes: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            strict: true,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl ParseConfig {
    /// Lenient parsing: unbalanced tags are repaired rather than rejected
    pub fn lenient() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    pub(crate) fn check_size(&self, input: &str) -> Result<()> {
        if input.len() > self.max_input_bytes {
            return Err(ConversionError::InputTooLarge {
                size: input.len(),
                limit: self.max_input_bytes,
            });
        }
        Ok(())
    }
}

/// Rendering knobs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub markup: MarkupOptions,
}

pub trait Parser {
    fn format(&self) -> SourceFormat;

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Document>;
}

pub trait Renderer {
    fn format(&self) -> SourceFormat;

    fn render(&self, doc: &Document, config: &RenderConfig) -> Result<String>;
}
