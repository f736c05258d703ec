// SPDX-License-Identifier: AGPL-3.0-or-later
//! Platform Constraint Tracker
//!
//! Character budgets per target platform. Exceeding a budget is advisory;
//! only an empty platform selection blocks saving.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

pub const TWITTER_CHAR_LIMIT: usize = 280;
pub const LINKEDIN_CHAR_LIMIT: usize = 3000;

/// Characters between the title and the body in a published post
const TITLE_SEPARATOR_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Twitter,
    #[serde(rename = "LINKEDIN")]
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Twitter, Platform::LinkedIn];

    pub fn limit(&self) -> usize {
        match self {
            Platform::Twitter => TWITTER_CHAR_LIMIT,
            Platform::LinkedIn => LINKEDIN_CHAR_LIMIT,
        }
    }

    /// Case-insensitive name lookup (`twitter`, `LINKEDIN`, ...)
    pub fn parse(name: &str) -> Option<Platform> {
        match name.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Some(Platform::Twitter),
            "linkedin" => Some(Platform::LinkedIn),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Twitter => write!(f, "TWITTER"),
            Platform::LinkedIn => write!(f, "LINKEDIN"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConstraint {
    pub limit: usize,
    pub current_length: usize,
    pub is_over_limit: bool,
}

impl PlatformConstraint {
    pub fn new(platform: Platform, current_length: usize) -> Self {
        let limit = platform.limit();
        Self {
            limit,
            current_length,
            is_over_limit: current_length > limit,
        }
    }

    /// Characters left before the limit; zero when over
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.current_length)
    }
}

/// Budget status for every selected platform
pub fn evaluate<'a, I>(length: usize, platforms: I) -> BTreeMap<Platform, PlatformConstraint>
where
    I: IntoIterator<Item = &'a Platform>,
{
    platforms
        .into_iter()
        .map(|platform| (*platform, PlatformConstraint::new(*platform, length)))
        .collect()
}

/// Length of a post as published: title, separator, then the body
pub fn combined_length(title: &str, body_length: usize) -> usize {
    let title = title.trim();
    if title.is_empty() {
        body_length
    } else {
        title.graphemes(true).count() + TITLE_SEPARATOR_LEN + body_length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least one platform")]
    NoPlatformsSelected,

    #[error("Title is required")]
    EmptyTitle,

    #[error("Content is required")]
    EmptyContent,
}

pub fn validate_platforms<'a, I>(platforms: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a Platform>,
{
    if platforms.into_iter().next().is_none() {
        return Err(ValidationError::NoPlatformsSelected);
    }
    Ok(())
}

/// Gate for explicit saves: platforms first, then title and body
pub fn validate_submission<'a, I>(
    title: &str,
    body_is_empty: bool,
    platforms: I,
) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a Platform>,
{
    validate_platforms(platforms)?;
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if body_is_empty {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}
