// SPDX-License-Identifier: AGPL-3.0-or-later
//! Post aggregate
//!
//! A post is created as a draft on its first save and may later be
//! published. Publishing is one-way.

use chrono::{DateTime, Utc};
use postcraft_core::Platform;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Digits of the creation timestamp appended to a slug
const SLUG_SUFFIX_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for PostId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "DRAFT"),
            PostStatus::Published => write!(f, "PUBLISHED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PostError {
    #[error("cannot move a post from {from} back to {to}")]
    InvalidTransition { from: PostStatus, to: PostStatus },
}

/// The payload of a save: everything the editor owns about a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    /// Acting user; only read when the post is created
    pub author_id: String,
    pub title: String,
    /// Render form (HTML)
    pub content: String,
    /// Markup form
    pub raw_content: String,
    pub platforms: BTreeSet<Platform>,
    pub status: PostStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub raw_content: String,
    pub platforms: BTreeSet<Platform>,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Create a post from its first save
    pub fn create(id: PostId, draft: &PostDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            author_id: draft.author_id.clone(),
            slug: slugify(&draft.title, now),
            title: draft.title.clone(),
            content: draft.content.clone(),
            raw_content: draft.raw_content.clone(),
            platforms: draft.platforms.clone(),
            status: draft.status,
            created_at: now,
            updated_at: now,
            published_at: (draft.status == PostStatus::Published).then_some(now),
        }
    }

    /// Overwrite the editable fields from a later save
    ///
    /// A published post never returns to draft. The author and slug are
    /// fixed at creation.
    pub fn apply(&mut self, draft: &PostDraft, now: DateTime<Utc>) -> Result<(), PostError> {
        if self.status == PostStatus::Published && draft.status == PostStatus::Draft {
            return Err(PostError::InvalidTransition {
                from: self.status,
                to: draft.status,
            });
        }

        self.title.clone_from(&draft.title);
        self.content.clone_from(&draft.content);
        self.raw_content.clone_from(&draft.raw_content);
        self.platforms.clone_from(&draft.platforms);
        self.status = draft.status;
        self.updated_at = now;
        if self.status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
        }
        Ok(())
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// The save payload that would reproduce this post's editable state
    pub fn to_draft(&self) -> PostDraft {
        PostDraft {
            author_id: self.author_id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            raw_content: self.raw_content.clone(),
            platforms: self.platforms.clone(),
            status: self.status,
        }
    }
}

/// `My First Post!` at millis 1700000123456 becomes `my-first-post-123456`
fn slugify(title: &str, now: DateTime<Utc>) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    let millis = now.timestamp_millis().unsigned_abs().to_string();
    let suffix = &millis[millis.len().saturating_sub(SLUG_SUFFIX_DIGITS)..];
    if slug.is_empty() {
        suffix.to_string()
    } else {
        format!("{slug}-{suffix}")
    }
}
