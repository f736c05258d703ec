// SPDX-License-Identifier: AGPL-3.0-or-later
//! Post repository port
//!
//! The contract the session and the auto-save scheduler persist through.
//! Implementations decide where posts live.

use crate::post::{Post, PostDraft, PostError, PostId, PostStatus};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("post {0} not found")]
    NotFound(PostId),

    #[error("post {0} has been deleted")]
    Deleted(PostId),

    #[error(transparent)]
    Rejected(#[from] PostError),

    /// Network or storage failure
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// The id does not resolve to a live post
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Deleted(_))
    }

    /// Failures worth trying again on a later save
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Repository port for Post persistence.
///
/// Implementations must ensure:
/// - The first save of an unknown id creates the post
/// - A deleted id never comes back
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create or update a post.
    ///
    /// # Errors
    ///
    /// - `Deleted` if the post was deleted
    /// - `Rejected` if the draft would unpublish a published post
    /// - `Unavailable` on storage failure
    async fn save_post(&self, id: &PostId, draft: &PostDraft) -> StoreResult<Post>;

    /// Load a post by id.
    async fn load_post(&self, id: &PostId) -> StoreResult<Post>;

    /// Posts by one author, newest first, optionally filtered by status.
    async fn list_posts(&self, author_id: &str, status: Option<PostStatus>)
        -> StoreResult<Vec<Post>>;

    /// Delete a post, returning its last state.
    async fn delete_post(&self, id: &PostId) -> StoreResult<Post>;
}
