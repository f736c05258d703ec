// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory post repository
//!
//! Keeps posts in a map behind an async `RwLock`. Suitable for tests and
//! for the preview binary. Nothing survives a restart.

use crate::post::{Post, PostDraft, PostId, PostStatus};
use crate::repository::{PostRepository, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug)]
struct Stored {
    post: Post,
    /// Insertion order, breaks ties between equal creation times
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    posts: HashMap<PostId, Stored>,
    tombstones: HashSet<PostId>,
    next_seq: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    state: RwLock<State>,
    save_calls: AtomicUsize,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save_post` calls received, successful or not
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.posts.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.posts.is_empty()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn save_post(&self, id: &PostId, draft: &PostDraft) -> StoreResult<Post> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let mut state = self.state.write().await;

        if state.tombstones.contains(id) {
            return Err(StoreError::Deleted(*id));
        }

        if let Some(stored) = state.posts.get_mut(id) {
            stored.post.apply(draft, now)?;
            debug!(post_id = %id, status = %stored.post.status, "post updated");
            return Ok(stored.post.clone());
        }

        let post = Post::create(*id, draft, now);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.posts.insert(
            *id,
            Stored {
                post: post.clone(),
                seq,
            },
        );
        info!(post_id = %id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn load_post(&self, id: &PostId) -> StoreResult<Post> {
        let state = self.state.read().await;
        match state.posts.get(id) {
            Some(stored) => Ok(stored.post.clone()),
            None if state.tombstones.contains(id) => Err(StoreError::Deleted(*id)),
            None => Err(StoreError::NotFound(*id)),
        }
    }

    async fn list_posts(
        &self,
        author_id: &str,
        status: Option<PostStatus>,
    ) -> StoreResult<Vec<Post>> {
        let state = self.state.read().await;
        let mut matching: Vec<&Stored> = state
            .posts
            .values()
            .filter(|stored| stored.post.author_id == author_id)
            .filter(|stored| status.map_or(true, |status| stored.post.status == status))
            .collect();
        matching.sort_by_key(|stored| Reverse((stored.post.created_at, stored.seq)));
        Ok(matching.into_iter().map(|stored| stored.post.clone()).collect())
    }

    async fn delete_post(&self, id: &PostId) -> StoreResult<Post> {
        let mut state = self.state.write().await;
        if state.tombstones.contains(id) {
            return Err(StoreError::Deleted(*id));
        }
        let stored = state.posts.remove(id).ok_or(StoreError::NotFound(*id))?;
        state.tombstones.insert(*id);
        info!(post_id = %id, "post deleted");
        Ok(stored.post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::PostError;
    use postcraft_core::Platform;
    use pretty_assertions::assert_eq;

    fn draft(author: &str, title: &str) -> PostDraft {
        PostDraft {
            author_id: author.into(),
            title: title.into(),
            content: format!("<p>{title}</p>"),
            raw_content: title.into(),
            platforms: [Platform::LinkedIn].into_iter().collect(),
            status: PostStatus::Draft,
        }
    }

    #[tokio::test]
    async fn test_first_save_creates() {
        let repo = InMemoryPostRepository::new();
        let id = PostId::new();
        assert_eq!(repo.load_post(&id).await, Err(StoreError::NotFound(id)));

        let created = repo.save_post(&id, &draft("u1", "First")).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(repo.load_post(&id).await.unwrap(), created);
        assert_eq!(repo.save_calls(), 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_later_save_updates() {
        let repo = InMemoryPostRepository::new();
        let id = PostId::new();
        let created = repo.save_post(&id, &draft("u1", "First")).await.unwrap();
        let updated = repo.save_post(&id, &draft("u1", "Second")).await.unwrap();
        assert_eq!(updated.title, "Second");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.slug, created.slug);
    }

    #[tokio::test]
    async fn test_unpublish_rejected() {
        let repo = InMemoryPostRepository::new();
        let id = PostId::new();
        let mut published = draft("u1", "Live");
        published.status = PostStatus::Published;
        repo.save_post(&id, &published).await.unwrap();

        let err = repo.save_post(&id, &draft("u1", "Live")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(PostError::InvalidTransition { .. })
        ));
        assert!(repo.load_post(&id).await.unwrap().is_published());
    }

    #[tokio::test]
    async fn test_delete_is_terminal() {
        let repo = InMemoryPostRepository::new();
        let id = PostId::new();
        repo.save_post(&id, &draft("u1", "Doomed")).await.unwrap();

        let deleted = repo.delete_post(&id).await.unwrap();
        assert_eq!(deleted.title, "Doomed");
        assert_eq!(repo.load_post(&id).await, Err(StoreError::Deleted(id)));
        assert_eq!(
            repo.save_post(&id, &draft("u1", "Back")).await,
            Err(StoreError::Deleted(id))
        );
        assert_eq!(repo.delete_post(&id).await, Err(StoreError::Deleted(id)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_newest_first_by_author_and_status() {
        let repo = InMemoryPostRepository::new();
        let first = PostId::new();
        let second = PostId::new();
        let third = PostId::new();
        repo.save_post(&first, &draft("u1", "one")).await.unwrap();
        repo.save_post(&second, &draft("u1", "two")).await.unwrap();
        repo.save_post(&third, &draft("u2", "other")).await.unwrap();

        let mut publish = draft("u1", "two");
        publish.status = PostStatus::Published;
        repo.save_post(&second, &publish).await.unwrap();

        let titles: Vec<_> = repo
            .list_posts("u1", None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["two", "one"]);

        let drafts = repo.list_posts("u1", Some(PostStatus::Draft)).await.unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].id, first);
    }

    #[test]
    fn test_store_error_classes() {
        let id = PostId::new();
        assert!(StoreError::Deleted(id).is_not_found());
        assert!(StoreError::Unavailable("timeout".into()).is_transient());
        assert!(!StoreError::NotFound(id).is_transient());
    }
}
