// SPDX-License-Identifier: AGPL-3.0-or-later
//! Auto-Save Scheduler
//!
//! Debounces change notifications into saves. Every notification restarts
//! the timer, so a burst of edits produces one save, `delay` after the last
//! edit. At most one save is in flight; a save that becomes due while
//! another is running waits for it and then sends whatever snapshot is
//! current at that point.

use postcraft_core::Platform;
use postcraft_db::{Post, PostDraft, PostId, PostRepository, PostStatus, StoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoSaveStatus {
    #[default]
    Saved,
    Saving,
    Error,
}

/// Everything a save persists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    pub title: String,
    pub content: String,
    pub raw_content: String,
    pub platforms: BTreeSet<Platform>,
    pub status: PostStatus,
}

impl SaveSnapshot {
    /// Degenerate drafts (no title, no body or no platform) are never
    /// auto-saved
    pub fn is_saveable(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.raw_content.trim().is_empty()
            && !self.platforms.is_empty()
    }

    /// SHA-256 over every persisted field
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [&self.title, &self.content, &self.raw_content] {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        for platform in &self.platforms {
            hasher.update(platform.to_string().as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(self.status.to_string().as_bytes());

        hasher
            .finalize()
            .iter()
            .fold(String::with_capacity(64), |mut hex, byte| {
                let _ = write!(hex, "{byte:02x}");
                hex
            })
    }

    pub fn to_draft(&self, author_id: &str) -> PostDraft {
        PostDraft {
            author_id: author_id.to_string(),
            title: self.title.clone(),
            content: self.content.clone(),
            raw_content: self.raw_content.clone(),
            platforms: self.platforms.clone(),
            status: self.status,
        }
    }
}

/// What a save attempt did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(Post),
    /// Same fingerprint as the last successful save
    Unchanged,
    /// Nothing to save, or the snapshot failed the saveable guard
    Skipped,
}

struct Shared {
    repo: Arc<dyn PostRepository>,
    post_id: PostId,
    author_id: String,
    latest: watch::Sender<Option<SaveSnapshot>>,
    status: watch::Sender<AutoSaveStatus>,
    /// Held for the duration of a save; stores the last saved fingerprint
    gate: Mutex<Option<String>>,
}

impl Shared {
    async fn save_latest(&self) -> StoreResult<SaveOutcome> {
        let mut last_saved = self.gate.lock().await;
        let Some(snapshot) = self.latest.borrow().clone() else {
            return Ok(SaveOutcome::Skipped);
        };
        if !snapshot.is_saveable() {
            debug!(post_id = %self.post_id, "auto-save skipped, title, content or platforms empty");
            return Ok(SaveOutcome::Skipped);
        }
        let fingerprint = snapshot.fingerprint();
        if last_saved.as_deref() == Some(fingerprint.as_str()) {
            debug!(post_id = %self.post_id, "auto-save skipped, nothing changed");
            return Ok(SaveOutcome::Unchanged);
        }
        self.persist(&snapshot, fingerprint, &mut last_saved)
            .await
            .map(SaveOutcome::Saved)
    }

    /// Persist `snapshot` regardless of guard and fingerprint; it becomes
    /// the latest snapshot only once the repository accepts it
    async fn save_exact(&self, snapshot: SaveSnapshot) -> StoreResult<Post> {
        let mut last_saved = self.gate.lock().await;
        let post = self
            .persist(&snapshot, snapshot.fingerprint(), &mut last_saved)
            .await?;
        self.latest.send_replace(Some(snapshot));
        Ok(post)
    }

    async fn persist(
        &self,
        snapshot: &SaveSnapshot,
        fingerprint: String,
        last_saved: &mut Option<String>,
    ) -> StoreResult<Post> {
        self.status.send_replace(AutoSaveStatus::Saving);
        let draft = snapshot.to_draft(&self.author_id);
        match self.repo.save_post(&self.post_id, &draft).await {
            Ok(post) => {
                *last_saved = Some(fingerprint);
                self.status.send_replace(AutoSaveStatus::Saved);
                info!(post_id = %self.post_id, status = %post.status, "post saved");
                Ok(post)
            }
            Err(err) => {
                self.status.send_replace(AutoSaveStatus::Error);
                warn!(post_id = %self.post_id, error = %err, "save failed");
                Err(err)
            }
        }
    }
}

pub struct AutoSaveScheduler {
    shared: Arc<Shared>,
    delay: Duration,
    timer: Option<JoinHandle<()>>,
}

impl AutoSaveScheduler {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        post_id: PostId,
        author_id: impl Into<String>,
        delay: Duration,
    ) -> Self {
        let (latest, _) = watch::channel(None);
        let (status, _) = watch::channel(AutoSaveStatus::Saved);
        Self {
            shared: Arc::new(Shared {
                repo,
                post_id,
                author_id: author_id.into(),
                latest,
                status,
                gate: Mutex::new(None),
            }),
            delay,
            timer: None,
        }
    }

    /// Treat `snapshot` as already persisted, e.g. right after loading it
    pub fn with_baseline(self, snapshot: &SaveSnapshot) -> Self {
        self.shared.latest.send_replace(Some(snapshot.clone()));
        if let Ok(mut last_saved) = self.shared.gate.try_lock() {
            *last_saved = Some(snapshot.fingerprint());
        }
        self
    }

    /// Record a new snapshot and restart the debounce timer
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify_change(&mut self, snapshot: SaveSnapshot) {
        self.shared.latest.send_replace(Some(snapshot));
        self.cancel_timer();

        let shared = Arc::clone(&self.shared);
        let delay = self.delay;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later notification cancelling the timer cannot
            // abort a save that has already started
            tokio::spawn(async move {
                let _ = shared.save_latest().await;
            });
        }));
    }

    /// Save `snapshot` now, bypassing the debounce and the empty-draft guard
    ///
    /// Used for explicit user saves. Waits for any in-flight save first.
    pub async fn save_now(&mut self, snapshot: SaveSnapshot) -> StoreResult<Post> {
        self.cancel_timer();
        self.shared.save_exact(snapshot).await
    }

    /// Cancel the pending timer and save the latest snapshot if it differs
    /// from the last one persisted
    pub async fn flush(&mut self) -> StoreResult<SaveOutcome> {
        self.cancel_timer();
        self.shared.save_latest().await
    }

    pub fn status(&self) -> AutoSaveStatus {
        *self.shared.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutoSaveStatus> {
        self.shared.status.subscribe()
    }

    /// A debounced save is waiting for its timer
    pub fn is_pending(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for AutoSaveScheduler {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use postcraft_db::{InMemoryPostRepository, PostStatus, StoreError};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::{sleep, Instant};

    const DELAY: Duration = Duration::from_millis(3000);

    /// Repository double that records call times and can stall or fail
    #[derive(Default)]
    struct Recording {
        inner: InMemoryPostRepository,
        calls: Mutex<Vec<(Instant, PostDraft)>>,
        latency: Duration,
        failing: AtomicBool,
    }

    impl Recording {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        async fn calls(&self) -> Vec<(Instant, PostDraft)> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl PostRepository for Recording {
        async fn save_post(&self, id: &PostId, draft: &PostDraft) -> StoreResult<Post> {
            self.calls.lock().await.push((Instant::now(), draft.clone()));
            sleep(self.latency).await;
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            self.inner.save_post(id, draft).await
        }

        async fn load_post(&self, id: &PostId) -> StoreResult<Post> {
            self.inner.load_post(id).await
        }

        async fn list_posts(
            &self,
            author_id: &str,
            status: Option<PostStatus>,
        ) -> StoreResult<Vec<Post>> {
            self.inner.list_posts(author_id, status).await
        }

        async fn delete_post(&self, id: &PostId) -> StoreResult<Post> {
            self.inner.delete_post(id).await
        }
    }

    fn snapshot(title: &str) -> SaveSnapshot {
        SaveSnapshot {
            title: title.into(),
            content: format!("<p>{title}</p>"),
            raw_content: title.into(),
            platforms: [Platform::Twitter].into_iter().collect(),
            status: PostStatus::Draft,
        }
    }

    fn scheduler(repo: &Arc<Recording>) -> AutoSaveScheduler {
        AutoSaveScheduler::new(repo.clone(), PostId::new(), "user-1", DELAY)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_save_after_last_edit() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);
        let start = Instant::now();

        scheduler.notify_change(snapshot("v1"));
        sleep(Duration::from_millis(500)).await;
        scheduler.notify_change(snapshot("v2"));
        sleep(Duration::from_millis(500)).await;
        scheduler.notify_change(snapshot("v3"));

        sleep(Duration::from_millis(2999)).await;
        assert!(repo.calls().await.is_empty());

        sleep(Duration::from_millis(2)).await;
        let calls = repo.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0 - start >= Duration::from_millis(4000));
        assert_eq!(calls[0].1.title, "v3");
        assert_eq!(scheduler.status(), AutoSaveStatus::Saved);

        // no further notification, no further save
        sleep(Duration::from_secs(60)).await;
        assert_eq!(repo.calls().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_calls_200ms_apart() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);

        for title in ["a", "b", "c"] {
            scheduler.notify_change(snapshot(title));
            sleep(Duration::from_millis(200)).await;
        }
        // third call happened 200ms ago
        sleep(Duration::from_millis(2799)).await;
        assert!(repo.calls().await.is_empty());
        assert!(scheduler.is_pending());

        sleep(Duration::from_millis(2)).await;
        let calls = repo.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.title, "c");
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_skips_empty_title_content_or_platforms() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);

        scheduler.notify_change(snapshot(""));
        sleep(DELAY * 2).await;

        let mut no_body = snapshot("Title");
        no_body.raw_content.clear();
        scheduler.notify_change(no_body);
        sleep(DELAY * 2).await;

        let mut no_platform = snapshot("Title");
        no_platform.platforms.clear();
        scheduler.notify_change(no_platform);
        sleep(DELAY * 2).await;

        assert!(repo.calls().await.is_empty());
        assert_eq!(scheduler.flush().await, Ok(SaveOutcome::Skipped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_flight_with_follow_up_reading_latest() {
        let repo = Arc::new(Recording::with_latency(Duration::from_millis(5000)));
        let mut scheduler = scheduler(&repo);
        let mut status = scheduler.subscribe();

        scheduler.notify_change(snapshot("first"));
        sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(*status.borrow_and_update(), AutoSaveStatus::Saving);

        // edit while the first save is still in flight
        scheduler.notify_change(snapshot("second"));
        sleep(DELAY).await;
        assert_eq!(repo.calls().await.len(), 1);

        scheduler.notify_change(snapshot("third"));
        sleep(Duration::from_secs(20)).await;

        let titles: Vec<_> = repo
            .calls()
            .await
            .into_iter()
            .map(|(_, draft)| draft.title)
            .collect();
        assert_eq!(titles, vec!["first", "third"]);
        assert_eq!(scheduler.status(), AutoSaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_error_and_next_edit_retries() {
        let repo = Arc::new(Recording::default());
        repo.failing.store(true, Ordering::SeqCst);
        let mut scheduler = scheduler(&repo);

        scheduler.notify_change(snapshot("draft"));
        sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(scheduler.status(), AutoSaveStatus::Error);

        // no automatic retry
        sleep(DELAY * 3).await;
        assert_eq!(repo.calls().await.len(), 1);

        repo.failing.store(false, Ordering::SeqCst);
        scheduler.notify_change(snapshot("draft"));
        sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(repo.calls().await.len(), 2);
        assert_eq!(scheduler.status(), AutoSaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_snapshot_not_resent() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);

        scheduler.notify_change(snapshot("same"));
        sleep(DELAY + Duration::from_millis(1)).await;
        scheduler.notify_change(snapshot("same"));
        sleep(DELAY + Duration::from_millis(1)).await;

        assert_eq!(repo.calls().await.len(), 1);
        assert_eq!(scheduler.flush().await, Ok(SaveOutcome::Unchanged));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_saves_pending_change_immediately() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);

        scheduler.notify_change(snapshot("pending"));
        let outcome = scheduler.flush().await.unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved(ref post) if post.title == "pending"));
        assert!(!scheduler.is_pending());

        // the cancelled timer never fires
        sleep(DELAY * 2).await;
        assert_eq!(repo.calls().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_now_is_not_flushed_later() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);

        scheduler.notify_change(snapshot("draft"));
        sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(repo.calls().await.len(), 1);

        repo.failing.store(true, Ordering::SeqCst);
        let mut published = snapshot("draft");
        published.status = PostStatus::Published;
        assert!(scheduler.save_now(published).await.is_err());
        assert_eq!(scheduler.status(), AutoSaveStatus::Error);

        // the draft already saved is still the latest snapshot
        repo.failing.store(false, Ordering::SeqCst);
        assert_eq!(scheduler.flush().await, Ok(SaveOutcome::Unchanged));
        assert_eq!(repo.calls().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_success_becomes_baseline() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);

        let post = scheduler.save_now(snapshot("explicit")).await.unwrap();
        assert_eq!(post.title, "explicit");
        assert_eq!(scheduler.flush().await, Ok(SaveOutcome::Unchanged));
        assert_eq!(repo.calls().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_is_not_saved_again() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo).with_baseline(&snapshot("loaded"));
        assert_eq!(scheduler.flush().await, Ok(SaveOutcome::Unchanged));
        assert!(repo.calls().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let repo = Arc::new(Recording::default());
        let mut scheduler = scheduler(&repo);
        scheduler.notify_change(snapshot("gone"));
        drop(scheduler);

        sleep(DELAY * 2).await;
        assert!(repo.calls().await.is_empty());
    }

    #[test]
    fn test_fingerprint_covers_platforms_and_status() {
        let base = snapshot("t");
        let mut more_platforms = base.clone();
        more_platforms.platforms.insert(Platform::LinkedIn);
        let mut published = base.clone();
        published.status = PostStatus::Published;

        assert_eq!(base.fingerprint(), snapshot("t").fingerprint());
        assert_eq!(base.fingerprint().len(), 64);
        assert_ne!(base.fingerprint(), more_platforms.fingerprint());
        assert_ne!(base.fingerprint(), published.fingerprint());
    }
}
