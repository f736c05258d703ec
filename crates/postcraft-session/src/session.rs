// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editor session
//!
//! Owns one post's editing state: the editing surface, the title and
//! platform selection, and the auto-save scheduler. Every mutation returns
//! the complete observable state as a [`SessionView`].

use crate::autosave::{AutoSaveScheduler, AutoSaveStatus, SaveOutcome, SaveSnapshot};
use crate::config::SessionConfig;
use postcraft_core::model::DocumentModel;
use postcraft_core::platform::{self, ValidationError};
use postcraft_core::{EditingSurface, EditorCommand, MarkupConverter, Platform, PlatformConstraint};
use postcraft_db::{Post, PostId, PostRepository, PostStatus, StoreError};
use postcraft_pipeline::{TextTransform, Tone, TransformError, TransformOptions};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Everything a UI needs to draw the editor after a change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub post_id: PostId,
    pub title: String,
    pub status: PostStatus,
    pub platforms: BTreeSet<Platform>,
    pub render_form: String,
    pub markup_form: String,
    pub plain_text_length: usize,
    pub platform_constraints: BTreeMap<Platform, PlatformConstraint>,
    pub auto_save_status: AutoSaveStatus,
    pub processed_content: BTreeMap<Platform, String>,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct EditorSession {
    post_id: PostId,
    title: String,
    platforms: BTreeSet<Platform>,
    status: PostStatus,
    surface: EditingSurface,
    scheduler: AutoSaveScheduler,
    processed: BTreeMap<Platform, String>,
    config: SessionConfig,
}

impl EditorSession {
    /// Open a session on `post_id`, starting empty when the post does not
    /// exist yet
    pub async fn open(
        repo: Arc<dyn PostRepository>,
        post_id: PostId,
        author_id: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let author_id = author_id.into();
        let existing = match repo.load_post(&post_id).await {
            Ok(post) => Some(post),
            Err(StoreError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        let mut model = DocumentModel::with_history_limit(config.history_limit);
        let (title, platforms, status) = match &existing {
            Some(post) => {
                let source = if post.content.trim().is_empty() {
                    &post.raw_content
                } else {
                    &post.content
                };
                model.load_from(source, &config.parse);
                (post.title.clone(), post.platforms.clone(), post.status)
            }
            None => (String::new(), BTreeSet::new(), PostStatus::Draft),
        };
        let surface = EditingSurface::new(model, MarkupConverter::new(config.markup.clone()));

        let scheduler = AutoSaveScheduler::new(repo, post_id, author_id, config.autosave_delay());
        let mut session = Self {
            post_id,
            title,
            platforms,
            status,
            surface,
            scheduler,
            processed: BTreeMap::new(),
            config,
        };
        if existing.is_some() {
            let baseline = session.snapshot(session.status);
            session.scheduler = session.scheduler.with_baseline(&baseline);
        }
        info!(post_id = %post_id, existing = existing.is_some(), "session opened");
        Ok(session)
    }

    /// Apply an editor command
    ///
    /// Schedules a save when either persisted form changed; the markup form
    /// drops trailing whitespace and empty blocks that the render form keeps.
    pub fn apply(&mut self, command: &EditorCommand) -> SessionView {
        let before = self.surface.output().clone();
        let output = self.surface.on_command(command);
        if output.render_form != before.render_form || output.markup_form != before.markup_form {
            self.notify();
        }
        self.view()
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> SessionView {
        let title = title.into();
        if title != self.title {
            self.title = title;
            self.notify();
        }
        self.view()
    }

    pub fn toggle_platform(&mut self, platform: Platform) -> SessionView {
        if !self.platforms.remove(&platform) {
            self.platforms.insert(platform);
        }
        debug!(post_id = %self.post_id, %platform, selected = self.platforms.contains(&platform), "platform toggled");
        self.notify();
        self.view()
    }

    pub fn view(&self) -> SessionView {
        let output = self.surface.output();
        let length = platform::combined_length(&self.title, output.plain_text_length);
        let model = self.surface.model();
        SessionView {
            post_id: self.post_id,
            title: self.title.clone(),
            status: self.status,
            platforms: self.platforms.clone(),
            render_form: output.render_form.clone(),
            markup_form: output.markup_form.clone(),
            plain_text_length: output.plain_text_length,
            platform_constraints: platform::evaluate(length, &self.platforms),
            auto_save_status: self.scheduler.status(),
            processed_content: self.processed.clone(),
            can_undo: model.can_undo(),
            can_redo: model.can_redo(),
        }
    }

    /// Explicit "Save Draft"
    ///
    /// Rejects an empty platform selection before anything else, then an
    /// empty title or body. Never touches storage when validation fails.
    pub async fn save_draft(&mut self) -> Result<Post, SessionError> {
        self.validate()?;
        self.persist(PostStatus::Draft).await
    }

    pub async fn publish(&mut self) -> Result<Post, SessionError> {
        self.validate()?;
        let post = self.persist(PostStatus::Published).await?;
        self.status = post.status;
        info!(post_id = %self.post_id, "post published");
        Ok(post)
    }

    /// Rewrite the current markup for one platform and keep the result in
    /// the view
    pub async fn regenerate(
        &mut self,
        transform: &dyn TextTransform,
        platform: Platform,
        tone: Tone,
    ) -> Result<String, SessionError> {
        let raw = self.surface.output().markup_form.clone();
        let options = TransformOptions::new(platform, tone);
        let limit = self.config.transform_timeout();
        let text = match tokio::time::timeout(limit, transform.transform(&raw, options)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransformError::TimedOut {
                    platform,
                    millis: self.config.transform_timeout_ms,
                }
                .into())
            }
        };
        self.processed.insert(platform, text.clone());
        Ok(text)
    }

    /// Flush unsaved changes and end the session
    pub async fn close(mut self) -> Result<(), SessionError> {
        match self.scheduler.flush().await? {
            SaveOutcome::Saved(_) => info!(post_id = %self.post_id, "final save on close"),
            SaveOutcome::Unchanged | SaveOutcome::Skipped => {}
        }
        Ok(())
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn surface(&self) -> &EditingSurface {
        &self.surface
    }

    fn validate(&self) -> Result<(), ValidationError> {
        platform::validate_submission(&self.title, self.surface.is_empty(), &self.platforms)
    }

    async fn persist(&mut self, status: PostStatus) -> Result<Post, SessionError> {
        let snapshot = self.snapshot(status);
        Ok(self.scheduler.save_now(snapshot).await?)
    }

    fn snapshot(&self, status: PostStatus) -> SaveSnapshot {
        let output = self.surface.output();
        SaveSnapshot {
            title: self.title.clone(),
            content: output.render_form.clone(),
            raw_content: output.markup_form.clone(),
            platforms: self.platforms.clone(),
            status,
        }
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot(self.status);
        self.scheduler.notify_change(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use postcraft_core::selection::{Position, Selection};
    use postcraft_db::{InMemoryPostRepository, PostDraft, StoreResult};
    use postcraft_pipeline::TemplateTransform;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Repository that rejects every save while `down` is set
    #[derive(Default)]
    struct Flaky {
        inner: InMemoryPostRepository,
        down: AtomicBool,
    }

    #[async_trait]
    impl PostRepository for Flaky {
        async fn save_post(&self, id: &PostId, draft: &PostDraft) -> StoreResult<Post> {
            if self.down.load(Ordering::SeqCst) {
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

    async fn open(repo: &Arc<InMemoryPostRepository>, id: PostId) -> EditorSession {
        EditorSession::open(repo.clone(), id, "user-1", SessionConfig::default())
            .await
            .unwrap()
    }

    fn delay() -> Duration {
        SessionConfig::default().autosave_delay() + Duration::from_millis(1)
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_post_starts_empty() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let session = open(&repo, PostId::new()).await;
        let view = session.view();
        assert_eq!(view.render_form, "<p></p>");
        assert_eq!(view.markup_form, "");
        assert!(view.platform_constraints.is_empty());
        assert_eq!(view.auto_save_status, AutoSaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_autosave_after_quiet_period() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        let mut session = open(&repo, id).await;

        session.set_title("Launch");
        session.toggle_platform(Platform::Twitter);
        session.apply(&EditorCommand::insert_text("Hello world"));
        session.apply(&EditorCommand::select(Selection::new(
            Position::new(0, 6),
            Position::new(0, 11),
        )));
        let view = session.apply(&EditorCommand::bold());
        assert_eq!(view.markup_form, "Hello **world**");
        assert_eq!(repo.save_calls(), 0);

        sleep(delay()).await;
        assert_eq!(repo.save_calls(), 1);
        let saved = repo.load_post(&id).await.unwrap();
        assert_eq!(saved.raw_content, "Hello **world**");
        assert_eq!(saved.content, "<p>Hello <strong>world</strong></p>");
        assert_eq!(saved.status, PostStatus::Draft);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_only_commands_do_not_schedule() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let mut session = open(&repo, PostId::new()).await;
        session.set_title("T");
        session.toggle_platform(Platform::Twitter);
        session.apply(&EditorCommand::insert_text("body"));
        sleep(delay()).await;
        assert_eq!(repo.save_calls(), 1);

        session.apply(&EditorCommand::select(Selection::caret(Position::new(0, 1))));
        sleep(delay()).await;
        assert_eq!(repo.save_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_only_change_is_saved_on_close() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        let mut session = open(&repo, id).await;
        session.set_title("Split");
        session.toggle_platform(Platform::Twitter);
        session.apply(&EditorCommand::insert_text("abc"));
        sleep(delay()).await;
        assert_eq!(repo.save_calls(), 1);

        // neither edit changes the markup form
        session.apply(&EditorCommand::SplitBlock);
        let view = session.apply(&EditorCommand::insert_text(" "));
        assert_eq!(view.markup_form, "abc");
        assert_eq!(view.render_form, "<p>abc</p><p> </p>");

        session.close().await.unwrap();
        assert_eq!(repo.save_calls(), 2);
        assert_eq!(repo.load_post(&id).await.unwrap().content, view.render_form);
    }

    #[tokio::test(start_paused = true)]
    async fn test_autosave_waits_for_a_platform() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        let mut session = open(&repo, id).await;
        session.set_title("Untargeted");
        session.apply(&EditorCommand::insert_text("body"));
        sleep(delay()).await;

        assert_eq!(repo.save_calls(), 0);
        assert!(matches!(repo.load_post(&id).await, Err(StoreError::NotFound(_))));

        session.toggle_platform(Platform::LinkedIn);
        sleep(delay()).await;
        assert_eq!(repo.save_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_publish_stays_draft_after_close() {
        let repo = Arc::new(Flaky::default());
        let id = PostId::new();
        let mut session = EditorSession::open(repo.clone(), id, "user-1", SessionConfig::default())
            .await
            .unwrap();
        session.set_title("News");
        session.toggle_platform(Platform::LinkedIn);
        session.apply(&EditorCommand::insert_text("Out now"));
        sleep(delay()).await;

        repo.down.store(true, Ordering::SeqCst);
        let err = session.publish().await.unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::Unavailable(_))));
        let view = session.view();
        assert_eq!(view.status, PostStatus::Draft);
        assert_eq!(view.auto_save_status, AutoSaveStatus::Error);

        repo.down.store(false, Ordering::SeqCst);
        session.apply(&EditorCommand::insert_text("!"));
        session.close().await.unwrap();

        let stored = repo.load_post(&id).await.unwrap();
        assert_eq!(stored.status, PostStatus::Draft);
        assert_eq!(stored.raw_content, "Out now!");
    }

    #[tokio::test(start_paused = true)]
    async fn test_constraints_over_limit_do_not_block_save() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let mut session = open(&repo, PostId::new()).await;
        session.set_title("Long");
        session.toggle_platform(Platform::Twitter);
        let view = session.apply(&EditorCommand::insert_text("x".repeat(344)));

        let twitter = view.platform_constraints[&Platform::Twitter];
        assert_eq!(twitter.current_length, 350);
        assert!(twitter.is_over_limit);

        let post = session.save_draft().await.unwrap();
        assert_eq!(post.title, "Long");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_draft_rejects_empty_platforms_first() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let mut session = open(&repo, PostId::new()).await;

        let err = session.save_draft().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::NoPlatformsSelected)
        ));

        session.toggle_platform(Platform::LinkedIn);
        let err = session.save_draft().await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(ValidationError::EmptyTitle)));
        assert_eq!(repo.save_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_then_autosave_keeps_published() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        let mut session = open(&repo, id).await;
        session.set_title("News");
        session.toggle_platform(Platform::LinkedIn);
        session.apply(&EditorCommand::insert_text("Out now"));

        let post = session.publish().await.unwrap();
        assert!(post.is_published());
        assert_eq!(session.view().status, PostStatus::Published);

        session.apply(&EditorCommand::insert_text("!"));
        sleep(delay()).await;
        let saved = repo.load_post(&id).await.unwrap();
        assert_eq!(saved.raw_content, "Out now!");
        assert!(saved.is_published());
        assert_eq!(session.view().auto_save_status, AutoSaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_loads_post_and_close_without_edits_does_not_save() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        repo.save_post(
            &id,
            &PostDraft {
                author_id: "user-1".into(),
                title: "Stored".into(),
                content: "<h1>Head</h1><p style=\"text-align: center\">mid</p>".into(),
                raw_content: String::new(),
                platforms: [Platform::Twitter].into_iter().collect(),
                status: PostStatus::Draft,
            },
        )
        .await
        .unwrap();

        let session = open(&repo, id).await;
        let view = session.view();
        assert_eq!(view.title, "Stored");
        assert_eq!(
            view.markup_form,
            "# Head\n\n<div style=\"text-align: center\">mid</div>"
        );
        assert_eq!(view.platform_constraints[&Platform::Twitter].current_length, 6 + 2 + 7);

        session.close().await.unwrap();
        assert_eq!(repo.save_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_flushes_pending_edit() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        let mut session = open(&repo, id).await;
        session.set_title("Quick");
        session.toggle_platform(Platform::Twitter);
        session.apply(&EditorCommand::insert_text("note"));

        session.close().await.unwrap();
        assert_eq!(repo.load_post(&id).await.unwrap().raw_content, "note");
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_deleted_post_fails() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = PostId::new();
        repo.save_post(&id, &PostDraft::default()).await.unwrap();
        repo.delete_post(&id).await.unwrap();

        let result =
            EditorSession::open(repo.clone(), id, "user-1", SessionConfig::default()).await;
        assert!(matches!(result, Err(SessionError::Store(StoreError::Deleted(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_stores_processed_text() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let mut session = open(&repo, PostId::new()).await;
        session.apply(&EditorCommand::insert_text("ship it"));

        let text = session
            .regenerate(&TemplateTransform::new(), Platform::Twitter, Tone::Witty)
            .await
            .unwrap();
        assert_eq!(text, "Hot take: ship it 🔥");
        assert_eq!(session.view().processed_content[&Platform::Twitter], text);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_json_shape() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let mut session = open(&repo, PostId::new()).await;
        session.toggle_platform(Platform::Twitter);
        let json = serde_json::to_value(session.view()).unwrap();
        assert_eq!(json["autoSaveStatus"], "saved");
        assert_eq!(json["platformConstraints"]["TWITTER"]["limit"], 280);
        assert_eq!(json["plainTextLength"], 0);
    }
}
