// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postcraft DB - post aggregate and persistence port
//!
//! This crate provides:
//! - The `Post` aggregate and its draft/published lifecycle
//! - The async `PostRepository` port used by sessions and auto-save
//! - An in-memory repository adapter

pub mod memory;
pub mod post;
pub mod repository;

pub use memory::InMemoryPostRepository;
pub use post::{Post, PostDraft, PostError, PostId, PostStatus};
pub use repository::{PostRepository, StoreError, StoreResult};
