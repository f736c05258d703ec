// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postcraft Session - editing sessions with debounced auto-save
//!
//! Ties the editing surface, the platform constraint tracker and the
//! post repository together for one post at a time.

pub mod autosave;
pub mod config;
pub mod session;

pub use autosave::{AutoSaveScheduler, AutoSaveStatus, SaveOutcome, SaveSnapshot};
pub use config::{ConfigError, SessionConfig};
pub use session::{EditorSession, SessionError, SessionView};
