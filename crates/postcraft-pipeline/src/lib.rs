// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postcraft Pipeline - platform text transforms
//!
//! The `TextTransform` port, a template-based implementation and the
//! per-platform composition used when a new post is created.

pub mod compose;
pub mod template;
pub mod transform;

pub use compose::{compose_for_platforms, ComposedText};
pub use template::{extract_keywords, TemplateTransform};
pub use transform::{Result, TextTransform, Tone, TransformError, TransformOptions};
