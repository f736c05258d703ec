// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postcraft Core - editable document model and markup conversion
//!
//! This crate provides:
//! - A block/span document model with selection-aware formatting commands
//! - Bounded undo/redo history
//! - The render form (HTML) and a rule-based markup converter
//! - Platform character budgets and submission validation

pub mod ast;
pub mod command;
mod edit;
pub mod editor;
pub mod file_ops;
pub mod formats;
pub mod history;
pub mod markup;
pub mod model;
pub mod platform;
pub mod render;
pub mod selection;
pub mod traits;

pub use ast::{Alignment, Block, BlockType, Document, Mark, MarkSet, SourceFormat, Span};
pub use command::{CommandOutcome, EditorCommand};
pub use editor::{EditingSurface, EditorOutput, EditorPhase};
pub use markup::{MarkupConverter, MarkupOptions, MarkupRule};
pub use model::DocumentModel;
pub use platform::{Platform, PlatformConstraint, ValidationError};
pub use render::{Element, RenderNode, RenderTree};
pub use selection::{Position, Selection};
pub use traits::{ConversionError, ParseConfig, Parser, RenderConfig, Renderer, Result};
