// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editing Surface Controller
//!
//! The single entry point through which UI commands reach the document
//! model. After each command it recomputes the render form, the markup form
//! and the plain-text length and hands them back to the caller.

use crate::ast::Document;
use crate::command::{CommandOutcome, EditorCommand};
use crate::markup::{MarkupConverter, MarkupOptions};
use crate::model::DocumentModel;
use crate::traits::ParseConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorPhase {
    Idle,
    Editing,
}

/// Derived outputs after a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOutput {
    pub render_form: String,
    pub markup_form: String,
    pub plain_text_length: usize,
}

#[derive(Debug)]
pub struct EditingSurface {
    model: DocumentModel,
    converter: MarkupConverter,
    phase: EditorPhase,
    output: EditorOutput,
}

impl Default for EditingSurface {
    fn default() -> Self {
        Self::new(DocumentModel::new(), MarkupConverter::default())
    }
}

impl EditingSurface {
    pub fn new(model: DocumentModel, converter: MarkupConverter) -> Self {
        let output = compute_output(&model, &converter);
        Self {
            model,
            converter,
            phase: EditorPhase::Idle,
            output,
        }
    }

    /// Surface over content loaded from persisted render or markup form
    pub fn load(
        input: &str,
        parse: &ParseConfig,
        markup: MarkupOptions,
        history_limit: usize,
    ) -> Self {
        let mut model = DocumentModel::with_history_limit(history_limit);
        model.load_from(input, parse);
        Self::new(model, MarkupConverter::new(markup))
    }

    pub fn from_document(document: Document) -> Self {
        Self::new(DocumentModel::from_document(document), MarkupConverter::default())
    }

    /// Apply a command and return the recomputed outputs
    pub fn on_command(&mut self, command: &EditorCommand) -> EditorOutput {
        self.phase = EditorPhase::Editing;
        let outcome = self.model.apply_command(command);
        debug!(command = command.name(), ?outcome, "editor command");
        if outcome == CommandOutcome::Applied {
            self.output = compute_output(&self.model, &self.converter);
        }
        self.output.clone()
    }

    /// Swap the whole document (e.g. for generated text) as one undo step
    pub fn replace_document(&mut self, document: Document) -> EditorOutput {
        self.phase = EditorPhase::Editing;
        self.model.replace_content(document);
        self.output = compute_output(&self.model, &self.converter);
        self.output.clone()
    }

    pub fn output(&self) -> &EditorOutput {
        &self.output
    }

    pub fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    pub fn is_empty(&self) -> bool {
        self.model.document().is_empty()
    }
}

fn compute_output(model: &DocumentModel, converter: &MarkupConverter) -> EditorOutput {
    let tree = model.to_render_tree();
    EditorOutput {
        render_form: tree.to_html(),
        markup_form: converter.serialize(&tree),
        plain_text_length: model.plain_text_length(),
    }
}
