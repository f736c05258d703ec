// SPDX-License-Identifier: AGPL-3.0-or-later
//! Document model
//!
//! Owns the document of one editing session together with its selection,
//! stored marks and undo history. All mutation goes through
//! [`DocumentModel::apply_command`].

use crate::ast::{Document, MarkSet, SourceFormat};
use crate::command::{CommandOutcome, EditorCommand};
use crate::edit;
use crate::file_ops::format_from_content;
use crate::formats::{HtmlHandler, MarkdownHandler};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::render::RenderTree;
use crate::selection::{Position, Selection};
use crate::traits::{ParseConfig, Parser};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct DocumentModel {
    document: Document,
    selection: Selection,
    /// Marks toggled at a collapsed cursor, applied to the next typed text
    stored_marks: Option<MarkSet>,
    history: History,
}

impl Default for DocumentModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            document: Document::new(),
            selection: Selection::default(),
            stored_marks: None,
            history: History::with_max_levels(limit),
        }
    }

    pub fn from_document(document: Document) -> Self {
        let mut model = Self::new();
        model.document = document;
        model
    }

    /// Replace the document with one parsed from render-form HTML or markup
    ///
    /// Never fails: input that cannot be parsed yields an empty paragraph so
    /// editing stays possible. History is reset.
    pub fn load_from(&mut self, input: &str, config: &ParseConfig) {
        self.document = parse_input(input, config);
        self.selection = Selection::default();
        self.stored_marks = None;
        self.history.clear();
    }

    /// Swap in new content as a single undoable step
    pub fn replace_content(&mut self, document: Document) {
        if document == self.document {
            return;
        }
        self.history
            .record(self.document.clone(), self.selection);
        self.document = document;
        self.selection = self.selection.clamp(&self.document);
        self.stored_marks = None;
    }

    /// Apply an editor command
    ///
    /// Commands that do not apply in the current state (undo on empty
    /// history, formatting a code block, ...) leave everything untouched and
    /// report [`CommandOutcome::Ignored`].
    pub fn apply_command(&mut self, command: &EditorCommand) -> CommandOutcome {
        let applied = match command {
            EditorCommand::Undo => self.undo(),
            EditorCommand::Redo => self.redo(),
            EditorCommand::Select { selection } => {
                let clamped = selection.clamp(&self.document);
                let changed = clamped != self.selection;
                self.selection = clamped;
                self.stored_marks = None;
                changed
            }
            EditorCommand::ToggleMark { mark } if self.selection.is_collapsed() => {
                if self.document.blocks()[self.selection.head.block].is_code() {
                    false
                } else {
                    let mut marks = self.active_marks();
                    marks.toggle(*mark);
                    self.stored_marks = Some(marks);
                    true
                }
            }
            EditorCommand::ToggleMark { mark } => {
                let mark = *mark;
                self.edit(|doc, sel| edit::toggle_mark(doc, sel, mark))
            }
            EditorCommand::SetBlockType { block_type } => {
                let target = *block_type;
                self.edit(|doc, sel| edit::set_block_type(doc, sel, target))
            }
            EditorCommand::SetAlignment { alignment } => {
                let alignment = *alignment;
                self.edit(|doc, sel| edit::set_alignment(doc, sel, alignment))
            }
            EditorCommand::InsertLink { href } => {
                let marks = self.active_marks();
                self.edit(|doc, sel| edit::insert_link(doc, sel, href, marks))
            }
            EditorCommand::RemoveLink => self.edit(|doc, sel| edit::remove_link(doc, sel)),
            EditorCommand::InsertText { text } => {
                let marks = self.active_marks();
                let applied = self.edit(|doc, sel| edit::insert_text(doc, sel, text, marks));
                if applied {
                    self.stored_marks = None;
                }
                applied
            }
            EditorCommand::DeleteBackward => self.edit(edit::delete_backward),
            EditorCommand::SplitBlock => self.edit(edit::split_block),
            EditorCommand::InsertHorizontalRule => self.edit(edit::insert_horizontal_rule),
            EditorCommand::SetCodeLanguage { language } => {
                self.edit(|doc, sel| edit::set_code_language(doc, sel, language.as_deref()))
            }
        };

        if applied {
            CommandOutcome::Applied
        } else {
            CommandOutcome::Ignored
        }
    }

    /// Run a mutation on a working copy; commit and record history only
    /// when the document actually changed
    fn edit<F>(&mut self, mutation: F) -> bool
    where
        F: FnOnce(&mut Document, &mut Selection) -> bool,
    {
        let mut document = self.document.clone();
        let mut selection = self.selection;
        if !mutation(&mut document, &mut selection) {
            return false;
        }
        document.ensure_not_empty();
        let selection = selection.clamp(&document);

        if document == self.document {
            let moved = selection != self.selection;
            self.selection = selection;
            return moved;
        }

        let previous = std::mem::replace(&mut self.document, document);
        self.history.record(previous, self.selection);
        self.selection = selection;
        true
    }

    fn undo(&mut self) -> bool {
        let current = (self.document.clone(), self.selection);
        match self.history.undo(current) {
            Some((document, selection)) => {
                self.restore(document, selection);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        let current = (self.document.clone(), self.selection);
        match self.history.redo(current) {
            Some((document, selection)) => {
                self.restore(document, selection);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, document: Document, selection: Selection) {
        self.document = document;
        self.selection = selection.clamp(&self.document);
        self.stored_marks = None;
    }

    /// Plain-text length in user-perceived characters
    pub fn plain_text_length(&self) -> usize {
        self.document.text_length()
    }

    /// Marks in effect at `position`
    pub fn active_marks_at(&self, position: Position) -> MarkSet {
        let position = position.clamp(&self.document);
        self.document
            .block(position.block)
            .map(|block| block.marks_at(position.offset))
            .unwrap_or_default()
    }

    /// Marks in effect at the cursor, including stored marks
    pub fn active_marks(&self) -> MarkSet {
        match self.stored_marks {
            Some(marks) => marks,
            None => self.active_marks_at(self.selection.head),
        }
    }

    pub fn to_render_tree(&self) -> RenderTree {
        RenderTree::from_document(&self.document)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

fn parse_input(input: &str, config: &ParseConfig) -> Document {
    if input.trim().is_empty() {
        return Document::new();
    }
    let result = match format_from_content(input) {
        SourceFormat::Html => HtmlHandler::new().parse(input, config),
        SourceFormat::Markdown => MarkdownHandler::new().parse(input, config),
    };
    result.unwrap_or_else(|err| {
        warn!(error = %err, "could not parse document, starting empty");
        Document::new()
    })
}
