// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editor commands
//!
//! The closed set of operations the editing surface accepts. Every UI
//! affordance maps onto exactly one variant.

use crate::ast::{Alignment, BlockType, Mark};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    ToggleMark { mark: Mark },
    SetBlockType { block_type: BlockType },
    SetAlignment { alignment: Alignment },
    InsertLink { href: String },
    RemoveLink,
    Undo,
    Redo,
    Select { selection: Selection },
    InsertText { text: String },
    DeleteBackward,
    SplitBlock,
    InsertHorizontalRule,
    SetCodeLanguage { language: Option<String> },
}

impl EditorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            EditorCommand::ToggleMark { .. } => "toggle_mark",
            EditorCommand::SetBlockType { .. } => "set_block_type",
            EditorCommand::SetAlignment { .. } => "set_alignment",
            EditorCommand::InsertLink { .. } => "insert_link",
            EditorCommand::RemoveLink => "remove_link",
            EditorCommand::Undo => "undo",
            EditorCommand::Redo => "redo",
            EditorCommand::Select { .. } => "select",
            EditorCommand::InsertText { .. } => "insert_text",
            EditorCommand::DeleteBackward => "delete_backward",
            EditorCommand::SplitBlock => "split_block",
            EditorCommand::InsertHorizontalRule => "insert_horizontal_rule",
            EditorCommand::SetCodeLanguage { .. } => "set_code_language",
        }
    }

    /// Commands that only change formatting and never the text itself
    pub fn is_formatting(&self) -> bool {
        matches!(
            self,
            EditorCommand::ToggleMark { .. }
                | EditorCommand::SetAlignment { .. }
                | EditorCommand::RemoveLink
                | EditorCommand::SetCodeLanguage { .. }
        )
    }

    pub fn bold() -> Self {
        EditorCommand::ToggleMark { mark: Mark::Bold }
    }

    pub fn italic() -> Self {
        EditorCommand::ToggleMark { mark: Mark::Italic }
    }

    pub fn strike() -> Self {
        EditorCommand::ToggleMark { mark: Mark::Strike }
    }

    pub fn insert_text(text: impl Into<String>) -> Self {
        EditorCommand::InsertText { text: text.into() }
    }

    pub fn select(selection: Selection) -> Self {
        EditorCommand::Select { selection }
    }
}

/// Result of applying a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Document or editor state changed
    Applied,
    /// Command did not apply here; state is untouched
    Ignored,
}

impl CommandOutcome {
    pub fn is_applied(&self) -> bool {
        *self == CommandOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&EditorCommand::SetAlignment {
            alignment: Alignment::Center,
        })
        .unwrap();
        assert_eq!(json, r#"{"command":"set_alignment","alignment":"center"}"#);

        let parsed: EditorCommand = serde_json::from_str(r#"{"command":"undo"}"#).unwrap();
        assert_eq!(parsed, EditorCommand::Undo);
    }
}
