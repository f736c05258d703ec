// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markup serialization options

use serde::{Deserialize, Serialize};

/// Delimiters and markers used when writing the markup form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupOptions {
    /// Emphasis (italic) delimiter
    pub em_delimiter: String,
    /// Strong (bold) delimiter
    pub strong_delimiter: String,
    /// Strikethrough delimiter
    pub strike_delimiter: String,
    /// Marker for bullet list items
    pub bullet_list_marker: String,
    /// Horizontal rule line
    pub hr: String,
    /// Opening/closing fence for code blocks; lengthened when the code
    /// itself contains a fence
    pub fence: String,
    /// Text emitted before the newline of a hard line break
    pub br: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            em_delimiter: "_".to_string(),
            strong_delimiter: "**".to_string(),
            strike_delimiter: "~~".to_string(),
            bullet_list_marker: "-".to_string(),
            hr: "---".to_string(),
            fence: "```".to_string(),
            br: "  ".to_string(),
        }
    }
}

impl MarkupOptions {
    /// Fence character and minimum run length
    pub(crate) fn fence_parts(&self) -> (char, usize) {
        let ch = self.fence.chars().next().unwrap_or('`');
        (ch, self.fence.chars().count().max(3))
    }
}
