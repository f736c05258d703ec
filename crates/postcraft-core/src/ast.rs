// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editable document AST
//!
//! A [`Document`] is an ordered list of top-level [`Block`]s. Text-bearing
//! blocks hold a sequence of [`Span`]s, each carrying a [`MarkSet`] and an
//! optional link target. Code blocks hold raw text and never carry marks.
//!
//! Lists and quotes are stored flat: every list item and every quoted
//! paragraph is its own block, and consecutive blocks of the same kind are
//! grouped into one container when rendered.
//!
//! All offsets in this module are measured in `char`s. Lengths reported to
//! users ([`Document::text_length`]) are measured in grapheme clusters.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Source formats a document can be loaded from or rendered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Render form: the HTML fragment produced for display
    Html,
    /// Markup form: the portable plain-text serialization
    Markdown,
}

impl SourceFormat {
    /// Default file extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Html => "html",
            SourceFormat::Markdown => "md",
        }
    }
}

/// Inline formatting mark
///
/// Declaration order is the canonical nesting order: earlier marks wrap
/// later ones when a span carries several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    Superscript,
    Subscript,
    Keyboard,
}

impl Mark {
    pub const ALL: [Mark; 6] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Strike,
        Mark::Superscript,
        Mark::Subscript,
        Mark::Keyboard,
    ];

    /// Render-form tag emitted for this mark
    pub fn tag(self) -> &'static str {
        match self {
            Mark::Bold => "strong",
            Mark::Italic => "em",
            Mark::Strike => "s",
            Mark::Superscript => "sup",
            Mark::Subscript => "sub",
            Mark::Keyboard => "kbd",
        }
    }

    /// Map an HTML tag name (including legacy aliases) to a mark
    pub fn from_tag(tag: &str) -> Option<Mark> {
        match tag {
            "strong" | "b" => Some(Mark::Bold),
            "em" | "i" => Some(Mark::Italic),
            "s" | "del" | "strike" => Some(Mark::Strike),
            "sup" => Some(Mark::Superscript),
            "sub" => Some(Mark::Subscript),
            "kbd" => Some(Mark::Keyboard),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of marks carried by a span
///
/// Iteration yields marks in canonical nesting order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(u8);

impl MarkSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(marks: &[Mark]) -> Self {
        marks.iter().fold(Self::empty(), |set, mark| set.with(*mark))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, mark: Mark) -> bool {
        self.0 & mark.bit() != 0
    }

    pub fn insert(&mut self, mark: Mark) {
        self.0 |= mark.bit();
    }

    pub fn remove(&mut self, mark: Mark) {
        self.0 &= !mark.bit();
    }

    pub fn toggle(&mut self, mark: Mark) {
        self.0 ^= mark.bit();
    }

    #[must_use]
    pub fn with(mut self, mark: Mark) -> Self {
        self.insert(mark);
        self
    }

    #[must_use]
    pub fn union(self, other: MarkSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Mark> + '_ {
        Mark::ALL.into_iter().filter(|mark| self.contains(*mark))
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        Self::of(&marks)
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.iter().collect()
    }
}

/// A run of text with uniform formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
    /// Link target when the run is part of a link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::empty(),
            link: None,
        }
    }

    pub fn marked(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
            link: None,
        }
    }

    pub fn linked(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::empty(),
            link: Some(href.into()),
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// User-perceived character count
    pub fn text_length(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn same_format(&self, other: &Span) -> bool {
        self.marks == other.marks && self.link == other.link
    }

    fn with_text(&self, text: &str) -> Span {
        Span {
            text: text.to_string(),
            marks: self.marks,
            link: self.link.clone(),
        }
    }
}

/// Horizontal text alignment of paragraphs and headings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Alignment> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Alignment::Left
    }
}

/// Heading levels available in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    #[serde(rename = "1")]
    H1,
    #[serde(rename = "2")]
    H2,
}

impl HeadingLevel {
    /// Clamp an arbitrary heading level into the supported range
    pub fn from_level(level: u8) -> Self {
        if level <= 1 {
            HeadingLevel::H1
        } else {
            HeadingLevel::H2
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
        }
    }
}

/// List container kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Ordered,
}

/// Block types a text block can be switched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Paragraph,
    Heading1,
    Heading2,
    BlockQuote,
    CodeBlock,
    BulletList,
    OrderedList,
}

/// Top-level structural unit of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<Span>,
        #[serde(default)]
        alignment: Alignment,
    },
    Heading {
        level: HeadingLevel,
        content: Vec<Span>,
        #[serde(default)]
        alignment: Alignment,
    },
    ListItem {
        kind: ListKind,
        content: Vec<Span>,
    },
    BlockQuote {
        content: Vec<Span>,
    },
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
    HorizontalRule,
}

impl Block {
    pub fn paragraph(content: Vec<Span>) -> Self {
        Block::Paragraph {
            content: normalized(content),
            alignment: Alignment::Left,
        }
    }

    pub fn empty_paragraph() -> Self {
        Block::paragraph(Vec::new())
    }

    pub fn heading(level: HeadingLevel, content: Vec<Span>) -> Self {
        Block::Heading {
            level,
            content: normalized(content),
            alignment: Alignment::Left,
        }
    }

    pub fn code(language: Option<String>, code: impl Into<String>) -> Self {
        Block::CodeBlock {
            language,
            code: code.into(),
        }
    }

    /// Build a block of the given type around inline content
    pub fn of_type(block_type: BlockType, content: Vec<Span>, alignment: Alignment) -> Self {
        let content = normalized(content);
        match block_type {
            BlockType::Paragraph => Block::Paragraph { content, alignment },
            BlockType::Heading1 => Block::Heading {
                level: HeadingLevel::H1,
                content,
                alignment,
            },
            BlockType::Heading2 => Block::Heading {
                level: HeadingLevel::H2,
                content,
                alignment,
            },
            BlockType::BlockQuote => Block::BlockQuote { content },
            BlockType::BulletList => Block::ListItem {
                kind: ListKind::Bullet,
                content,
            },
            BlockType::OrderedList => Block::ListItem {
                kind: ListKind::Ordered,
                content,
            },
            BlockType::CodeBlock => Block::CodeBlock {
                language: None,
                code: content.iter().map(|span| span.text.as_str()).collect(),
            },
        }
    }

    /// Block type, or `None` for horizontal rules
    pub fn block_type(&self) -> Option<BlockType> {
        match self {
            Block::Paragraph { .. } => Some(BlockType::Paragraph),
            Block::Heading {
                level: HeadingLevel::H1,
                ..
            } => Some(BlockType::Heading1),
            Block::Heading {
                level: HeadingLevel::H2,
                ..
            } => Some(BlockType::Heading2),
            Block::ListItem {
                kind: ListKind::Bullet,
                ..
            } => Some(BlockType::BulletList),
            Block::ListItem {
                kind: ListKind::Ordered,
                ..
            } => Some(BlockType::OrderedList),
            Block::BlockQuote { .. } => Some(BlockType::BlockQuote),
            Block::CodeBlock { .. } => Some(BlockType::CodeBlock),
            Block::HorizontalRule => None,
        }
    }

    /// Inline content of text blocks
    pub fn content(&self) -> Option<&[Span]> {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::ListItem { content, .. }
            | Block::BlockQuote { content } => Some(content),
            Block::CodeBlock { .. } | Block::HorizontalRule => None,
        }
    }

    fn content_mut(&mut self) -> Option<&mut Vec<Span>> {
        match self {
            Block::Paragraph { content, .. }
            | Block::Heading { content, .. }
            | Block::ListItem { content, .. }
            | Block::BlockQuote { content } => Some(content),
            Block::CodeBlock { .. } | Block::HorizontalRule => None,
        }
    }

    /// Alignment of paragraphs and headings
    pub fn alignment(&self) -> Option<Alignment> {
        match self {
            Block::Paragraph { alignment, .. } | Block::Heading { alignment, .. } => {
                Some(*alignment)
            }
            _ => None,
        }
    }

    /// Set alignment; returns whether anything changed
    pub fn set_alignment(&mut self, value: Alignment) -> bool {
        match self {
            Block::Paragraph { alignment, .. } | Block::Heading { alignment, .. } => {
                let changed = *alignment != value;
                *alignment = value;
                changed
            }
            _ => false,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Block::CodeBlock { .. })
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, Block::HorizontalRule)
    }

    /// Plain text of the block, without any markup
    pub fn text(&self) -> String {
        match self {
            Block::CodeBlock { code, .. } => code.clone(),
            Block::HorizontalRule => String::new(),
            _ => self
                .content()
                .map(|spans| spans.iter().map(|span| span.text.as_str()).collect())
                .unwrap_or_default(),
        }
    }

    pub fn char_len(&self) -> usize {
        match self {
            Block::CodeBlock { code, .. } => code.chars().count(),
            Block::HorizontalRule => 0,
            _ => self
                .content()
                .map(|spans| spans.iter().map(Span::char_len).sum())
                .unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.char_len() == 0
    }

    /// Sum of span lengths in grapheme clusters
    pub fn text_length(&self) -> usize {
        match self {
            Block::CodeBlock { code, .. } => code.graphemes(true).count(),
            Block::HorizontalRule => 0,
            _ => self
                .content()
                .map(|spans| spans.iter().map(Span::text_length).sum())
                .unwrap_or(0),
        }
    }

    /// Convert to another block type
    ///
    /// Converting a multi-line code block into a text block yields one block
    /// per line. Horizontal rules are returned unchanged.
    pub fn convert(&self, target: BlockType) -> Vec<Block> {
        match self {
            Block::HorizontalRule => vec![self.clone()],
            Block::CodeBlock { code, language } => {
                if target == BlockType::CodeBlock {
                    return vec![Block::code(language.clone(), code.clone())];
                }
                code.split('\n')
                    .map(|line| Block::of_type(target, vec![Span::plain(line)], Alignment::Left))
                    .collect()
            }
            _ => {
                let content = self.content().map(<[Span]>::to_vec).unwrap_or_default();
                vec![Block::of_type(
                    target,
                    content,
                    self.alignment().unwrap_or_default(),
                )]
            }
        }
    }

    /// Spans covering `start..end`
    pub fn spans_in(&self, start: usize, end: usize) -> Vec<Span> {
        match self.content() {
            Some(spans) => {
                let (_, rest) = split_spans(spans, start);
                let (middle, _) = split_spans(&rest, end.saturating_sub(start));
                middle
            }
            None => Vec::new(),
        }
    }

    /// Apply `f` to every span inside `start..end`
    pub fn format_range(&mut self, start: usize, end: usize, mut f: impl FnMut(&mut Span)) {
        if let Some(content) = self.content_mut() {
            let (mut left, rest) = split_spans(content, start);
            let (mut middle, right) = split_spans(&rest, end.saturating_sub(start));
            middle.iter_mut().for_each(&mut f);
            left.append(&mut middle);
            left.extend(right);
            *content = normalized(left);
        }
    }

    /// Insert text at `offset`; marks and link are ignored in code blocks
    pub fn insert_text(&mut self, offset: usize, text: &str, marks: MarkSet, link: Option<String>) {
        match self {
            Block::CodeBlock { code, .. } => {
                let at = byte_index(code, offset);
                code.insert_str(at, text);
            }
            Block::HorizontalRule => {}
            _ => {
                if let Some(content) = self.content_mut() {
                    let (mut left, right) = split_spans(content, offset);
                    left.push(Span {
                        text: text.to_string(),
                        marks,
                        link,
                    });
                    left.extend(right);
                    *content = normalized(left);
                }
            }
        }
    }

    /// Delete the characters in `start..end`
    pub fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        match self {
            Block::CodeBlock { code, .. } => {
                let from = byte_index(code, start);
                let to = byte_index(code, end);
                code.replace_range(from..to, "");
            }
            Block::HorizontalRule => {}
            _ => {
                if let Some(content) = self.content_mut() {
                    let (mut left, rest) = split_spans(content, start);
                    let (_, right) = split_spans(&rest, end - start);
                    left.extend(right);
                    *content = normalized(left);
                }
            }
        }
    }

    /// Split at `offset`, keeping the head and returning the tail as a block
    /// of the same kind
    pub fn split_off(&mut self, offset: usize) -> Block {
        match self {
            Block::CodeBlock { code, language } => {
                let at = byte_index(code, offset);
                let tail = code.split_off(at);
                Block::code(language.clone(), tail)
            }
            Block::HorizontalRule => Block::empty_paragraph(),
            _ => {
                let mut tail = self.clone();
                if let (Some(content), Some(tail_content)) =
                    (self.content_mut(), tail.content_mut())
                {
                    let (left, right) = split_spans(content, offset);
                    *content = normalized(left);
                    *tail_content = normalized(right);
                }
                tail
            }
        }
    }

    /// Append the content of `other` to the end of this block
    pub fn append(&mut self, other: Block) {
        match self {
            Block::CodeBlock { code, .. } => code.push_str(&other.text()),
            Block::HorizontalRule => {}
            _ => {
                let incoming = match other {
                    Block::CodeBlock { code, .. } => vec![Span::plain(code)],
                    Block::HorizontalRule => Vec::new(),
                    other => other.content().map(<[Span]>::to_vec).unwrap_or_default(),
                };
                if let Some(content) = self.content_mut() {
                    content.extend(incoming);
                    *content = normalized(std::mem::take(content));
                }
            }
        }
    }

    /// Marks in effect at `offset`: those of the character before it, or of
    /// the first character when `offset` is zero
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        self.span_at(offset.saturating_sub(1))
            .map(|span| span.marks)
            .unwrap_or_default()
    }

    /// Link target of the character at char index `index`
    pub fn link_at(&self, index: usize) -> Option<&str> {
        self.span_at(index).and_then(|span| span.link.as_deref())
    }

    /// Extent of the link touching `offset`, as `(start, end)` char offsets
    pub fn link_extent(&self, offset: usize) -> Option<(usize, usize)> {
        let spans = self.content()?;
        let inside = if self.link_at(offset).is_some() {
            offset
        } else {
            offset.checked_sub(1)?
        };
        let href = self.link_at(inside)?;

        let mut ranges = Vec::with_capacity(spans.len());
        let mut position = 0;
        for span in spans {
            let end = position + span.char_len();
            ranges.push((position, end, span.link.as_deref() == Some(href)));
            position = end;
        }

        let hit = ranges
            .iter()
            .position(|(start, end, _)| *start <= inside && inside < *end)?;
        let mut first = hit;
        while first > 0 && ranges[first - 1].2 {
            first -= 1;
        }
        let mut last = hit;
        while last + 1 < ranges.len() && ranges[last + 1].2 {
            last += 1;
        }
        Some((ranges[first].0, ranges[last].1))
    }

    fn span_at(&self, index: usize) -> Option<&Span> {
        let mut position = 0;
        for span in self.content()? {
            let end = position + span.char_len();
            if index < end {
                return Some(span);
            }
            position = end;
        }
        None
    }
}

/// The post body: an ordered, never-empty sequence of blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDocument")]
pub struct Document {
    blocks: Vec<Block>,
}

#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    blocks: Vec<Block>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        Document::from_blocks(raw.blocks)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding a single empty paragraph
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::empty_paragraph()],
        }
    }

    /// Build a document, substituting an empty paragraph for no blocks
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            Self::new()
        } else {
            Self { blocks }
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Crate-internal mutable access; callers must keep the block list
    /// non-empty (see [`Document::ensure_not_empty`])
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub(crate) fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_paragraph());
        }
    }

    /// True when the document has no text and no rules
    pub fn is_empty(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| !block.is_rule() && block.is_empty())
    }

    /// Text content of all blocks joined by newlines
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter(|block| !block.is_rule())
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain-text length: the sum of all text run lengths; marks, block
    /// separators and markup syntax contribute nothing
    pub fn text_length(&self) -> usize {
        self.blocks.iter().map(Block::text_length).sum()
    }
}

/// Byte index of the `offset`-th char, clamped to the string length
pub(crate) fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Split spans at a char offset
pub fn split_spans(spans: &[Span], offset: usize) -> (Vec<Span>, Vec<Span>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut position = 0;

    for span in spans {
        let len = span.char_len();
        if position + len <= offset {
            left.push(span.clone());
        } else if position >= offset {
            right.push(span.clone());
        } else {
            let at = byte_index(&span.text, offset - position);
            left.push(span.with_text(&span.text[..at]));
            right.push(span.with_text(&span.text[at..]));
        }
        position += len;
    }

    (left, right)
}

/// Drop empty spans and merge neighbours with identical formatting
pub fn normalized(spans: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if span.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.same_format(&span) => last.text.push_str(&span.text),
            _ => out.push(span),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> Span {
        Span::marked(text, MarkSet::of(&[Mark::Bold]))
    }

    #[test]
    fn test_document_never_empty() {
        let doc = Document::from_blocks(Vec::new());
        assert_eq!(doc.len(), 1);
        assert!(doc.is_empty());

        let doc: Document = serde_json::from_str(r#"{"blocks":[]}"#).unwrap();
        assert_eq!(doc.blocks(), &[Block::empty_paragraph()]);
    }

    #[test]
    fn test_text_length_ignores_marks_and_structure() {
        let doc = Document::from_blocks(vec![
            Block::paragraph(vec![Span::plain("Hello "), bold("world")]),
            Block::HorizontalRule,
            Block::code(Some("rust".into()), "fn x()"),
        ]);
        assert_eq!(doc.text_length(), 11 + 6);
        assert_eq!(doc.plain_text(), "Hello world\nfn x()");
    }

    #[test]
    fn test_text_length_counts_graphemes() {
        let doc = Document::from_blocks(vec![Block::paragraph(vec![Span::plain("e\u{301}👍🏽")])]);
        assert_eq!(doc.text_length(), 2);
    }

    #[test]
    fn test_normalized_merges_equal_neighbours() {
        let spans = normalized(vec![
            Span::plain("a"),
            Span::plain(""),
            Span::plain("b"),
            bold("c"),
            bold("d"),
        ]);
        assert_eq!(spans, vec![Span::plain("ab"), bold("cd")]);
    }

    #[test]
    fn test_split_spans_inside_a_span() {
        let (left, right) = split_spans(&[Span::plain("héllo"), bold("!")], 2);
        assert_eq!(left, vec![Span::plain("hé")]);
        assert_eq!(right, vec![Span::plain("llo"), bold("!")]);
    }

    #[test]
    fn test_format_range() {
        let mut block = Block::paragraph(vec![Span::plain("Hello world")]);
        block.format_range(6, 11, |span| span.marks.insert(Mark::Bold));
        assert_eq!(
            block.content().unwrap(),
            &[Span::plain("Hello "), bold("world")]
        );
    }

    #[test]
    fn test_split_off_and_append() {
        let mut block = Block::heading(HeadingLevel::H2, vec![Span::plain("Title text")]);
        let tail = block.split_off(5);
        assert_eq!(block.text(), "Title");
        assert_eq!(tail.block_type(), Some(BlockType::Heading2));
        assert_eq!(tail.text(), " text");

        block.append(tail);
        assert_eq!(block.text(), "Title text");
    }

    #[test]
    fn test_convert_code_splits_lines() {
        let code = Block::code(None, "a\nb");
        let blocks = code.convert(BlockType::Paragraph);
        assert_eq!(
            blocks,
            vec![
                Block::paragraph(vec![Span::plain("a")]),
                Block::paragraph(vec![Span::plain("b")])
            ]
        );
    }

    #[test]
    fn test_convert_to_code_drops_marks() {
        let para = Block::paragraph(vec![Span::plain("x = "), bold("1")]);
        assert_eq!(para.convert(BlockType::CodeBlock), vec![Block::code(None, "x = 1")]);
    }

    #[test]
    fn test_link_extent() {
        let block = Block::paragraph(vec![
            Span::plain("see "),
            Span::linked("the ", "https://a.example"),
            Span {
                text: "docs".into(),
                marks: MarkSet::of(&[Mark::Bold]),
                link: Some("https://a.example".into()),
            },
            Span::plain(" now"),
        ]);
        assert_eq!(block.link_extent(5), Some((4, 12)));
        assert_eq!(block.link_extent(12), Some((4, 12)));
        assert_eq!(block.link_extent(2), None);
    }

    #[test]
    fn test_marks_at() {
        let block = Block::paragraph(vec![Span::plain("ab"), bold("cd")]);
        assert!(block.marks_at(0).is_empty());
        assert!(block.marks_at(2).is_empty());
        assert!(block.marks_at(3).contains(Mark::Bold));
        assert!(block.marks_at(4).contains(Mark::Bold));
    }

    #[test]
    fn test_markset_serde_roundtrip_order() {
        let set = MarkSet::of(&[Mark::Strike, Mark::Bold]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["bold","strike"]"#);
    }
}
