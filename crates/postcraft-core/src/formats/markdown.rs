// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markup-form handler using comrak
//!
//! Rendering goes through the Markup Conversion Engine. Parsing is only
//! needed when a session loads persisted markup, and is best-effort:
//! constructs outside the editor's model are flattened to text.

use crate::ast::{
    Alignment, Block, BlockType, Document, HeadingLevel, ListKind, Mark, MarkSet, SourceFormat,
    Span,
};
use crate::formats::html::{blocks_from_nodes, parse_fragment};
use crate::markup::MarkupConverter;
use crate::render::RenderNode;
use crate::traits::{ParseConfig, Parser, RenderConfig, Renderer, Result};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, Options};

/// Markdown format handler
pub struct MarkdownHandler;

impl MarkdownHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MarkdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkdownHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markdown
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Document> {
        config.check_size(input)?;
        let mut blocks = Vec::new();
        parse_blocks(input, Alignment::Left, &mut blocks);
        Ok(Document::from_blocks(blocks))
    }
}

impl Renderer for MarkdownHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markdown
    }

    fn render(&self, doc: &Document, config: &RenderConfig) -> Result<String> {
        Ok(MarkupConverter::new(config.markup.clone()).serialize_document(doc))
    }
}

fn comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options
}

fn parse_blocks(input: &str, alignment: Alignment, blocks: &mut Vec<Block>) {
    let arena = Arena::new();
    let root = parse_document(&arena, input, &comrak_options());
    let ctx = BlockContext {
        alignment,
        ..BlockContext::default()
    };
    for child in root.children() {
        collect_blocks(child, ctx, blocks);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BlockContext {
    alignment: Alignment,
    quote: bool,
    list: Option<ListKind>,
}

impl BlockContext {
    fn text_block(&self, requested: BlockType, content: Vec<Span>) -> Block {
        let block_type = match self.list {
            Some(ListKind::Bullet) => BlockType::BulletList,
            Some(ListKind::Ordered) => BlockType::OrderedList,
            None if self.quote => BlockType::BlockQuote,
            None => requested,
        };
        Block::of_type(block_type, content, self.alignment)
    }
}

fn collect_blocks<'a>(node: &'a AstNode<'a>, ctx: BlockContext, blocks: &mut Vec<Block>) {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::Paragraph => {
            blocks.push(ctx.text_block(BlockType::Paragraph, inline_content(node)));
        }
        NodeValue::Heading(heading) => {
            let block_type = match HeadingLevel::from_level(heading.level) {
                HeadingLevel::H1 => BlockType::Heading1,
                HeadingLevel::H2 => BlockType::Heading2,
            };
            blocks.push(ctx.text_block(block_type, inline_content(node)));
        }
        NodeValue::List(list) => {
            let kind = match list.list_type {
                ListType::Bullet => ListKind::Bullet,
                ListType::Ordered => ListKind::Ordered,
            };
            let inner = BlockContext {
                list: Some(kind),
                ..ctx
            };
            for child in node.children() {
                collect_blocks(child, inner, blocks);
            }
        }
        NodeValue::BlockQuote => {
            let inner = BlockContext { quote: true, ..ctx };
            for child in node.children() {
                collect_blocks(child, inner, blocks);
            }
        }
        NodeValue::CodeBlock(code) => {
            let language = code
                .info
                .split_whitespace()
                .next()
                .map(str::to_string);
            let literal = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
            blocks.push(Block::code(language, literal));
        }
        NodeValue::ThematicBreak => blocks.push(Block::HorizontalRule),
        NodeValue::HtmlBlock(html) => html_block(&html.literal, ctx, blocks),
        _ => {
            for child in node.children() {
                collect_blocks(child, ctx, blocks);
            }
        }
    }
}

/// Raw HTML blocks: alignment wrappers hold markup that is parsed in turn,
/// anything else goes through the HTML reader
fn html_block(literal: &str, ctx: BlockContext, blocks: &mut Vec<Block>) {
    if let Some((alignment, inner)) = alignment_wrapper(literal) {
        let mut inner_blocks = Vec::new();
        parse_blocks(inner, alignment, &mut inner_blocks);
        for block in inner_blocks {
            blocks.push(match (ctx.list, ctx.quote) {
                (None, false) => block,
                _ => ctx.text_block(
                    BlockType::Paragraph,
                    block.content().map(<[Span]>::to_vec).unwrap_or_default(),
                ),
            });
        }
        return;
    }

    match parse_fragment(literal, false) {
        Ok(nodes) => blocks.extend(blocks_from_nodes(&nodes)),
        Err(err) => tracing::debug!(error = %err, "skipping unreadable html block"),
    }
}

/// Split `<div style="text-align: X">inner</div>` into its alignment and
/// inner markup
fn alignment_wrapper(literal: &str) -> Option<(Alignment, &str)> {
    let trimmed = literal.trim();
    let body = trimmed.strip_suffix("</div>")?;
    let open_end = body.find('>')?;
    let open_tag = &body[..=open_end];
    if !open_tag.starts_with("<div") {
        return None;
    }

    let nodes = parse_fragment(&format!("{open_tag}</div>"), false).ok()?;
    let alignment = match nodes.as_slice() {
        [RenderNode::Element(div)] => div.style("text-align").and_then(Alignment::parse)?,
        _ => return None,
    };
    Some((alignment, &body[open_end + 1..]))
}

fn inline_content<'a>(node: &'a AstNode<'a>) -> Vec<Span> {
    let mut collector = InlineCollector::default();
    for child in node.children() {
        collector.collect(child, MarkSet::empty(), None);
    }
    collector.spans
}

#[derive(Default)]
struct InlineCollector {
    spans: Vec<Span>,
    /// Marks opened by raw inline tags such as `<sup>`, which comrak reports
    /// as separate open and close events
    raw_marks: Vec<Mark>,
}

impl InlineCollector {
    fn push_text(&mut self, text: &str, marks: MarkSet, link: Option<&str>) {
        self.spans.push(Span {
            text: text.to_string(),
            marks: marks.union(MarkSet::of(&self.raw_marks)),
            link: link.map(str::to_string),
        });
    }

    fn collect<'a>(&mut self, node: &'a AstNode<'a>, marks: MarkSet, link: Option<&str>) {
        let data = node.data.borrow();
        let (marks, link) = match &data.value {
            NodeValue::Text(text) => return self.push_text(text, marks, link),
            NodeValue::Code(code) => return self.push_text(&code.literal, marks, link),
            NodeValue::SoftBreak | NodeValue::LineBreak => return self.push_text(" ", marks, link),
            NodeValue::HtmlInline(raw) => return self.raw_tag(raw),
            NodeValue::Emph => (marks.with(Mark::Italic), link),
            NodeValue::Strong => (marks.with(Mark::Bold), link),
            NodeValue::Strikethrough => (marks.with(Mark::Strike), link),
            NodeValue::Link(target) => {
                for child in node.children() {
                    self.collect(child, marks, Some(&target.url));
                }
                return;
            }
            _ => (marks, link),
        };
        for child in node.children() {
            self.collect(child, marks, link);
        }
    }

    fn raw_tag(&mut self, raw: &str) {
        let raw = raw.trim();
        let (closing, rest) = match raw.strip_prefix("</") {
            Some(rest) => (true, rest),
            None => match raw.strip_prefix('<') {
                Some(rest) => (false, rest),
                None => return,
            },
        };
        let name: String = rest
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        let Some(mark) = Mark::from_tag(&name) else {
            return;
        };
        if closing {
            if let Some(position) = self.raw_marks.iter().rposition(|open| *open == mark) {
                self.raw_marks.remove(position);
            }
        } else if !raw.ends_with("/>") {
            self.raw_marks.push(mark);
        }
    }
}
