// SPDX-License-Identifier: AGPL-3.0-or-later
//! Render-form (HTML fragment) handler
//!
//! Reads the HTML fragments produced by rich-text views into a render tree
//! and from there into a [`Document`]. Parsing is html5ever's; only the
//! fragment subset the editor emits is understood structurally and unknown
//! elements contribute their text. Strict parsing rejects unbalanced tags,
//! lenient parsing repairs them.

use crate::ast::{
    Alignment, Block, BlockType, Document, HeadingLevel, ListKind, Mark, MarkSet, SourceFormat,
    Span,
};
use crate::markup::heading_level;
use crate::render::{is_void_tag, Element, RenderNode, RenderTree};
use crate::traits::{ConversionError, ParseConfig, Parser, RenderConfig, Renderer, Result};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use html5ever::{local_name, namespace_url, ns, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// HTML format handler
pub struct HtmlHandler;

impl HtmlHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HtmlHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for HtmlHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Html
    }

    fn parse(&self, input: &str, config: &ParseConfig) -> Result<Document> {
        config.check_size(input)?;
        let nodes = parse_fragment(input, config.strict)?;
        Ok(document_from_nodes(&nodes))
    }
}

impl Renderer for HtmlHandler {
    fn format(&self) -> SourceFormat {
        SourceFormat::Html
    }

    fn render(&self, doc: &Document, _config: &RenderConfig) -> Result<String> {
        Ok(RenderTree::from_document(doc).to_html())
    }
}

/// Parse an HTML fragment into render nodes
///
/// The fragment is parsed in `<body>` context by html5ever, which repairs
/// misnested and unclosed tags the way browsers do. In strict mode the tag
/// stream is checked for balance first and any mismatch is an error.
pub fn parse_fragment(input: &str, strict: bool) -> Result<Vec<RenderNode>> {
    if strict {
        check_balance(input)?;
    }

    let context = QualName::new(None, ns!(html), local_name!("body"));
    let dom = html5ever::parse_fragment(RcDom::default(), ParseOpts::default(), context, Vec::new())
        .one(input);

    // Fragment parsing wraps the result in a synthetic <html> root
    let root = dom.document.children.borrow().first().cloned();
    Ok(root.map(|html| render_children(&html)).unwrap_or_default())
}

fn render_children(handle: &Handle) -> Vec<RenderNode> {
    handle.children.borrow().iter().filter_map(render_node).collect()
}

fn render_node(handle: &Handle) -> Option<RenderNode> {
    match &handle.data {
        NodeData::Text { contents } => Some(RenderNode::Text(contents.borrow().to_string())),
        NodeData::Element { name, attrs, .. } => {
            let mut element = Element::new(name.local.to_string());
            element.attributes = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            element.children = render_children(handle);
            Some(RenderNode::Element(element))
        }
        _ => None,
    }
}

/// Reject a fragment whose start and end tags do not pair up
fn check_balance(input: &str) -> Result<()> {
    let mut queue = BufferQueue::new();
    queue.push_back(StrTendril::from_slice(input));
    let mut tokenizer = Tokenizer::new(TagBalance::default(), TokenizerOpts::default());
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();

    let balance = &mut tokenizer.sink;
    if let Some(err) = balance.error.take() {
        return Err(err);
    }
    match balance.open.last() {
        Some((tag, line)) => Err(ConversionError::parse(
            format!("unclosed <{tag}> on line {line}"),
            None,
        )),
        None => Ok(()),
    }
}

/// Token sink tracking open elements; keeps the first mismatch
#[derive(Default)]
struct TagBalance {
    open: Vec<(String, u64)>,
    error: Option<ConversionError>,
}

impl TokenSink for TagBalance {
    type Handle = ();

    fn process_token(&mut self, token: Token, line: u64) -> TokenSinkResult<()> {
        let Token::TagToken(tag) = token else {
            return TokenSinkResult::Continue;
        };
        if self.error.is_some() {
            return TokenSinkResult::Continue;
        }
        let name = tag.name.to_string();

        match tag.kind {
            TagKind::StartTag => {
                let raw = match name.as_str() {
                    "script" => Some(RawKind::ScriptData),
                    "style" => Some(RawKind::Rawtext),
                    "title" | "textarea" => Some(RawKind::Rcdata),
                    _ => None,
                };
                if !tag.self_closing && !is_void_tag(&name) {
                    self.open.push((name, line));
                }
                if let Some(kind) = raw {
                    return TokenSinkResult::RawData(kind);
                }
            }
            TagKind::EndTag if is_void_tag(&name) => {}
            TagKind::EndTag => {
                let top = self.open.last().map(|(tag, _)| tag.clone());
                if top.as_deref() == Some(name.as_str()) {
                    self.open.pop();
                } else {
                    let expected = top
                        .map(|tag| format!(", expected </{tag}>"))
                        .unwrap_or_default();
                    self.error = Some(ConversionError::parse(
                        format!("unexpected </{name}>{expected} on line {line}"),
                        None,
                    ));
                }
            }
        }
        TokenSinkResult::Continue
    }
}

/// Block-level context inherited by nested elements
#[derive(Debug, Clone, Copy, Default)]
struct BlockContext {
    alignment: Alignment,
    quote: bool,
    list: Option<ListKind>,
}

impl BlockContext {
    fn text_block(&self, requested: BlockType, content: Vec<Span>, alignment: Alignment) -> Block {
        let block_type = match self.list {
            Some(ListKind::Bullet) => BlockType::BulletList,
            Some(ListKind::Ordered) => BlockType::OrderedList,
            None if self.quote => BlockType::BlockQuote,
            None => requested,
        };
        Block::of_type(block_type, content, alignment)
    }
}

/// Convert render nodes into a document
pub fn document_from_nodes(nodes: &[RenderNode]) -> Document {
    Document::from_blocks(blocks_from_nodes(nodes))
}

/// Convert render nodes into blocks; may be empty
pub(crate) fn blocks_from_nodes(nodes: &[RenderNode]) -> Vec<Block> {
    let mut blocks = Vec::new();
    collect_blocks(nodes, BlockContext::default(), &mut blocks);
    blocks
}

fn collect_blocks(nodes: &[RenderNode], ctx: BlockContext, blocks: &mut Vec<Block>) {
    let mut run: Vec<Span> = Vec::new();

    for node in nodes {
        let element = match node {
            RenderNode::Element(element) if is_structural(&element.tag) => element,
            inline => {
                collect_inline(inline, MarkSet::empty(), None, &mut run);
                continue;
            }
        };
        flush_run(&mut run, ctx, blocks);

        let alignment = element
            .style("text-align")
            .and_then(Alignment::parse)
            .unwrap_or(ctx.alignment);
        let tag = element.tag.as_str();

        if let Some(level) = heading_level(tag) {
            let level = HeadingLevel::from_level(u8::try_from(level).unwrap_or(u8::MAX));
            let block_type = match level {
                HeadingLevel::H1 => BlockType::Heading1,
                HeadingLevel::H2 => BlockType::Heading2,
            };
            blocks.push(ctx.text_block(block_type, inline_content(element), alignment));
            continue;
        }

        match tag {
            "p" => blocks.push(ctx.text_block(BlockType::Paragraph, inline_content(element), alignment)),
            "ul" | "ol" => {
                let kind = if tag == "ol" {
                    ListKind::Ordered
                } else {
                    ListKind::Bullet
                };
                let inner = BlockContext {
                    list: Some(kind),
                    ..ctx
                };
                for child in &element.children {
                    match child {
                        RenderNode::Element(li) if li.tag == "li" => {
                            collect_blocks(&li.children, inner, blocks)
                        }
                        other => collect_blocks(std::slice::from_ref(other), inner, blocks),
                    }
                }
            }
            "li" => {
                let inner = BlockContext {
                    list: Some(ctx.list.unwrap_or(ListKind::Bullet)),
                    ..ctx
                };
                collect_blocks(&element.children, inner, blocks);
            }
            "blockquote" => {
                let inner = BlockContext { quote: true, ..ctx };
                collect_blocks(&element.children, inner, blocks);
            }
            "pre" => blocks.push(code_block(element)),
            "hr" => blocks.push(Block::HorizontalRule),
            "head" | "script" | "style" | "title" | "template" => {}
            _ => {
                let inner = BlockContext { alignment, ..ctx };
                collect_blocks(&element.children, inner, blocks);
            }
        }
    }

    flush_run(&mut run, ctx, blocks);
}

fn flush_run(run: &mut Vec<Span>, ctx: BlockContext, blocks: &mut Vec<Block>) {
    let spans = std::mem::take(run);
    if spans.iter().all(|span| span.text.trim().is_empty()) {
        return;
    }
    blocks.push(ctx.text_block(BlockType::Paragraph, spans, ctx.alignment));
}

fn is_structural(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "li"
            | "blockquote"
            | "pre"
            | "hr"
            | "div"
            | "section"
            | "article"
            | "main"
            | "header"
            | "footer"
            | "body"
            | "html"
            | "head"
            | "script"
            | "style"
            | "title"
            | "template"
    )
}

fn inline_content(element: &Element) -> Vec<Span> {
    let mut spans = Vec::new();
    for child in &element.children {
        collect_inline(child, MarkSet::empty(), None, &mut spans);
    }
    spans
}

fn collect_inline(node: &RenderNode, marks: MarkSet, link: Option<&str>, out: &mut Vec<Span>) {
    match node {
        RenderNode::Text(text) => out.push(Span {
            text: text.replace(['\n', '\r', '\t'], " "),
            marks,
            link: link.map(str::to_string),
        }),
        RenderNode::Element(element) => {
            let tag = element.tag.as_str();
            if tag == "br" {
                out.push(Span {
                    text: " ".to_string(),
                    marks,
                    link: link.map(str::to_string),
                });
                return;
            }
            let marks = match Mark::from_tag(tag) {
                Some(mark) => marks.with(mark),
                None => marks,
            };
            let link = match tag {
                "a" => element.attribute("href").filter(|href| !href.is_empty()).or(link),
                _ => link,
            };
            for child in &element.children {
                collect_inline(child, marks, link, out);
            }
        }
    }
}

fn code_block(pre: &Element) -> Block {
    let code_child = pre.child_elements().find(|child| child.tag == "code");
    let language = code_child.and_then(|code| {
        code.classes()
            .find_map(|class| class.strip_prefix("language-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_string)
    });
    let text = pre.text_content();
    let text = text.strip_suffix('\n').unwrap_or(&text).to_string();
    Block::code(language, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> Document {
        HtmlHandler::new()
            .parse(input, &ParseConfig::default())
            .unwrap()
    }

    #[test]
    fn test_parse_paragraph_with_marks_and_link() {
        let doc = parse("<p>Hello <strong>bold <em>both</em></strong> <a href=\"https://x.example\">link</a></p>");
        assert_eq!(
            doc.blocks(),
            &[Block::paragraph(vec![
                Span::plain("Hello "),
                Span::marked("bold ", MarkSet::of(&[Mark::Bold])),
                Span::marked("both", MarkSet::of(&[Mark::Bold, Mark::Italic])),
                Span::plain(" "),
                Span::linked("link", "https://x.example"),
            ])]
        );
    }

    #[test]
    fn test_parse_structure() {
        let doc = parse(
            "<h1>T</h1><h3>Sub</h3><ul><li><p>a</p></li><li><p>b</p></li></ul>\
             <blockquote><p>q</p></blockquote><pre><code class=\"language-rust\">fn x() {}\n</code></pre><hr>",
        );
        let types: Vec<_> = doc.blocks().iter().map(Block::block_type).collect();
        assert_eq!(
            types,
            vec![
                Some(BlockType::Heading1),
                Some(BlockType::Heading2),
                Some(BlockType::BulletList),
                Some(BlockType::BulletList),
                Some(BlockType::BlockQuote),
                Some(BlockType::CodeBlock),
                None,
            ]
        );
        assert_eq!(doc.blocks()[5], Block::code(Some("rust".into()), "fn x() {}"));
    }

    #[test]
    fn test_parse_alignment_and_entities() {
        let doc = parse("<p style=\"text-align: right\">a &amp; b &lt;c&gt; &#233;&#x1F44D;</p>");
        assert_eq!(doc.blocks()[0].alignment(), Some(Alignment::Right));
        assert_eq!(doc.plain_text(), "a & b <c> é👍");
    }

    #[test]
    fn test_render_roundtrip_of_editor_output() {
        let input = "<h2 style=\"text-align: center\">Title</h2><p>x <s>y</s> <sup>2</sup></p><ol><li><p>one</p></li></ol>";
        let doc = parse(input);
        let html = HtmlHandler::new()
            .render(&doc, &RenderConfig::default())
            .unwrap();
        assert_eq!(html, input);
    }

    #[test]
    fn test_strict_rejects_unbalanced() {
        let handler = HtmlHandler::new();
        let err = handler
            .parse("<p><em>x</p>", &ParseConfig::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: unexpected </p>, expected </em> on line 1"
        );

        let err = handler
            .parse("<p>one</p>\n<p>open", &ParseConfig::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "parse error: unclosed <p> on line 2");

        // raw text is not scanned for tags
        assert!(handler
            .parse("<script>if (a<b) {}</script><p>x</p>", &ParseConfig::default())
            .is_ok());
    }

    #[test]
    fn test_lenient_repairs_unbalanced() {
        // the unclosed <em> is reopened in the next paragraph, as browsers do
        let doc = HtmlHandler::new()
            .parse("<p><em>x</p><p>y", &ParseConfig::lenient())
            .unwrap();
        let italic = MarkSet::of(&[Mark::Italic]);
        assert_eq!(
            doc.blocks(),
            &[
                Block::paragraph(vec![Span::marked("x", italic)]),
                Block::paragraph(vec![Span::marked("y", italic)]),
            ]
        );
    }

    #[test]
    fn test_named_entities_decode() {
        let doc = parse("<p>wait&hellip; now &mdash; &copy;&nbsp;2026 &eacute;t&eacute;</p>");
        assert_eq!(doc.plain_text(), "wait\u{2026} now \u{2014} \u{a9}\u{a0}2026 \u{e9}t\u{e9}");
    }

    #[test]
    fn test_comments_whitespace_and_void_tags() {
        let doc = parse("<!-- c -->\n<p>a<br>b</p>\n  <p>c<br/></p>\n");
        assert_eq!(doc.plain_text(), "a b\nc ");
    }

    #[test]
    fn test_top_level_text_becomes_paragraph() {
        assert_eq!(parse("just text").plain_text(), "just text");
        assert_eq!(parse("").blocks(), &[Block::empty_paragraph()]);
    }

    #[test]
    fn test_input_too_large() {
        let config = ParseConfig {
            max_input_bytes: 4,
            ..ParseConfig::default()
        };
        assert!(matches!(
            HtmlHandler::new().parse("<p>big</p>", &config),
            Err(ConversionError::InputTooLarge { .. })
        ));
    }
}
