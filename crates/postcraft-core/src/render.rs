// SPDX-License-Identifier: AGPL-3.0-or-later
//! Render form
//!
//! An element tree in the shape a rich-text view displays, built from a
//! [`Document`] and printable as an HTML fragment. The markup engine
//! consumes this tree, and the HTML reader produces one from a string.

use crate::ast::{Block, Document, ListKind, Mark, Span};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderNode {
    Element(Element),
    Text(String),
}

impl RenderNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            RenderNode::Element(element) => Some(element),
            RenderNode::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            RenderNode::Element(element) => element.text_content(),
            RenderNode::Text(text) => text.clone(),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Element(element) => element.write_html(out),
            RenderNode::Text(text) => out.push_str(&escape_text(text)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<RenderNode>) -> Self {
        self.children = children;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Value of a single inline style property
    pub fn style(&self, property: &str) -> Option<&str> {
        self.attribute("style")?.split(';').find_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case(property)
                .then(|| value.trim())
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class").unwrap_or_default().split_whitespace()
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        self.children.iter().map(RenderNode::text_content).collect()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(RenderNode::as_element)
    }

    pub fn is_void(&self) -> bool {
        is_void_tag(&self.tag)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Children printed as HTML, without this element's own tags
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.write_html(&mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        out.push('>');
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.write_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "hr" | "br" | "img" | "input" | "meta" | "link" | "wbr")
}

/// Top-level nodes of the render form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderTree {
    pub nodes: Vec<RenderNode>,
}

impl RenderTree {
    pub fn from_document(doc: &Document) -> Self {
        let mut nodes = Vec::new();
        let blocks = doc.blocks();
        let mut index = 0;

        while index < blocks.len() {
            match &blocks[index] {
                Block::ListItem { kind, .. } => {
                    let kind = *kind;
                    let mut items = Vec::new();
                    while let Some(Block::ListItem { kind: k, content }) = blocks.get(index) {
                        if *k != kind {
                            break;
                        }
                        let paragraph = Element::new("p").with_children(inline_nodes(content));
                        items.push(RenderNode::Element(
                            Element::new("li").with_children(vec![RenderNode::Element(paragraph)]),
                        ));
                        index += 1;
                    }
                    let tag = match kind {
                        ListKind::Bullet => "ul",
                        ListKind::Ordered => "ol",
                    };
                    nodes.push(RenderNode::Element(Element::new(tag).with_children(items)));
                }
                Block::BlockQuote { .. } => {
                    let mut paragraphs = Vec::new();
                    while let Some(Block::BlockQuote { content }) = blocks.get(index) {
                        paragraphs.push(RenderNode::Element(
                            Element::new("p").with_children(inline_nodes(content)),
                        ));
                        index += 1;
                    }
                    nodes.push(RenderNode::Element(
                        Element::new("blockquote").with_children(paragraphs),
                    ));
                }
                block => {
                    nodes.push(RenderNode::Element(block_element(block)));
                    index += 1;
                }
            }
        }

        Self { nodes }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(RenderNode::as_element)
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.write_html(&mut out);
        }
        out
    }
}

fn block_element(block: &Block) -> Element {
    match block {
        Block::Paragraph { content, alignment } => {
            aligned(Element::new("p"), alignment.as_str(), alignment.is_default())
                .with_children(inline_nodes(content))
        }
        Block::Heading {
            level,
            content,
            alignment,
        } => aligned(
            Element::new(format!("h{}", level.level())),
            alignment.as_str(),
            alignment.is_default(),
        )
        .with_children(inline_nodes(content)),
        Block::CodeBlock { language, code } => {
            let mut inner = Element::new("code");
            if let Some(language) = language {
                inner = inner.with_attribute("class", format!("language-{language}"));
            }
            let inner = inner.with_children(vec![RenderNode::Text(code.clone())]);
            Element::new("pre").with_children(vec![RenderNode::Element(inner)])
        }
        Block::HorizontalRule => Element::new("hr"),
        // Grouped by the caller; a lone item still renders as its container
        Block::ListItem { kind, content } => {
            let item = Element::new("li").with_children(vec![RenderNode::Element(
                Element::new("p").with_children(inline_nodes(content)),
            )]);
            let tag = match kind {
                ListKind::Bullet => "ul",
                ListKind::Ordered => "ol",
            };
            Element::new(tag).with_children(vec![RenderNode::Element(item)])
        }
        Block::BlockQuote { content } => Element::new("blockquote").with_children(vec![
            RenderNode::Element(Element::new("p").with_children(inline_nodes(content))),
        ]),
    }
}

fn aligned(element: Element, alignment: &str, is_default: bool) -> Element {
    if is_default {
        element
    } else {
        element.with_attribute("style", format!("text-align: {alignment}"))
    }
}

/// One open inline wrapper: a link or a mark
#[derive(Debug, Clone, PartialEq, Eq)]
enum Wrapper {
    Link(String),
    Mark(Mark),
}

impl Wrapper {
    fn element(&self) -> Element {
        match self {
            Wrapper::Link(href) => Element::new("a").with_attribute("href", href.clone()),
            Wrapper::Mark(mark) => Element::new(mark.tag()),
        }
    }
}

fn wrappers_of(span: &Span) -> Vec<Wrapper> {
    span.link
        .iter()
        .map(|href| Wrapper::Link(href.clone()))
        .chain(span.marks.iter().map(Wrapper::Mark))
        .collect()
}

/// Build inline nodes for a run of spans
///
/// Wrappers shared with the previous span stay open, so `**a _b_**` becomes
/// one `<strong>` around both runs. Links are always the outermost wrapper.
pub(crate) fn inline_nodes(spans: &[Span]) -> Vec<RenderNode> {
    // stack[0] is the synthetic root
    let mut stack: Vec<(Option<Wrapper>, Vec<RenderNode>)> = vec![(None, Vec::new())];

    for span in spans {
        let wanted = wrappers_of(span);
        let open: Vec<&Wrapper> = stack.iter().skip(1).filter_map(|(w, _)| w.as_ref()).collect();
        let shared = open
            .iter()
            .zip(wanted.iter())
            .take_while(|(a, b)| **a == *b)
            .count();

        while stack.len() > shared + 1 {
            close_top(&mut stack);
        }
        for wrapper in wanted.into_iter().skip(shared) {
            stack.push((Some(wrapper), Vec::new()));
        }
        if let Some((_, children)) = stack.last_mut() {
            children.push(RenderNode::Text(span.text.clone()));
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|(_, nodes)| nodes).unwrap_or_default()
}

fn close_top(stack: &mut Vec<(Option<Wrapper>, Vec<RenderNode>)>) {
    if let Some((Some(wrapper), children)) = stack.pop() {
        let element = wrapper.element().with_children(children);
        if let Some((_, parent)) = stack.last_mut() {
            parent.push(RenderNode::Element(element));
        }
    }
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
