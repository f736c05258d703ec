// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conversion rules for special node shapes
//!
//! Rules are consulted in priority order before the structural defaults;
//! the first rule whose [`MarkupRule::matches`] returns true produces the
//! node's markup.

use super::{Context, MarkupConverter};
use crate::ast::Alignment;
use crate::render::Element;

pub trait MarkupRule: Send + Sync {
    /// Identifier used in logs and for replacing rules
    fn name(&self) -> &str;

    fn matches(&self, element: &Element, ctx: &Context<'_>) -> bool;

    /// Markup for `element`; `content` is its already-converted children
    fn replacement(
        &self,
        content: &str,
        element: &Element,
        ctx: &Context<'_>,
        converter: &MarkupConverter,
    ) -> String;
}

/// Emit elements with an allowlisted tag as raw HTML
#[derive(Debug, Clone)]
pub struct KeepRule {
    tags: Vec<String>,
}

impl KeepRule {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(|tag| tag.into().to_ascii_lowercase()).collect(),
        }
    }
}

impl MarkupRule for KeepRule {
    fn name(&self) -> &str {
        "keep"
    }

    fn matches(&self, element: &Element, _ctx: &Context<'_>) -> bool {
        self.tags.iter().any(|tag| element.tag.eq_ignore_ascii_case(tag))
    }

    fn replacement(
        &self,
        _content: &str,
        element: &Element,
        _ctx: &Context<'_>,
        _converter: &MarkupConverter,
    ) -> String {
        if is_block_tag(&element.tag) {
            format!("\n\n{}\n\n", element.to_html())
        } else {
            element.to_html()
        }
    }
}

/// Wrap paragraphs and headings with a non-left alignment in an explicit
/// `<div style="text-align: ...">` container
#[derive(Debug, Clone, Default)]
pub struct AlignedBlockRule;

impl AlignedBlockRule {
    fn alignment(element: &Element) -> Option<Alignment> {
        element
            .style("text-align")
            .and_then(Alignment::parse)
            .filter(|alignment| !alignment.is_default())
    }
}

impl MarkupRule for AlignedBlockRule {
    fn name(&self) -> &str {
        "aligned_block"
    }

    fn matches(&self, element: &Element, _ctx: &Context<'_>) -> bool {
        let tag = element.tag.as_str();
        (tag == "p" || heading_level(tag).is_some()) && Self::alignment(element).is_some()
    }

    fn replacement(
        &self,
        content: &str,
        element: &Element,
        ctx: &Context<'_>,
        converter: &MarkupConverter,
    ) -> String {
        let inner = converter.structural(content, element, ctx);
        match Self::alignment(element) {
            Some(alignment) => format!(
                "\n\n<div style=\"text-align: {}\">{}</div>\n\n",
                alignment.as_str(),
                inner.trim_matches('\n')
            ),
            None => inner,
        }
    }
}

/// `<pre><code class="language-x">` as a fenced block tagged with `x`
#[derive(Debug, Clone, Default)]
pub struct FencedCodeBlockRule;

impl FencedCodeBlockRule {
    fn code_child(element: &Element) -> Option<&Element> {
        match element.children.as_slice() {
            [node] => node.as_element().filter(|child| child.tag == "code"),
            _ => None,
        }
    }
}

impl MarkupRule for FencedCodeBlockRule {
    fn name(&self) -> &str {
        "fenced_code_block"
    }

    fn matches(&self, element: &Element, _ctx: &Context<'_>) -> bool {
        element.tag == "pre" && Self::code_child(element).is_some()
    }

    fn replacement(
        &self,
        _content: &str,
        element: &Element,
        _ctx: &Context<'_>,
        converter: &MarkupConverter,
    ) -> String {
        let Some(code) = Self::code_child(element) else {
            return String::new();
        };
        let language = code
            .classes()
            .find_map(|class| class.strip_prefix("language-"))
            .unwrap_or_default();
        let text = code.text_content();

        let (fence_char, min_len) = converter.options().fence_parts();
        let longest_run = longest_run_of(&text, fence_char);
        let fence: String = std::iter::repeat(fence_char)
            .take(min_len.max(longest_run + 1))
            .collect();

        let body = text.strip_suffix('\n').unwrap_or(&text);
        format!("\n\n{fence}{language}\n{body}\n{fence}\n\n")
    }
}

fn longest_run_of(text: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

pub(crate) fn heading_level(tag: &str) -> Option<usize> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

pub(crate) fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "section"
            | "article"
            | "blockquote"
            | "pre"
            | "ul"
            | "ol"
            | "li"
            | "hr"
            | "table"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}
