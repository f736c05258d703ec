// SPDX-License-Identifier: AGPL-3.0-or-later
//! Markup Conversion Engine
//!
//! Deterministic conversion of a render tree into the portable markup form.
//! Conversion walks the tree bottom-up: each element's children are
//! converted first, then the first matching [`MarkupRule`] (or the
//! structural default for the tag) turns that content into markup. Block
//! outputs carry surrounding newlines which are collapsed when joined, so
//! blocks end up separated by exactly one blank line.

mod escape;
mod options;
mod rules;

pub use escape::{escape_href, escape_markup};
pub use options::MarkupOptions;
pub use rules::{AlignedBlockRule, FencedCodeBlockRule, KeepRule, MarkupRule};

use crate::ast::Document;
use crate::render::{Element, RenderNode, RenderTree};
pub(crate) use rules::heading_level;

/// Tags emitted verbatim by default
pub const KEPT_TAGS: [&str; 3] = ["sup", "sub", "kbd"];

/// Where an element sits in the tree
#[derive(Debug, Clone, Copy, Default)]
pub struct Context<'a> {
    pub parent: Option<&'a Element>,
    /// Position among the parent's element children
    pub index: usize,
    /// Inside `pre` or `code`: text is emitted without escaping
    pub in_code: bool,
}

impl Context<'_> {
    fn has_next_sibling(&self) -> bool {
        self.parent
            .map(|parent| self.index + 1 < parent.child_elements().count())
            .unwrap_or(false)
    }
}

pub struct MarkupConverter {
    options: MarkupOptions,
    rules: Vec<Box<dyn MarkupRule>>,
}

impl Default for MarkupConverter {
    fn default() -> Self {
        Self::new(MarkupOptions::default())
    }
}

impl std::fmt::Debug for MarkupConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupConverter")
            .field("options", &self.options)
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl MarkupConverter {
    /// Converter with the default rule set: preserved tags, aligned blocks,
    /// fenced code
    pub fn new(options: MarkupOptions) -> Self {
        Self {
            options,
            rules: vec![
                Box::new(KeepRule::new(KEPT_TAGS)),
                Box::new(AlignedBlockRule),
                Box::new(FencedCodeBlockRule),
            ],
        }
    }

    /// Converter without any rules; every node uses the structural default
    pub fn bare(options: MarkupOptions) -> Self {
        Self {
            options,
            rules: Vec::new(),
        }
    }

    pub fn options(&self) -> &MarkupOptions {
        &self.options
    }

    /// Add a rule ahead of all existing rules
    pub fn add_rule(&mut self, rule: Box<dyn MarkupRule>) -> &mut Self {
        self.rules.insert(0, rule);
        self
    }

    /// Emit the given tags as raw HTML, after all existing rules
    pub fn keep<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(Box::new(KeepRule::new(tags)));
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Serialize a render tree; an empty tree yields an empty string
    pub fn serialize(&self, tree: &RenderTree) -> String {
        let output = self.convert_nodes(&tree.nodes, Context::default());
        finish(&output)
    }

    pub fn serialize_document(&self, doc: &Document) -> String {
        self.serialize(&RenderTree::from_document(doc))
    }

    /// Serialize a single element subtree
    pub fn serialize_element(&self, element: &Element) -> String {
        finish(&self.convert_element(element, &Context::default()))
    }

    fn convert_nodes(&self, nodes: &[RenderNode], ctx: Context<'_>) -> String {
        let mut output = String::new();
        let mut index = 0;
        for node in nodes {
            let replacement = match node {
                RenderNode::Text(text) if ctx.in_code => text.clone(),
                RenderNode::Text(text) => escape_markup(text),
                RenderNode::Element(element) => {
                    let child_ctx = Context { index, ..ctx };
                    index += 1;
                    self.convert_element(element, &child_ctx)
                }
            };
            output = join(&output, &replacement);
        }
        output
    }

    fn convert_element(&self, element: &Element, ctx: &Context<'_>) -> String {
        let inner_ctx = Context {
            parent: Some(element),
            index: 0,
            in_code: ctx.in_code || element.tag == "pre" || element.tag == "code",
        };
        let content = self.convert_nodes(&element.children, inner_ctx);

        match self.rules.iter().find(|rule| rule.matches(element, ctx)) {
            Some(rule) => rule.replacement(&content, element, ctx, self),
            None => self.structural(&content, element, ctx),
        }
    }

    /// Default markup for an element, ignoring all rules
    pub fn structural(&self, content: &str, element: &Element, ctx: &Context<'_>) -> String {
        let tag = element.tag.as_str();
        if let Some(level) = heading_level(tag) {
            return format!("\n\n{} {}\n\n", "#".repeat(level), content.trim());
        }

        match tag {
            "p" | "div" | "section" | "article" | "ul" | "ol" => format!("\n\n{content}\n\n"),
            "br" => format!("{}\n", self.options.br),
            "hr" => format!("\n\n{}\n\n", self.options.hr),
            "li" => self.list_item(content, ctx),
            "blockquote" => {
                let quoted = content
                    .trim_matches('\n')
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("\n\n{quoted}\n\n")
            }
            "pre" => {
                let code = element.text_content();
                let indented = code
                    .strip_suffix('\n')
                    .unwrap_or(&code)
                    .lines()
                    .map(|line| format!("    {line}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("\n\n{indented}\n\n")
            }
            "code" => inline_code(&element.text_content()),
            "strong" | "b" => flanked(content, &self.options.strong_delimiter),
            "em" | "i" => flanked(content, &self.options.em_delimiter),
            "s" | "del" | "strike" => flanked(content, &self.options.strike_delimiter),
            "a" => match element.attribute("href") {
                Some(href) if !href.is_empty() => format!("[{content}]({})", escape_href(href)),
                _ => content.to_string(),
            },
            _ => content.to_string(),
        }
    }

    fn list_item(&self, content: &str, ctx: &Context<'_>) -> String {
        let prefix = match ctx.parent {
            Some(parent) if parent.tag == "ol" => {
                let start = parent
                    .attribute("start")
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(1);
                format!("{}. ", start + ctx.index)
            }
            _ => format!("{} ", self.options.bullet_list_marker),
        };
        let indent = " ".repeat(prefix.chars().count());

        let body = content
            .trim_matches('\n')
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                if i == 0 || line.is_empty() {
                    line.to_string()
                } else {
                    format!("{indent}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let separator = if ctx.has_next_sibling() { "\n" } else { "" };
        format!("{prefix}{body}{separator}")
    }
}

/// Serialize a document with default options
pub fn serialize(doc: &Document) -> String {
    MarkupConverter::default().serialize_document(doc)
}

/// Concatenate two outputs, collapsing the newlines at the seam to at most
/// one blank line
fn join(output: &str, addition: &str) -> String {
    let head = output.trim_end_matches('\n');
    let tail = addition.trim_start_matches('\n');
    let trailing = output.len() - head.len();
    let leading = addition.len() - tail.len();
    let separator = "\n".repeat(trailing.max(leading).min(2));
    format!("{head}{separator}{tail}")
}

fn finish(output: &str) -> String {
    output
        .trim_start_matches(['\t', '\r', '\n'])
        .trim_end()
        .to_string()
}

/// Wrap `content` in `delimiter`, moving flanking whitespace outside
fn flanked(content: &str, delimiter: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }
    let leading = &content[..content.len() - content.trim_start().len()];
    let trailing = &content[content.trim_end().len()..];
    format!("{leading}{delimiter}{trimmed}{delimiter}{trailing}")
}

fn inline_code(code: &str) -> String {
    if code.is_empty() {
        return String::new();
    }
    let code = code.replace(['\r', '\n'], " ");
    let mut ticks = 1;
    while code.contains(&"`".repeat(ticks)) {
        ticks += 1;
    }
    let fence = "`".repeat(ticks);
    let pad = if code.starts_with('`') || code.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{code}{pad}{fence}")
}
