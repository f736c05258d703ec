// SPDX-License-Identifier: AGPL-3.0-or-later
//! File operations for loading and saving drafts
//!
//! Provides:
//! - File opening with automatic format detection
//! - File saving in render (HTML) or markup form
//! - Path-based format detection from extensions
//! - Content-based format detection heuristics

use crate::ast::{Document, SourceFormat};
use crate::formats::{HtmlHandler, MarkdownHandler};
use crate::traits::{ConversionError, ParseConfig, Parser, RenderConfig, Renderer};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// File operation errors
#[derive(Debug, Error)]
pub enum FileError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Format detection failed
    #[error("Could not detect format for file: {path}")]
    UnknownFormat { path: String },

    /// Conversion error
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Result type for file operations
pub type FileResult<T> = std::result::Result<T, FileError>;

/// Metadata about an opened file
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: String,
    /// Detected or specified format
    pub format: SourceFormat,
    /// File size in bytes
    pub size: u64,
    /// Whether the file is read-only
    pub read_only: bool,
}

/// Opened document with file metadata
#[derive(Debug, Clone)]
pub struct OpenedDocument {
    pub document: Document,
    pub file_info: FileInfo,
    /// Set when the content could not be parsed and an empty document was
    /// substituted
    pub degraded: bool,
}

/// Detect format from file extension
pub fn format_from_extension(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "md" | "markdown" | "mdown" | "mkd" => Some(SourceFormat::Markdown),
        "html" | "htm" | "xhtml" => Some(SourceFormat::Html),
        _ => None,
    }
}

/// Tags that mark content as a render-form fragment when they open it
const HTML_LEADING_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "blockquote", "pre", "hr", "div",
    "html", "body", "!doctype", "!--",
];

/// Detect format from content
///
/// Content that opens with a block-level HTML tag is the render form;
/// everything else is read as markup. An alignment wrapper `<div>` only
/// counts as HTML when nothing but HTML follows it.
pub fn format_from_content(content: &str) -> SourceFormat {
    let trimmed = content.trim_start();
    let Some(rest) = trimmed.strip_prefix('<') else {
        return SourceFormat::Markdown;
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '!' || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    if !HTML_LEADING_TAGS.contains(&name.as_str()) {
        return SourceFormat::Markdown;
    }
    if name == "div" && !wraps_html(trimmed) {
        return SourceFormat::Markdown;
    }
    SourceFormat::Html
}

/// A `<div>` whose first child is itself a tag
fn wraps_html(content: &str) -> bool {
    content
        .find('>')
        .map(|end| content[end + 1..].trim_start().starts_with('<'))
        .unwrap_or(false)
}

/// Open a file and parse it to a Document
///
/// Format is detected from the file extension first, then from content.
/// Content that fails to parse yields an empty document flagged as degraded.
pub fn open_file(path: impl AsRef<Path>) -> FileResult<OpenedDocument> {
    open_file_with_config(path, &ParseConfig::default())
}

/// Open a file with custom parse configuration
pub fn open_file_with_config(
    path: impl AsRef<Path>,
    config: &ParseConfig,
) -> FileResult<OpenedDocument> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)?;
    let metadata = fs::metadata(path)?;

    let format = format_from_extension(path).unwrap_or_else(|| format_from_content(&content));
    let (document, degraded) = match parse_content(&content, format, config) {
        Ok(document) => (document, false),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not parse file, opening empty document");
            (Document::new(), true)
        }
    };

    Ok(OpenedDocument {
        document,
        file_info: FileInfo {
            path: path.to_string_lossy().to_string(),
            format,
            size: metadata.len(),
            read_only: metadata.permissions().readonly(),
        },
        degraded,
    })
}

/// Parse content in the given format
pub fn parse_content(
    content: &str,
    format: SourceFormat,
    config: &ParseConfig,
) -> FileResult<Document> {
    let doc = match format {
        SourceFormat::Html => HtmlHandler::new().parse(content, config)?,
        SourceFormat::Markdown => MarkdownHandler::new().parse(content, config)?,
    };
    Ok(doc)
}

/// Render a document in the given format
pub fn render_content(
    doc: &Document,
    format: SourceFormat,
    config: &RenderConfig,
) -> FileResult<String> {
    let output = match format {
        SourceFormat::Html => HtmlHandler::new().render(doc, config)?,
        SourceFormat::Markdown => MarkdownHandler::new().render(doc, config)?,
    };
    Ok(output)
}

/// Save a document; the format comes from the file extension
pub fn save_file(doc: &Document, path: impl AsRef<Path>) -> FileResult<()> {
    let path = path.as_ref();
    let format = format_from_extension(path).ok_or_else(|| FileError::UnknownFormat {
        path: path.to_string_lossy().to_string(),
    })?;
    save_file_as(doc, path, format, &RenderConfig::default())
}

/// Save a document in an explicit format
pub fn save_file_as(
    doc: &Document,
    path: impl AsRef<Path>,
    format: SourceFormat,
    config: &RenderConfig,
) -> FileResult<()> {
    let mut content = render_content(doc, format, config)?;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}

/// Get all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &["md", "markdown", "mdown", "mkd", "html", "htm", "xhtml"]
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_extensions().contains(&ext_lower.as_str())
}
