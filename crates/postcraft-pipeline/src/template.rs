// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rule-based transformer
//!
//! Rewrites text with fixed per-platform, per-tone templates and hashtags
//! drawn from a list of business keywords. Needs no network access.

use crate::transform::{Result, TextTransform, TransformError, TransformOptions, Tone};
use async_trait::async_trait;
use postcraft_core::platform::TWITTER_CHAR_LIMIT;
use postcraft_core::Platform;
use unicode_segmentation::UnicodeSegmentation;

/// Terms that become hashtags when they occur in the text
pub const KEYWORDS: [&str; 20] = [
    "business",
    "leadership",
    "innovation",
    "strategy",
    "growth",
    "productivity",
    "success",
    "teamwork",
    "development",
    "entrepreneurship",
    "marketing",
    "sales",
    "technology",
    "digital",
    "transformation",
    "customer",
    "experience",
    "product",
    "service",
    "solution",
];

const MAX_KEYWORDS: usize = 3;
const TWITTER_HASHTAGS: usize = 2;

/// Prefixed tweets are cut to this many characters before the suffix emoji
const PREFIXED_TWEET_BUDGET: usize = 270;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateTransform;

impl TemplateTransform {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous form of [`TextTransform::transform`]
    pub fn apply(&self, raw: &str, options: TransformOptions) -> String {
        match (options.platform, options.tone) {
            (Platform::LinkedIn, Tone::Professional) => linkedin_professional(raw),
            (Platform::LinkedIn, Tone::Casual) => format!(
                "Hey everyone! Just wanted to share something cool - {raw}\n\n\
                 Would love to hear your perspectives on this! 🙌"
            ),
            (Platform::LinkedIn, Tone::Witty) => format!(
                "Plot twist: {raw} 😎\n\n\
                 Who else has had a similar experience? Let's start a conversation!"
            ),
            (Platform::Twitter, Tone::Professional) => twitter_professional(raw),
            (Platform::Twitter, Tone::Casual) => {
                format!("{} 👀", prefixed_tweet("Just saying... ", raw))
            }
            (Platform::Twitter, Tone::Witty) => format!("{} 🔥", prefixed_tweet("Hot take: ", raw)),
        }
    }
}

#[async_trait]
impl TextTransform for TemplateTransform {
    fn name(&self) -> &'static str {
        "template"
    }

    async fn transform(&self, raw: &str, options: TransformOptions) -> Result<String> {
        if raw.trim().is_empty() {
            return Err(TransformError::EmptyInput);
        }
        Ok(self.apply(raw, options))
    }
}

/// Up to three keywords present in the text, in list order
pub fn extract_keywords(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(keyword))
        .take(MAX_KEYWORDS)
        .collect()
}

fn linkedin_professional(raw: &str) -> String {
    let mut sentences = raw.split(". ");
    let first = sentences.next().unwrap_or_default();
    let rest: Vec<&str> = sentences.collect();

    let mut body = format!("I'm excited to share that {first}. ");
    body.push_str(&rest.join(". "));

    let hashtags: Vec<String> = extract_keywords(raw)
        .into_iter()
        .map(|keyword| format!("#{}", capitalize(keyword)))
        .collect();

    format!(
        "{body}\n\nWhat are your thoughts on this?\n\n{}",
        hashtags.join(" ")
    )
}

fn twitter_professional(raw: &str) -> String {
    let hashtags = extract_keywords(raw)
        .into_iter()
        .take(TWITTER_HASHTAGS)
        .map(|keyword| format!("#{keyword}"))
        .collect::<Vec<_>>()
        .join(" ");
    let hashtag_len = char_len(&hashtags);

    let mut content = raw.to_string();
    if char_len(&content) + hashtag_len + 1 > TWITTER_CHAR_LIMIT {
        let keep = TWITTER_CHAR_LIMIT.saturating_sub(hashtag_len + ELLIPSIS.len() + 1);
        content = truncate(raw, keep);
        content.push_str(ELLIPSIS);
    }

    if hashtags.is_empty() {
        content
    } else {
        format!("{content} {hashtags}")
    }
}

fn prefixed_tweet(prefix: &str, raw: &str) -> String {
    let text = format!("{prefix}{raw}");
    if char_len(&text) <= PREFIXED_TWEET_BUDGET {
        return text;
    }
    let mut cut = truncate(&text, PREFIXED_TWEET_BUDGET - ELLIPSIS.len());
    cut.push_str(ELLIPSIS);
    cut
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn char_len(text: &str) -> usize {
    text.graphemes(true).count()
}

fn truncate(text: &str, graphemes: usize) -> String {
    text.graphemes(true).take(graphemes).collect()
}
