// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-platform composition for the new-post flow
//!
//! Runs the transform once per selected platform and checks each result
//! against that platform's budget.

use crate::transform::{Result, TextTransform, TransformError, TransformOptions, Tone};
use postcraft_core::{Platform, PlatformConstraint};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedText {
    pub text: String,
    pub constraint: PlatformConstraint,
    /// The transform failed and `text` is the untouched input
    pub fallback: bool,
}

impl ComposedText {
    fn new(platform: Platform, text: String, fallback: bool) -> Self {
        let constraint = PlatformConstraint::new(platform, text.graphemes(true).count());
        Self {
            text,
            constraint,
            fallback,
        }
    }
}

/// Transform `raw` for every platform, in platform order
///
/// A failing or slow transform does not sink the whole batch: that
/// platform keeps the raw text and is flagged as a fallback. Blank input
/// is rejected up front.
pub async fn compose_for_platforms(
    transform: &dyn TextTransform,
    raw: &str,
    platforms: &BTreeSet<Platform>,
    tone: Tone,
    limit: Duration,
) -> Result<BTreeMap<Platform, ComposedText>> {
    if raw.trim().is_empty() {
        return Err(TransformError::EmptyInput);
    }

    let mut composed = BTreeMap::new();
    for &platform in platforms {
        let options = TransformOptions::new(platform, tone);
        let outcome = match timeout(limit, transform.transform(raw, options)).await {
            Ok(result) => result,
            Err(_) => Err(TransformError::TimedOut {
                platform,
                millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        let text = match outcome {
            Ok(text) => {
                debug!(transform = transform.name(), %platform, %tone, "text transformed");
                ComposedText::new(platform, text, false)
            }
            Err(err) => {
                warn!(transform = transform.name(), %platform, error = %err, "transform failed, keeping raw text");
                ComposedText::new(platform, raw.to_string(), true)
            }
        };
        composed.insert(platform, text);
    }
    Ok(composed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateTransform;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct Stalled;

    #[async_trait]
    impl TextTransform for Stalled {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn transform(&self, _raw: &str, _options: TransformOptions) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    struct Down;

    #[async_trait]
    impl TextTransform for Down {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn transform(&self, _raw: &str, options: TransformOptions) -> Result<String> {
            match options.platform {
                Platform::Twitter => Err(TransformError::Unavailable("503".into())),
                Platform::LinkedIn => Ok("fine".into()),
            }
        }
    }

    fn both() -> BTreeSet<Platform> {
        Platform::ALL.into_iter().collect()
    }

    #[tokio::test]
    async fn test_compose_with_templates() {
        let composed = compose_for_platforms(
            &TemplateTransform::new(),
            "hi",
            &both(),
            Tone::Casual,
            Duration::from_secs(1),
        )
        .await
        .unwrap();
        assert_eq!(composed.len(), 2);
        assert_eq!(composed[&Platform::Twitter].text, "Just saying... hi 👀");
        assert!(!composed[&Platform::LinkedIn].fallback);
        assert_eq!(composed[&Platform::Twitter].constraint.limit, 280);
    }

    #[tokio::test]
    async fn test_failed_platform_falls_back() {
        let composed =
            compose_for_platforms(&Down, "raw", &both(), Tone::Witty, Duration::from_secs(1))
                .await
                .unwrap();
        assert_eq!(
            composed[&Platform::Twitter],
            ComposedText {
                text: "raw".into(),
                constraint: PlatformConstraint::new(Platform::Twitter, 3),
                fallback: true,
            }
        );
        assert_eq!(composed[&Platform::LinkedIn].text, "fine");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_transform_times_out() {
        let platforms = [Platform::LinkedIn].into_iter().collect();
        let composed = compose_for_platforms(
            &Stalled,
            "raw",
            &platforms,
            Tone::Professional,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert!(composed[&Platform::LinkedIn].fallback);
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let result = compose_for_platforms(
            &TemplateTransform::new(),
            " ",
            &both(),
            Tone::Casual,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(result, Err(TransformError::EmptyInput));
    }
}
