// SPDX-License-Identifier: AGPL-3.0-or-later
//! Postcraft preview
//!
//! Loads a draft from disk and prints its render form, markup form and
//! per-platform budgets as JSON.
//!
//! ```text
//! postcraft-preview <file> [twitter|linkedin ...] [--tone <tone>] [--config <path>]
//! ```

use anyhow::Context;
use clap::Parser;
use postcraft_core::file_ops::{self, FileInfo};
use postcraft_core::model::DocumentModel;
use postcraft_core::platform::{self, Platform, PlatformConstraint};
use postcraft_core::{EditingSurface, EditorOutput, MarkupConverter, SourceFormat};
use postcraft_pipeline::{compose_for_platforms, ComposedText, TemplateTransform, Tone};
use postcraft_session::SessionConfig;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(version, about = "Postcraft preview - render, markup and platform budgets for a draft", long_about = None)]
struct Args {
    /// Draft to load (.html, .htm, .md or .markdown)
    path: PathBuf,

    /// Platforms to evaluate; all of them when none are given
    #[arg(value_parser = parse_platform)]
    platforms: Vec<Platform>,

    /// Also compose per-platform text in this tone
    #[arg(long, value_parser = parse_tone)]
    tone: Option<Tone>,

    /// Session configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn platforms(&self) -> BTreeSet<Platform> {
        if self.platforms.is_empty() {
            Platform::ALL.into_iter().collect()
        } else {
            self.platforms.iter().copied().collect()
        }
    }
}

fn parse_platform(name: &str) -> Result<Platform, String> {
    Platform::parse(name).ok_or_else(|| format!("unknown platform {name}"))
}

fn parse_tone(name: &str) -> Result<Tone, String> {
    Tone::parse(name).ok_or_else(|| format!("unknown tone {name}"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Preview {
    path: String,
    format: SourceFormat,
    degraded: bool,
    #[serde(flatten)]
    output: EditorOutput,
    platform_constraints: BTreeMap<Platform, PlatformConstraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    composed: Option<BTreeMap<Platform, ComposedText>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postcraft=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Postcraft preview v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let platforms = args.platforms();
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let opened = file_ops::open_file_with_config(&args.path, &config.parse)
        .with_context(|| format!("opening {}", args.path.display()))?;
    let FileInfo { path, format, .. } = opened.file_info;
    let surface = EditingSurface::new(
        DocumentModel::from_document(opened.document),
        MarkupConverter::new(config.markup.clone()),
    );
    let output = surface.output().clone();

    let composed = match args.tone {
        Some(tone) => Some(
            compose_for_platforms(
                &TemplateTransform::new(),
                &output.markup_form,
                &platforms,
                tone,
                config.transform_timeout(),
            )
            .await?,
        ),
        None => None,
    };

    let preview = Preview {
        path,
        format,
        degraded: opened.degraded,
        platform_constraints: platform::evaluate(output.plain_text_length, &platforms),
        output,
        composed,
    };
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("postcraft-preview").chain(list.iter().copied()))
    }

    #[test]
    fn test_args_default_to_all_platforms() {
        let parsed = args(&["post.md"]).unwrap();
        assert_eq!(parsed.path, PathBuf::from("post.md"));
        assert_eq!(parsed.platforms().len(), 2);
        assert_eq!(parsed.tone, None);
    }

    #[test]
    fn test_args_with_options() {
        let parsed = args(&["--tone", "witty", "post.html", "twitter", "--config", "p.toml"]).unwrap();
        assert_eq!(parsed.path, PathBuf::from("post.html"));
        assert_eq!(parsed.platforms().into_iter().collect::<Vec<_>>(), vec![Platform::Twitter]);
        assert_eq!(parsed.tone, Some(Tone::Witty));
        assert_eq!(parsed.config, Some(PathBuf::from("p.toml")));
    }

    #[test]
    fn test_args_errors() {
        assert!(args(&[]).is_err());
        assert!(args(&["post.md", "myspace"]).is_err());
        assert!(args(&["post.md", "--tone", "angry"]).is_err());
    }

    #[test]
    fn test_args_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
