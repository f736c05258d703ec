// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conversion benchmarks
//!
//! Target: a LinkedIn-sized post converts in well under a keystroke

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use postcraft_core::formats::{HtmlHandler, MarkdownHandler};
use postcraft_core::markup::serialize;
use postcraft_core::{ParseConfig, Parser, RenderConfig, Renderer};

fn generate_post(paragraphs: usize) -> String {
    let mut source = String::from("# Quarterly update\n\n");
    for i in 0..paragraphs {
        source.push_str(&format!(
            "Paragraph {i} talks about **growth** and _strategy_ with a \
             [link](https://example.com/{i}) and E=mc<sup>2</sup>.\n\n"
        ));
        if i % 5 == 0 {
            source.push_str("- first point\n- second point\n\n");
        }
        if i % 7 == 0 {
            source.push_str("<div style=\"text-align: center\">Centered ~~note~~</div>\n\n");
        }
    }
    source.push_str("```rust\nfn main() {}\n```\n");
    source
}

fn bench_markdown_parse(c: &mut Criterion) {
    let source = generate_post(40);
    let handler = MarkdownHandler::new();
    let config = ParseConfig::default();
    c.bench_function("markdown_parse_40_paragraphs", |b| {
        b.iter(|| handler.parse(black_box(&source), &config))
    });
}

fn bench_serialize(c: &mut Criterion) {
    let doc = MarkdownHandler::new()
        .parse(&generate_post(40), &ParseConfig::default())
        .unwrap();
    c.bench_function("markup_serialize_40_paragraphs", |b| {
        b.iter(|| serialize(black_box(&doc)))
    });
}

fn bench_html_render(c: &mut Criterion) {
    let doc = MarkdownHandler::new()
        .parse(&generate_post(40), &ParseConfig::default())
        .unwrap();
    let handler = HtmlHandler::new();
    let config = RenderConfig::default();
    c.bench_function("html_render_40_paragraphs", |b| {
        b.iter(|| handler.render(black_box(&doc), &config))
    });
}

criterion_group!(benches, bench_markdown_parse, bench_serialize, bench_html_render);
criterion_main!(benches);
