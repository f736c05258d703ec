// SPDX-License-Identifier: AGPL-3.0-or-later
//! Format handlers for the render form and the markup form

pub mod html;
pub mod markdown;

pub use html::HtmlHandler;
pub use markdown::MarkdownHandler;
