//! Gurklang documentation tooling.
//!
//! - [`definitions`]: the documentation records of library names
//! - [`codeblock`]: code samples rendered as token spans
//! - [`content`]: fenced code, math and admonition blocks in page content
//! - [`tooltip`]: tooltips attached to documented names in code samples
//! - [`toc`] / [`app`]: the collapsible table of contents and the viewer
//!   that swaps pages and runs the [`hooks`]
//! - [`site`]: the static site build

pub mod app;
pub mod bundle;
pub mod codeblock;
pub mod config;
pub mod content;
pub mod definitions;
pub mod dom;
pub mod hooks;
pub mod layout;
pub mod markup;
pub mod math;
pub mod page;
pub mod ready;
pub mod render;
pub mod site;
pub mod toc;
pub mod tooltip;
