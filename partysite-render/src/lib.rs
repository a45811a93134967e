//! # partysite-render
//!
//! Template rendering library for partysite.
//!
//! This crate renders pages through user-supplied minijinja templates and
//! writes the result in the configured output encoding.

pub mod encoding;
pub mod templates;

pub use encoding::encode;
pub use templates::{RenderOptions, SiteRenderer, TemplateError};
