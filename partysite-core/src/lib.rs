//! # partysite-core
//!
//! Core library for the partysite static site generator.
//!
//! This crate provides the fundamental building blocks for parsing
//! frontmatter and markdown, managing site configuration, and running the
//! filesystem stages of a build.

pub mod builder;
pub mod config;
pub mod frontmatter;
pub mod markdown;
pub mod models;

pub use builder::{BuildError, SiteBuilder};
pub use config::{Config, ConfigError, OutputEncoding};
pub use frontmatter::{Frontmatter, FrontmatterError};
pub use markdown::MarkdownProcessor;
pub use models::Page;
