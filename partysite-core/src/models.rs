//! Content model structs for pages and the published page list.

use crate::frontmatter::Frontmatter;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

/// File name of every source document and of every rendered page.
pub const SOURCE_FILE_NAME: &str = "README.md";
pub const INDEX_FILE_NAME: &str = "index.html";

/// Template used when the frontmatter does not name one.
pub const DEFAULT_TEMPLATE: &str = "post";

/// A single post or index page in the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Source markdown file
    pub source_path: PathBuf,

    /// Rendered HTML file in the output directory
    pub destination_path: PathBuf,

    /// Relative URL of the page directory, with trailing slash
    pub url_path: String,

    /// Display title
    pub title: String,

    /// Authors in frontmatter order
    pub authors: Vec<String>,

    /// Publication date
    pub date: NaiveDate,

    /// Publication date at midnight
    pub modified_at: NaiveDateTime,

    /// Template override from frontmatter
    pub template: Option<String>,

    /// Drafts are only published in development mode
    pub draft: bool,

    /// Rendered HTML content, empty until the conversion stage
    pub content: String,
}

impl Page {
    /// Build a page from validated frontmatter. `relative` is the source
    /// path relative to the content root.
    pub fn new(
        source_path: PathBuf,
        relative: &Path,
        output_root: &Path,
        frontmatter: Frontmatter,
    ) -> Self {
        let date = frontmatter.date;
        Self {
            source_path,
            destination_path: destination_path(relative, output_root),
            url_path: url_path(relative),
            title: frontmatter.title,
            authors: frontmatter.authors,
            date,
            modified_at: date.and_time(chrono::NaiveTime::MIN),
            template: frontmatter.template,
            draft: frontmatter.draft,
            content: String::new(),
        }
    }

    /// Template name to render this page with
    pub fn template_name(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }

    /// Directory holding the source document and its sibling assets
    pub fn source_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Directory the rendered page and copied assets are written to
    pub fn destination_dir(&self) -> &Path {
        self.destination_path
            .parent()
            .unwrap_or_else(|| Path::new(""))
    }

    /// Whether this page belongs in the published set
    pub fn is_published(&self, dev: bool) -> bool {
        dev || !self.draft
    }
}

/// Output location for a source path relative to the content root.
///
/// ```
/// use partysite_core::models::destination_path;
/// use std::path::Path;
///
/// let dst = destination_path(Path::new("posts/web/xss/README.md"), Path::new("public"));
/// assert_eq!(dst, Path::new("public/posts/web/xss/index.html"));
/// ```
pub fn destination_path(relative: &Path, output_root: &Path) -> PathBuf {
    let parent = relative.parent().unwrap_or_else(|| Path::new(""));
    output_root.join(parent).join(INDEX_FILE_NAME)
}

/// Public URL for a source path relative to the content root.
///
/// The parent directory is kept and joined with `/`; the site index at the
/// content root maps to `./`.
pub fn url_path(relative: &Path) -> String {
    let segments: Vec<String> = relative
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        "./".to_string()
    } else {
        format!("{}/", segments.join("/"))
    }
}

/// Most recent first; same-date pages fall back to URL order.
pub fn recency_order(a: &Page, b: &Page) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.url_path.cmp(&b.url_path))
}

/// Sort pages most recent first
pub fn sort_by_recency(pages: &mut [Page]) {
    pages.sort_by(recency_order);
}

/// Keep the pages that are published under the given mode
pub fn published(pages: Vec<Page>, dev: bool) -> Vec<Page> {
    pages.into_iter().filter(|p| p.is_published(dev)).collect()
}
