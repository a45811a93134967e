//! Site building stages: discovery, asset copying, conversion, static files.
//!
//! Each stage is a method on [`SiteBuilder`]; the binary runs them in order
//! and stops at the first error. Rendering lives in `partysite-render`.

use crate::{
    config::Config,
    frontmatter::{read_frontmatter, FrontmatterError},
    markdown::{highlight::css_for_theme, MarkdownProcessor},
    models::{published, sort_by_recency, Page, SOURCE_FILE_NAME},
};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Directory under the content root holding `<category>/<slug>/README.md`.
pub const POSTS_DIR: &str = "posts";

/// Directory under the output root receiving the static assets.
pub const STATIC_OUTPUT_DIR: &str = "static";

/// Stylesheet written when a highlight theme is configured.
pub const HIGHLIGHT_CSS_NAME: &str = "highlight.css";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Frontmatter error in {path:?}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("source document must be named README.md: {0:?}")]
    NotCanonical(PathBuf),

    #[error("source document is outside the content directory: {0:?}")]
    OutsideContentRoot(PathBuf),

    #[error("path is outside the static directory: {0:?}")]
    OutsideStaticRoot(PathBuf),

    #[error("post directory must contain only files: {0:?}")]
    NotAFile(PathBuf),

    #[error("static directory not found: {0:?}")]
    MissingStatic(PathBuf),

    #[error("no stylesheet for highlight theme '{0}'")]
    UnknownTheme(String),
}

trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, BuildError>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Runs the filesystem stages of a build
pub struct SiteBuilder {
    config: Config,
    processor: MarkdownProcessor,
}

impl SiteBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            processor: MarkdownProcessor::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Remove the output directory and create it empty
    pub fn reset_output(&self) -> Result<(), BuildError> {
        let output = self.config.output_dir();
        if output.exists() {
            tracing::debug!("Removing {:?}", output);
            fs::remove_dir_all(&output).at(&output)?;
        }
        fs::create_dir_all(&output).at(&output)
    }

    /// Source documents of every post, in file-name order
    pub fn discover_posts(&self) -> Result<Vec<PathBuf>, BuildError> {
        let posts_dir = self.config.content_dir().join(POSTS_DIR);
        if !posts_dir.is_dir() {
            tracing::debug!("No posts directory at {:?}", posts_dir);
            return Ok(Vec::new());
        }

        let mut sources = Vec::new();
        let walker = WalkDir::new(&posts_dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = entry?;
            if entry.depth() == 3
                && entry.file_name() == SOURCE_FILE_NAME
                && entry.file_type().is_file()
            {
                sources.push(entry.into_path());
            }
        }

        tracing::debug!("Found {} post sources", sources.len());
        Ok(sources)
    }

    /// Load a page's metadata. The body is converted later.
    pub fn load_page(&self, source_path: &Path) -> Result<Page, BuildError> {
        if source_path.file_name() != Some(OsStr::new(SOURCE_FILE_NAME)) {
            return Err(BuildError::NotCanonical(source_path.to_path_buf()));
        }

        let content_dir = self.config.content_dir();
        let relative = source_path
            .strip_prefix(&content_dir)
            .map_err(|_| BuildError::OutsideContentRoot(source_path.to_path_buf()))?;

        let frontmatter =
            read_frontmatter(source_path).map_err(|source| BuildError::Frontmatter {
                path: source_path.to_path_buf(),
                source,
            })?;

        tracing::debug!("Loaded {:?} (draft: {})", relative, frontmatter.draft);
        Ok(Page::new(
            source_path.to_path_buf(),
            relative,
            &self.config.output_dir(),
            frontmatter,
        ))
    }

    /// Published posts, most recent first
    pub fn load_posts(&self, dev: bool) -> Result<Vec<Page>, BuildError> {
        let pages = self
            .discover_posts()?
            .iter()
            .map(|source| self.load_page(source))
            .collect::<Result<Vec<_>, _>>()?;
        let found = pages.len();

        let mut posts = published(pages, dev);
        tracing::debug!("{} of {} posts published (dev: {})", posts.len(), found, dev);
        sort_by_recency(&mut posts);
        Ok(posts)
    }

    /// The site index at the content root, published regardless of draft state
    pub fn load_index(&self) -> Result<Page, BuildError> {
        self.load_page(&self.config.content_dir().join(SOURCE_FILE_NAME))
    }

    /// Copy every sibling file of each post's source into its output directory
    pub fn copy_post_assets(&self, pages: &[Page]) -> Result<(), BuildError> {
        for page in pages {
            let dest = page.destination_dir();
            fs::create_dir_all(dest).at(dest)?;

            let mut entries = fs::read_dir(page.source_dir())
                .at(page.source_dir())?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<Result<Vec<_>, _>>()
                .at(page.source_dir())?;
            entries.sort();

            for path in entries {
                let metadata = fs::metadata(&path).at(&path)?;
                if !metadata.is_file() {
                    return Err(BuildError::NotAFile(path));
                }
                let Some(name) = path.file_name() else {
                    continue;
                };
                if name == SOURCE_FILE_NAME {
                    continue;
                }
                let target = dest.join(name);
                tracing::debug!("Copying {:?} -> {:?}", path, target);
                fs::copy(&path, &target).at(&target)?;
            }
        }
        Ok(())
    }

    /// Fill the page's content with its rendered markdown body
    pub fn convert_page(&self, page: &mut Page) -> Result<(), BuildError> {
        let source = fs::read_to_string(&page.source_path).at(&page.source_path)?;
        page.content = self.processor.convert_document(&source);
        Ok(())
    }

    pub fn convert_pages(&self, pages: &mut [Page]) -> Result<(), BuildError> {
        pages.iter_mut().try_for_each(|page| self.convert_page(page))
    }

    /// Copy the static directory recursively to `<output>/static`
    pub fn copy_static(&self) -> Result<PathBuf, BuildError> {
        let source = self.config.static_dir();
        if !source.is_dir() {
            return Err(BuildError::MissingStatic(source));
        }

        let target_root = self.config.output_dir().join(STATIC_OUTPUT_DIR);
        for entry in WalkDir::new(&source).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(&source)
                .map_err(|_| BuildError::OutsideStaticRoot(entry.path().to_path_buf()))?;
            let target = target_root.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).at(&target)?;
            } else {
                fs::copy(entry.path(), &target).at(&target)?;
            }
        }

        Ok(target_root)
    }

    /// Write the syntect stylesheet for the configured theme, if any
    pub fn write_highlight_css(&self) -> Result<Option<PathBuf>, BuildError> {
        let Some(theme) = self.config.markdown.highlight_theme.as_deref() else {
            return Ok(None);
        };

        let css = css_for_theme(theme).ok_or_else(|| BuildError::UnknownTheme(theme.into()))?;
        let dir = self.config.output_dir().join(STATIC_OUTPUT_DIR);
        fs::create_dir_all(&dir).at(&dir)?;

        let path = dir.join(HIGHLIGHT_CSS_NAME);
        fs::write(&path, css).at(&path)?;
        Ok(Some(path))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
