//! Page rendering through minijinja templates loaded from the templates
//! directory.
//!
//! Templates see three variables: `page` (the page being rendered),
//! `options` ([`RenderOptions`]) and `pages` (every published post, most
//! recent first). Undefined variables are errors and output is never
//! auto-escaped.

use crate::encoding::encode;
use chrono::{NaiveDate, NaiveDateTime};
use minijinja::{context, AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use partysite_core::{Config, OutputEncoding, Page};
use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension appended to a page's template name.
pub const TEMPLATE_EXTENSION: &str = "html";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {name}")]
    NotFound {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to render template {name}: {source:#}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Global build options exposed to templates as `options`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOptions {
    pub dev: bool,
    pub public_url: String,
}

impl RenderOptions {
    pub fn new(config: &Config, dev: bool) -> Self {
        Self {
            dev,
            public_url: config.site.public_url.clone(),
        }
    }
}

/// Renders pages with the site's templates
pub struct SiteRenderer {
    env: Environment<'static>,
    encoding: OutputEncoding,
}

impl SiteRenderer {
    pub fn new(config: &Config) -> Self {
        Self::with_templates_dir(config.templates_dir(), config.output.encoding)
    }

    pub fn with_templates_dir(dir: impl AsRef<Path>, encoding: OutputEncoding) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_filter("strftime", strftime);

        Self { env, encoding }
    }

    /// Render `page` with the template it names
    pub fn render_page(
        &self,
        page: &Page,
        options: &RenderOptions,
        pages: &[Page],
    ) -> Result<String, TemplateError> {
        let name = format!("{}.{}", page.template_name(), TEMPLATE_EXTENSION);

        let template = self.env.get_template(&name).map_err(|source| {
            if source.kind() == ErrorKind::TemplateNotFound {
                TemplateError::NotFound {
                    name: name.clone(),
                    source,
                }
            } else {
                TemplateError::Render {
                    name: name.clone(),
                    source,
                }
            }
        })?;

        tracing::debug!("Rendering {:?} with {}", page.source_path, name);
        template
            .render(context! {
                page => page,
                options => options,
                pages => pages,
            })
            .map_err(|source| TemplateError::Render { name, source })
    }

    /// Render `page` and write it, encoded, to its destination path
    pub fn write_page(
        &self,
        page: &Page,
        options: &RenderOptions,
        pages: &[Page],
    ) -> Result<PathBuf, TemplateError> {
        let html = self.render_page(page, options, pages)?;
        let path = page.destination_path.clone();
        let io_err = |source| TemplateError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&path, encode(&html, self.encoding)).map_err(io_err)?;
        Ok(path)
    }
}

/// `{{ page.date | strftime("%B %-d, %Y") }}`
///
/// Accepts `YYYY-MM-DD` dates and `YYYY-MM-DDTHH:MM:SS` date-times.
fn strftime(value: String, format: String) -> Result<String, minijinja::Error> {
    use chrono::format::{Item, StrftimeItems};

    let items: Vec<Item<'_>> = StrftimeItems::new(&format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("invalid strftime format '{format}'"),
        ));
    }

    let datetime = NaiveDateTime::parse_from_str(&value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(&value, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|err| {
            minijinja::Error::new(
                ErrorKind::InvalidOperation,
                format!("cannot parse '{value}' as a date: {err}"),
            )
        })?;

    let mut out = String::new();
    write!(out, "{}", datetime.format_with_items(items.into_iter())).map_err(|_| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("format '{format}' does not apply to a date"),
        )
    })?;
    Ok(out)
}
