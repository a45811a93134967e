//! Build command implementation.

use anyhow::{Context, Result};
use partysite_core::{Config, SiteBuilder};
use partysite_render::{RenderOptions, SiteRenderer};
use std::path::{Path, PathBuf};

/// Options given on the command line
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Explicit config file; `./partysite.yml` or defaults otherwise
    pub config: Option<PathBuf>,
    pub dev: bool,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading config from {:?}", path);
            Config::from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))
        }
        None => Config::discover(Path::new(".")).context("Failed to load configuration"),
    }
}

/// Build the static site
pub fn build_site(options: &BuildOptions) -> Result<()> {
    let config = load_config(options.config.as_deref())?;
    build_site_with_config(config, options.dev)
}

/// Build the site from an already loaded config
pub fn build_site_with_config(config: Config, dev: bool) -> Result<()> {
    let render_options = RenderOptions::new(&config, dev);
    let renderer = SiteRenderer::new(&config);
    let builder = SiteBuilder::new(config);

    builder
        .reset_output()
        .context("Failed to reset output directory")?;

    tracing::info!("loading posts");
    let mut posts = builder.load_posts(dev).context("Failed to load posts")?;
    tracing::debug!("{} posts published (dev: {})", posts.len(), dev);

    tracing::info!("copying posts");
    builder
        .copy_post_assets(&posts)
        .context("Failed to copy post assets")?;

    tracing::info!("preprocess pages");
    let mut index = builder.load_index().context("Failed to load site index")?;
    builder
        .convert_page(&mut index)
        .context("Failed to convert site index")?;
    builder
        .convert_pages(&mut posts)
        .context("Failed to convert posts")?;

    tracing::info!("rendering pages");
    renderer
        .write_page(&index, &render_options, &posts)
        .context("Failed to render site index")?;
    for post in &posts {
        renderer
            .write_page(post, &render_options, &posts)
            .with_context(|| format!("Failed to render {:?}", post.source_path))?;
    }

    tracing::info!("copying static files");
    builder
        .copy_static()
        .context("Failed to copy static files")?;
    if let Some(css) = builder
        .write_highlight_css()
        .context("Failed to write highlight stylesheet")?
    {
        tracing::debug!("Wrote {:?}", css);
    }

    tracing::info!("Site built at {:?}", builder.config().output_dir());
    Ok(())
}
