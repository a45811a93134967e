//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "partysite.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid config value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Main configuration struct matching the partysite.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,
    pub markdown: MarkdownConfig,
    pub output: OutputConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute URL the site is published under, exposed to templates.
    pub public_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_url: String::from("https://pentest.party"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub content: PathBuf,
    pub templates: PathBuf,
    pub output: PathBuf,
    #[serde(rename = "static")]
    pub static_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: PathBuf::from("content"),
            templates: PathBuf::from("templates"),
            output: PathBuf::from("public"),
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkdownConfig {
    /// syntect theme used to generate `static/highlight.css`.
    pub highlight_theme: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub encoding: OutputEncoding,
}

/// Byte encoding of rendered pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    /// Non-ASCII characters become numeric character references.
    #[serde(rename = "ascii")]
    Ascii,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid config with every default in place.
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `partysite.yml` from `dir` if present, otherwise stock defaults.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::from_file(candidate)
        } else {
            tracing::debug!("No {} in {:?}, using defaults", CONFIG_FILE_NAME, dir);
            let mut config = Config::default();
            config.config_path = Some(candidate);
            Ok(config)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.public_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "site.public_url".into(),
                message: "must not be empty".into(),
            });
        }
        if let Some(theme) = &self.markdown.highlight_theme {
            if !crate::markdown::highlight::theme_exists(theme) {
                return Err(ConfigError::Invalid {
                    field: "markdown.highlight_theme".into(),
                    message: format!("unknown syntect theme '{theme}'"),
                });
            }
        }
        Ok(())
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the templates directory, resolved relative to config file
    pub fn templates_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.templates)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the static assets directory, resolved relative to config file
    pub fn static_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.static_dir)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
