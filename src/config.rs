//! Press configuration module.
//!
//! Handles loading and validating `mass-production.toml`, and turning it into
//! press [`Options`]. Every relative path in the file is resolved against the
//! directory the file lives in.
//!
//! ## Configuration Options
//!
//! ```toml
//! template = "post.html"        # Main template (required)
//! markdown = "posts"            # Markdown file or directory (optional)
//! namespace = "massProduction"  # Key the stage payload is nested under
//! href = "{slug}"               # Post href pattern; `{slug}`, `{meta.<field>}`
//!
//! [post_params.hello]           # Pre-supplied posts; win over `markdown`
//! title = "Hello"
//!
//! [locals]                      # Layered into every file's data
//! site = "Example"
//!
//! [render]                      # Markdown renderer switches
//! breaks = true
//! tables = true
//! strikethrough = true
//! footnotes = false
//! tasklists = false
//! smart_punctuation = false
//!
//! [archive.category]            # One table per archive type, packed in order
//! template = "category.html"
//! href = "category/{slug}"      # Bucket href; `{slug}` is the bucket key
//! slug_field = "category"       # Meta field to classify by; omit for one bucket
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::data::{DEFAULT_NAMESPACE, Meta};
use crate::markdown::RenderOptions;
use crate::ordered::OrderedMap;
use crate::press::{ArchiveType, Options};
use crate::rules::{FieldSlugRule, HrefPattern};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default config file name, looked up in the source directory.
pub const CONFIG_FILE: &str = "mass-production.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Contents of `mass-production.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PressConfig {
    pub template: String,
    pub markdown: Option<String>,
    pub namespace: String,
    pub href: Option<String>,
    pub post_params: Option<OrderedMap<Meta>>,
    pub locals: Meta,
    pub render: RenderOptions,
    /// Archive types by name, in declaration order.
    pub archive: OrderedMap<ArchiveConfig>,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            template: String::new(),
            markdown: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            href: None,
            post_params: None,
            locals: Meta::new(),
            render: RenderOptions::default(),
            archive: OrderedMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    pub template: String,
    #[serde(default)]
    pub href: Option<String>,
    /// Meta field whose value is the bucket key.
    #[serde(default)]
    pub slug_field: Option<String>,
}

impl PressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template.is_empty() {
            return Err(ConfigError::Validation("template is required".into()));
        }
        if self.namespace.is_empty() {
            return Err(ConfigError::Validation(
                "namespace must not be empty".into(),
            ));
        }
        if let Some(href) = &self.href {
            pattern(href)?;
        }
        for (name, archive) in self.archive.iter() {
            if archive.template.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "archive.{name}.template must not be empty"
                )));
            }
            if let Some(href) = &archive.href {
                if pattern(href)?.uses_meta() {
                    return Err(ConfigError::Validation(format!(
                        "archive.{name}.href cannot use meta fields: {href:?}"
                    )));
                }
            }
            if archive.slug_field.as_deref() == Some("") {
                return Err(ConfigError::Validation(format!(
                    "archive.{name}.slug_field must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Main template path, resolved against `root`.
    pub fn template_path(&self, root: &Path) -> PathBuf {
        root.join(&self.template)
    }

    /// Markdown content path, resolved against `root`.
    pub fn markdown_path(&self, root: &Path) -> Option<PathBuf> {
        self.markdown.as_ref().map(|m| root.join(m))
    }

    /// Build press options with every path resolved against `root`.
    pub fn into_options(self, root: &Path) -> Result<Options, ConfigError> {
        self.validate()?;
        let mut options = Options::new(self.template_path(root))
            .namespace(self.namespace.clone())
            .locals(self.locals.clone());

        if let Some(href) = &self.href {
            options = options.href_rule(pattern(href)?);
        }

        let markdown = self.markdown_path(root);
        match (self.post_params, markdown) {
            (Some(params), markdown) => {
                if let Some(markdown) = markdown {
                    warn!(
                        markdown = %markdown.display(),
                        "post_params set; markdown source ignored"
                    );
                }
                options = options.post_params(params);
            }
            (None, Some(markdown)) => options = options.markdown(markdown, self.render),
            (None, None) => {}
        }

        for (name, archive) in self.archive {
            let mut archive_type = ArchiveType::new(name, root.join(&archive.template));
            if let Some(href) = &archive.href {
                archive_type = archive_type.href_rule(pattern(href)?);
            }
            if let Some(field) = archive.slug_field {
                archive_type = archive_type.slug_rule(FieldSlugRule::new(field));
            }
            options = options.archive(archive_type);
        }
        Ok(options)
    }
}

fn pattern(href: &str) -> Result<HrefPattern, ConfigError> {
    HrefPattern::parse(href).map_err(|e| ConfigError::Validation(e.to_string()))
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<PressConfig, ConfigError> {
    let config: PressConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate the config file at `path`.
pub fn load_config(path: &Path) -> Result<PressConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `mass-production.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Mass Production Configuration
# =============================
# Paths are relative to this file's directory.
# Unknown keys will cause an error.

# Main template, stamped once per post. Required.
template = "post.html"

# Markdown file or directory to read posts from. Directories are walked
# recursively in name order; hidden entries are skipped.
markdown = "posts"

# Key the generated payload is nested under in each file's data.
namespace = "massProduction"

# Post href pattern. Placeholders: {slug}, {meta.<field>}.
# Hrefs ending in .html are used as-is; others get /index.html appended.
href = "{slug}"

# ---------------------------------------------------------------------------
# Pre-supplied posts (take precedence over `markdown`)
# ---------------------------------------------------------------------------
# [post_params.hello]
# title = "Hello"
# category = "news"

# ---------------------------------------------------------------------------
# Locals, layered into every file's data
# ---------------------------------------------------------------------------
[locals]
# site = "My Blog"

# ---------------------------------------------------------------------------
# Markdown rendering
# ---------------------------------------------------------------------------
[render]
# Single newlines inside a paragraph become <br />.
breaks = true
tables = true
strikethrough = true
footnotes = false
tasklists = false
# Curly quotes, dashes, ellipses.
smart_punctuation = false

# ---------------------------------------------------------------------------
# Archive types, packed in the order declared
# ---------------------------------------------------------------------------
# Every post whose `slug_field` value is set lands in the bucket of that
# value. Without `slug_field`, every post lands in a single "all" bucket.
# `href` may only use {slug}, which is the bucket key.
#
# [archive.category]
# template = "category.html"
# href = "category/{slug}"
# slug_field = "category"
#
# [archive.home]
# template = "index.html"
# href = "index.html"
"##
}
