//! Content sources: where posts come from.
//!
//! Two modes share one [`ContentSource`] capability so the press never needs
//! to know which is in use:
//!
//! - [`PostParams`]: a pre-supplied, ordered `slug → meta` mapping. Bodies
//!   are empty. Everything is available up front.
//! - [`MarkdownSource`]: documents read from disk one at a time. Each is
//!   split into front matter and body, and the body is rendered to HTML.
//!
//! A source is exhausted when [`ContentSource::next_item`] returns `None`;
//! that is the completion signal the press waits for before packing.

use crate::data::Meta;
use crate::file::File;
use crate::frontmatter;
use crate::markdown::{self, RenderOptions};
use crate::ordered::OrderedMap;
use crate::paths;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("front matter error in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One content item ready for emission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentItem {
    pub slug: String,
    pub meta: Meta,
    /// Rendered HTML body; empty for pre-supplied items.
    pub body: String,
}

impl ContentItem {
    pub fn new(slug: impl Into<String>, meta: Meta, body: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            meta,
            body: body.into(),
        }
    }
}

pub trait ContentSource {
    /// Produce the next item, or `None` once the source is exhausted.
    fn next_item(&mut self) -> Option<Result<ContentItem, SourceError>>;

    /// Short description for logs and CLI output.
    fn describe(&self) -> String;
}

// =============================================================================
// Pre-supplied
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct PostParams {
    pending: VecDeque<(String, Meta)>,
}

impl PostParams {
    pub fn new(params: OrderedMap<Meta>) -> Self {
        Self {
            pending: params.into_iter().collect(),
        }
    }
}

impl ContentSource for PostParams {
    fn next_item(&mut self) -> Option<Result<ContentItem, SourceError>> {
        self.pending
            .pop_front()
            .map(|(slug, meta)| Ok(ContentItem::new(slug, meta, "")))
    }

    fn describe(&self) -> String {
        format!("{} pre-supplied posts", self.pending.len())
    }
}

// =============================================================================
// Markdown documents
// =============================================================================

const MARKDOWN_EXTENSION: &str = "md";

/// Markdown documents under a file or directory path.
///
/// Directories are walked recursively in file-name order; hidden entries
/// are skipped. The walk happens on the first pull, and each document is read
/// only when it is pulled.
#[derive(Debug)]
pub struct MarkdownSource {
    root: PathBuf,
    options: RenderOptions,
    pending: Option<VecDeque<PathBuf>>,
}

impl MarkdownSource {
    pub fn new(root: impl Into<PathBuf>, options: RenderOptions) -> Self {
        Self {
            root: root.into(),
            options,
            pending: None,
        }
    }

    fn discover(&self) -> Result<VecDeque<PathBuf>, SourceError> {
        if self.root.is_file() {
            return Ok(VecDeque::from([self.root.clone()]));
        }
        if !self.root.exists() {
            return Err(SourceError::Io {
                path: self.root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such path"),
            });
        }

        let mut found = VecDeque::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_markdown(entry.path()) {
                found.push_back(entry.into_path());
            }
        }
        Ok(found)
    }

    fn load(&self, path: &Path) -> Result<ContentItem, SourceError> {
        let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (meta, body) =
            frontmatter::parse(&text).map_err(|message| SourceError::Frontmatter {
                path: path.to_path_buf(),
                message,
            })?;
        Ok(ContentItem::new(
            slug_for(path),
            meta,
            markdown::render(&body, &self.options),
        ))
    }
}

impl ContentSource for MarkdownSource {
    fn next_item(&mut self) -> Option<Result<ContentItem, SourceError>> {
        if self.pending.is_none() {
            match self.discover() {
                Ok(found) => self.pending = Some(found),
                Err(e) => {
                    self.pending = Some(VecDeque::new());
                    return Some(Err(e));
                }
            }
        }
        let path = self.pending.as_mut()?.pop_front()?;
        Some(self.load(&path))
    }

    fn describe(&self) -> String {
        format!("markdown under {}", self.root.display())
    }
}

// =============================================================================
// Input stream
// =============================================================================

/// Read every file under `root` as a pass-through input, in file-name order.
///
/// Hidden entries are skipped, as is anything at or below one of the
/// `exclude` paths. Each file's base is `root`.
pub fn read_tree(root: &Path, exclude: &[PathBuf]) -> Result<Vec<File>, SourceError> {
    let excluded: Vec<PathBuf> = exclude.iter().map(|p| paths::absolute(p)).collect();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            (e.depth() == 0 || !is_hidden(e.file_name()))
                && !excluded.iter().any(|x| paths::absolute(e.path()).starts_with(x))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let contents = fs::read(&path).map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
        files.push(File::new(path, root, contents));
    }
    Ok(files)
}

/// Slug for a document: its file name without the markdown extension, in
/// any case.
pub fn slug_for(path: &Path) -> String {
    let name = if is_markdown(path) {
        path.file_stem()
    } else {
        path.file_name()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(MARKDOWN_EXTENSION))
        .unwrap_or(false)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
