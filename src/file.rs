//! The file object exchanged with the surrounding build pipeline.

use crate::data::FileData;
use std::path::{Path, PathBuf};

/// One file travelling through the stage.
///
/// Each `File` has exactly one producer (the template factory or the caller
/// feeding the input stream) and is handed downstream exactly once.
#[derive(Debug, Clone)]
pub struct File {
    /// Absolute location.
    pub path: PathBuf,
    /// Root used for relative addressing.
    pub base: PathBuf,
    /// Raw bytes. Generated files carry unrendered template source.
    pub contents: Vec<u8>,
    /// Attached data for the rendering stage.
    pub data: FileData,
}

impl File {
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            base: base.into(),
            contents,
            data: FileData::default(),
        }
    }

    /// Path relative to `base`, or the full path when it lies outside `base`.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }

    /// Contents as UTF-8 text, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }
}
