//! Shared test utilities for the mass-production test suite.
//!
//! Provides site setup, file lookups that panic with the list of what was
//! available, and extractors for the namespaced payload.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = write_site(&[("post.html", "<p>{{title}}</p>")]);
//! let options = Options::new(tmp.path().join("post.html"));
//! let mut press = Press::new(options).unwrap();
//! // ...
//! let post = find_file(&out, "hello/index.html");
//! assert_eq!(stage_value(post)["slug"], "hello");
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::data::{DEFAULT_NAMESPACE, Meta, Payload};
use crate::file::File;
use serde_json::Value;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Write `(relative path, contents)` pairs into a fresh temp directory.
pub fn write_site(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = tmp.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
    }
    tmp
}

/// Read `root/rel` into a [`File`] based at `root`.
pub fn input_file(root: &Path, rel: &str) -> File {
    let path = root.join(rel);
    let contents = fs::read(&path).unwrap_or_else(|e| panic!("cannot read {rel}: {e}"));
    File::new(path, root, contents)
}

/// Build a meta map from a JSON object literal.
pub fn meta(value: Value) -> Meta {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// =========================================================================
// Output lookups, panicking with a clear message on miss
// =========================================================================

/// Find an emitted file by its base-relative path. Panics if not found.
pub fn find_file<'a>(files: &'a [File], rel: &str) -> &'a File {
    files
        .iter()
        .find(|f| f.relative() == Path::new(rel))
        .unwrap_or_else(|| {
            let paths = relative_paths(files);
            panic!("file '{rel}' not found. Available: {paths:?}")
        })
}

/// Base-relative paths of all files, in emission order.
pub fn relative_paths(files: &[File]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.relative().display().to_string())
        .collect()
}

/// Posts, in emission order.
pub fn post_files(files: &[File]) -> Vec<&File> {
    files
        .iter()
        .filter(|f| matches!(f.data.payload(), Some(Payload::Post { .. })))
        .collect()
}

/// Archive pages of one type, in emission order.
pub fn archive_files<'a>(files: &'a [File], archive: &str) -> Vec<&'a File> {
    files
        .iter()
        .filter(|f| matches!(f.data.payload(), Some(Payload::Archive { archive: a, .. }) if a == archive))
        .collect()
}

/// The namespaced payload of a file as JSON. Panics if the file never went
/// through a press.
pub fn stage_value(file: &File) -> Value {
    let stage = file.data.stage.as_ref().unwrap_or_else(|| {
        panic!("{} carries no stage payload", file.path.display())
    });
    stage.to_value()
}

/// Payload under the default namespace, read from flattened data.
pub fn default_namespace(file: &File) -> Value {
    file.data.to_value()[DEFAULT_NAMESPACE].clone()
}
