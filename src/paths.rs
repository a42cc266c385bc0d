//! Href → output path resolution.
//!
//! An href either names a page file already (`about.html`, `tags/rust.html`)
//! or a directory that gets an index page appended:
//!
//! ```text
//! "a/b.html"  →  a/b.html
//! "a/b"       →  a/b/index.html
//! ""          →  /index.html
//! ```
//!
//! The matching template-relative suffix swaps the page extension for the
//! template's own, so a `post.hbs` template maps `a/b` to `a/b/index.hbs`.
//!
//! Everything here is pure string/path work; nothing touches the filesystem
//! except [`absolute`], which consults the current directory for relative
//! inputs.

use std::path::{Component, Path, PathBuf};

/// Extension marking an href as a page file rather than a directory.
pub const PAGE_EXTENSION: &str = ".html";

/// Index page appended to directory-style hrefs.
pub const INDEX_PAGE: &str = "index.html";

/// Resolved destination for one href.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Output path, relative to the template directory.
    pub dest_path: String,
    /// `dest_path` with the page extension replaced by the template's.
    pub src_suffix: String,
}

/// Map an href to its output path and template-relative suffix.
///
/// `template_extension` includes the leading dot (`".html"`, `".hbs"`) or is
/// empty for extensionless templates.
pub fn resolve_destination(href: &str, template_extension: &str) -> Destination {
    let dest_path = if href.ends_with(PAGE_EXTENSION) {
        href.to_string()
    } else {
        format!("{href}/{INDEX_PAGE}")
    };
    let src_suffix = match dest_path.strip_suffix(PAGE_EXTENSION) {
        Some(stem) => format!("{stem}{template_extension}"),
        None => dest_path.clone(),
    };
    Destination {
        dest_path,
        src_suffix,
    }
}

/// Extension of `path` with its leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. Never consults the filesystem, so symlinks are not
/// resolved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Join `rel` under `dir`, treating `rel` as relative even if it starts with
/// a separator. Keeps `"/index.html"` from escaping to the filesystem root.
pub fn join_under(dir: &Path, rel: &str) -> PathBuf {
    let mut out = dir.to_path_buf();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => out.push(".."),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    normalize(&out)
}

/// Absolute, normalized form of `path`, resolved against the current
/// directory when relative.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize(&joined)
}

/// Whether two paths name the same location once both are made absolute
/// and normalized.
pub fn same_path(a: &Path, b: &Path) -> bool {
    absolute(a) == absolute(b)
}
