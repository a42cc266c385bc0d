//! Template file factory.
//!
//! A [`Template`] holds one template's location and raw bytes. Stamping it
//! with an href produces a new [`File`] positioned at the resolved output
//! path next to the template, whose contents are a private copy of the
//! template source. Rendering that source is a later stage's job.
//!
//! ```text
//! template: /site/theme/post.hbs
//! href:     blog/hello
//! output:   /site/theme/blog/hello/index.hbs
//! ```

use crate::file::File;
use crate::paths::{self, Destination};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Template {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Template {
    /// Read a template from disk. The stored path is absolute and normalized.
    pub fn load(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(path, bytes))
    }

    pub fn from_bytes(path: &Path, bytes: Vec<u8>) -> Self {
        Self {
            path: paths::absolute(path),
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Directory generated files are resolved against.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("/"))
    }

    /// Template extension with its leading dot.
    pub fn extension(&self) -> String {
        paths::dotted_extension(&self.path)
    }

    pub fn destination(&self, href: &str) -> Destination {
        paths::resolve_destination(href, &self.extension())
    }

    /// Create the output file for `href`. `base` is the run's captured base;
    /// without one the template directory is used.
    pub fn stamp(&self, href: &str, base: Option<&Path>) -> File {
        let destination = self.destination(href);
        let path = paths::join_under(self.dir(), &destination.src_suffix);
        let base = base.map(Path::to_path_buf).unwrap_or_else(|| self.dir().to_path_buf());
        File::new(path, base, self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template(path: &str, source: &str) -> Template {
        Template::from_bytes(Path::new(path), source.as_bytes().to_vec())
    }

    #[test]
    fn stamp_places_output_next_to_template() {
        let t = template("/site/post.html", "<html>{{title}}</html>");
        let file = t.stamp("hello", None);
        assert_eq!(file.path, PathBuf::from("/site/hello/index.html"));
        assert_eq!(file.base, PathBuf::from("/site"));
        assert_eq!(file.text(), "<html>{{title}}</html>");
    }

    #[test]
    fn stamp_keeps_template_extension() {
        let t = template("/site/theme/post.hbs", "{{body}}");
        let file = t.stamp("blog/hello", Some(Path::new("/site")));
        assert_eq!(file.path, PathBuf::from("/site/theme/blog/hello/index.hbs"));
        assert_eq!(file.relative(), Path::new("theme/blog/hello/index.hbs"));
    }

    #[test]
    fn stamp_page_href_verbatim() {
        let t = template("/site/home.html", "");
        let file = t.stamp("index.html", None);
        assert_eq!(file.path, PathBuf::from("/site/index.html"));
    }

    #[test]
    fn stamp_empty_href_stays_under_template_dir() {
        let t = template("/site/t/post.html", "");
        let file = t.stamp("", None);
        assert_eq!(file.path, PathBuf::from("/site/t/index.html"));
    }

    #[test]
    fn stamped_files_own_their_contents() {
        let t = template("/site/post.html", "shared");
        let mut first = t.stamp("a", None);
        let second = t.stamp("b", None);
        first.contents.clear();
        assert_eq!(second.text(), "shared");
        assert_eq!(t.bytes(), b"shared");
    }

    #[test]
    fn load_reads_bytes_and_absolutizes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("post.html");
        std::fs::write(&path, "<p>{{body}}</p>").unwrap();
        let t = Template::load(&path).unwrap();
        assert!(t.path().is_absolute());
        assert_eq!(t.bytes(), b"<p>{{body}}</p>");
        assert_eq!(t.extension(), ".html");
    }

    #[test]
    fn load_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(Template::load(&tmp.path().join("nope.html")).is_err());
    }
}
