//! CLI output formatting.
//!
//! # Plan
//!
//! The primary display for every generated file is what it stands for (a
//! post title, an archive bucket) with the output path as secondary context:
//!
//! ```text
//! Pages
//! 001 about.html
//! 002 style.css
//!
//! Posts
//! 001 Hello → hello/index.html
//! 002 notes → notes/index.html
//!
//! Archives
//! category
//!     001 a (2 posts) → category/a/index.html
//!     002 b (1 post) → category/b/index.html
//! home
//!     001 all (3 posts) → index.html
//! tag
//!     (no buckets)
//!
//! Generated 3 posts, 3 archive pages, 2 pass-through files
//! ```
//!
//! # Manifest
//!
//! A JSON array with one `{path, contents, data}` object per emitted file, in
//! emission order. `data` is the fully flattened file data.
//!
//! Each `format_*` function is pure and returns lines or text; `print_*`
//! wrappers write to stdout.

use crate::data::Payload;
use crate::file::File;
use crate::site_map::SiteMap;
use serde::Serialize;
use serde_json::Value;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Title for a post line: `meta.title` when it is a non-empty string,
/// otherwise the slug.
fn post_title<'a>(slug: &'a str, meta: &'a serde_json::Map<String, Value>) -> &'a str {
    match meta.get("title").and_then(Value::as_str) {
        Some(t) if !t.is_empty() => t,
        _ => slug,
    }
}

pub fn format_plan(files: &[File], site_map: Option<&SiteMap>) -> Vec<String> {
    let mut pages = Vec::new();
    let mut posts = Vec::new();
    for file in files {
        let rel = file.relative().display().to_string();
        match file.data.payload() {
            Some(Payload::Post { slug, meta, .. }) => {
                posts.push(format!(
                    "{} {} → {}",
                    format_index(posts.len() + 1),
                    post_title(slug, meta),
                    rel
                ));
            }
            Some(Payload::Archive { .. }) => {}
            Some(Payload::PassThrough) | None => {
                pages.push(format!("{} {}", format_index(pages.len() + 1), rel));
            }
        }
    }

    let mut lines = Vec::new();
    if !pages.is_empty() {
        lines.push("Pages".to_string());
        lines.append(&mut pages);
        lines.push(String::new());
    }
    if !posts.is_empty() {
        lines.push("Posts".to_string());
        lines.extend(posts.iter().cloned());
        lines.push(String::new());
    }

    let mut archive_pages = 0;
    if let Some(site_map) = site_map.filter(|m| !m.is_empty()) {
        lines.push("Archives".to_string());
        for (name, buckets) in site_map.archives() {
            lines.push(name.to_string());
            if buckets.is_empty() {
                lines.push(format!("{}(no buckets)", indent(1)));
            }
            for (pos, (key, _)) in buckets.iter().enumerate() {
                let page = files.iter().find(|f| {
                    matches!(
                        f.data.payload(),
                        Some(Payload::Archive { archive, slug, .. }) if archive == name && slug == key
                    )
                });
                let count = match page.and_then(|f| f.data.payload()) {
                    Some(Payload::Archive { posts, .. }) => posts.len(),
                    _ => 0,
                };
                let dest = page
                    .map(|f| f.relative().display().to_string())
                    .unwrap_or_default();
                lines.push(format!(
                    "{}{} {} ({}) → {}",
                    indent(1),
                    format_index(pos + 1),
                    key,
                    plural(count, "post", "posts"),
                    dest
                ));
                archive_pages += 1;
            }
        }
        lines.push(String::new());
    }

    let passed = files
        .iter()
        .filter(|f| matches!(f.data.payload(), Some(Payload::PassThrough) | None))
        .count();
    lines.push(format!(
        "Generated {}, {}, {}",
        plural(posts.len(), "post", "posts"),
        plural(archive_pages, "archive page", "archive pages"),
        plural(passed, "pass-through file", "pass-through files"),
    ));
    lines
}

pub fn print_plan(files: &[File], site_map: Option<&SiteMap>) {
    for line in format_plan(files, site_map) {
        println!("{}", line);
    }
}

#[derive(Serialize)]
struct ManifestEntry {
    path: String,
    contents: String,
    data: Value,
}

/// Pretty-printed JSON manifest of emitted files.
pub fn format_manifest(files: &[File]) -> serde_json::Result<String> {
    let entries: Vec<ManifestEntry> = files
        .iter()
        .map(|f| ManifestEntry {
            path: f.relative().display().to_string(),
            contents: f.text(),
            data: f.data.to_value(),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

pub fn print_manifest(files: &[File]) -> serde_json::Result<()> {
    println!("{}", format_manifest(files)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::press::{ArchiveType, Options, Press};
    use crate::test_helpers::*;
    use crate::ordered::OrderedMap;
    use serde_json::json;

    fn generate() -> (Vec<File>, Press) {
        let tmp = write_site(&[
            ("post.html", "<article></article>"),
            ("category.html", "<ul></ul>"),
            ("tag.html", "<ul></ul>"),
            ("about.html", "<p>About</p>"),
        ]);
        let params: OrderedMap<_> = [
            ("hello", meta(json!({"title": "Hello", "category": "a"}))),
            ("notes", meta(json!({"category": "a"}))),
            ("third", meta(json!({"title": "", "category": "b"}))),
        ]
        .into_iter()
        .collect();
        let options = Options::new(tmp.path().join("post.html"))
            .post_params(params)
            .archive(
                ArchiveType::new("category", tmp.path().join("category.html"))
                    .href_fn(|k| Ok(format!("category/{k}")))
                    .slug_rule(crate::rules::FieldSlugRule::new("category")),
            )
            .archive(
                ArchiveType::new("tag", tmp.path().join("tag.html"))
                    .slug_rule(crate::rules::FieldSlugRule::new("tag")),
            );
        let mut press = Press::new(options).unwrap();
        let mut out = Vec::new();
        press
            .run([input_file(tmp.path(), "about.html")], &mut out)
            .unwrap();
        (out, press)
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn indent_is_four_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "post", "posts"), "1 post");
        assert_eq!(plural(0, "post", "posts"), "0 posts");
    }

    #[test]
    fn plan_lists_every_section() {
        let (out, press) = generate();
        let handle = press.site_map();
        let lines = format_plan(&out, handle.get());
        assert_eq!(
            lines,
            vec![
                "Pages",
                "001 about.html",
                "",
                "Posts",
                "001 Hello → hello/index.html",
                "002 notes → notes/index.html",
                "003 third → third/index.html",
                "",
                "Archives",
                "category",
                "    001 a (2 posts) → category/a/index.html",
                "    002 b (1 post) → category/b/index.html",
                "tag",
                "    (no buckets)",
                "",
                "Generated 3 posts, 2 archive pages, 1 pass-through file",
            ]
        );
    }

    #[test]
    fn plan_of_nothing_is_just_totals() {
        let lines = format_plan(&[], None);
        assert_eq!(
            lines,
            vec!["Generated 0 posts, 0 archive pages, 0 pass-through files"]
        );
    }

    #[test]
    fn manifest_carries_flattened_data() {
        let (out, _press) = generate();
        let json: Value = serde_json::from_str(&format_manifest(&out).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), out.len());
        assert_eq!(entries[0]["path"], "about.html");
        assert_eq!(entries[0]["contents"], "<p>About</p>");
        assert_eq!(entries[1]["path"], "hello/index.html");
        assert_eq!(entries[1]["data"]["massProduction"]["meta"]["href"], "hello");
        assert_eq!(
            entries[1]["data"]["massProduction"]["siteMap"]["category"]["b"],
            "category/b"
        );
    }
}
