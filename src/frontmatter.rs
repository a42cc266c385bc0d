//! Front-matter extraction: raw document text → (meta, body).
//!
//! Two header styles are recognized at the very start of a document:
//!
//! ```text
//! ---                 +++
//! title: Hello        title = "Hello"
//! category: rust      category = "rust"
//! ---                 +++
//! body...             body...
//! ```
//!
//! YAML headers may also close with `...`. The header is removed from the
//! returned body. A document without a header yields empty meta and the
//! whole text as body.

use crate::data::Meta;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn open(line: &str) -> Option<Self> {
        match line.trim_end() {
            "---" => Some(Self::Yaml),
            "+++" => Some(Self::Toml),
            _ => None,
        }
    }

    fn closes(self, line: &str) -> bool {
        let line = line.trim_end();
        match self {
            Self::Yaml => line == "---" || line == "...",
            Self::Toml => line == "+++",
        }
    }
}

/// Locate a header. Returns `(format, header, body)`; `None` when the text
/// does not open with a delimiter or the delimiter is never closed.
pub fn split(text: &str) -> Option<(Format, &str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let first_end = text.find('\n').unwrap_or(text.len());
    let format = Format::open(&text[..first_end])?;

    let header_start = (first_end + 1).min(text.len());
    let mut offset = header_start;
    for line in text[header_start..].split_inclusive('\n') {
        if format.closes(line.trim_end_matches(['\n', '\r'])) {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            return Some((format, header, body));
        }
        offset += line.len();
    }
    None
}

/// Split `text` into meta and body. The error is a human-readable message;
/// callers attach the document path.
pub fn parse(text: &str) -> Result<(Meta, String), String> {
    let Some((format, header, body)) = split(text) else {
        return Ok((Meta::new(), text.to_string()));
    };

    let value: Value = match format {
        Format::Yaml if header.trim().is_empty() => Value::Null,
        Format::Yaml => serde_yaml::from_str(header).map_err(|e| format!("YAML: {e}"))?,
        Format::Toml => toml::from_str(header).map_err(|e| format!("TOML: {e}"))?,
    };

    let meta = match value {
        Value::Null => Meta::new(),
        Value::Object(map) => map,
        other => return Err(format!("header must be a mapping, found {}", kind(&other))),
    };
    Ok((meta, body.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
