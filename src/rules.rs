//! Caller-supplied rules: hrefs for posts and archive buckets, and the
//! classification that files posts into buckets.
//!
//! Each rule is a small trait with a blanket impl for closures, so library
//! callers can pass plain functions while the config layer supplies the
//! pattern/field implementations defined here. Defaults are explicit types:
//!
//! | Rule | Default |
//! |------|---------|
//! | post href | [`SlugIdentity`]: the slug itself |
//! | archive href | [`KeyIdentity`]: the bucket key itself |
//! | classification | [`SingleBucket`]: every post lands in [`SINGLE_BUCKET_KEY`] |
//!
//! Rules may fail; the press never catches a rule error, it aborts the item.

use crate::data::Meta;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("href pattern {pattern:?} references missing field {field:?}")]
    MissingField { pattern: String, field: String },
    #[error("field {field:?} cannot be used as a bucket key: {reason}")]
    UnusableKey { field: String, reason: String },
    #[error("invalid href pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("{0}")]
    Custom(String),
}

/// Key used when an archive type classifies without a rule.
pub const SINGLE_BUCKET_KEY: &str = "all";

/// Computes the href for a content post.
pub trait HrefRule {
    fn href(&self, slug: &str, meta: &Meta) -> Result<String, RuleError>;
}

impl<F> HrefRule for F
where
    F: Fn(&str, &Meta) -> Result<String, RuleError>,
{
    fn href(&self, slug: &str, meta: &Meta) -> Result<String, RuleError> {
        self(slug, meta)
    }
}

/// Computes the href for an archive bucket from its key.
pub trait ArchiveHrefRule {
    fn href(&self, key: &str) -> Result<String, RuleError>;
}

impl<F> ArchiveHrefRule for F
where
    F: Fn(&str) -> Result<String, RuleError>,
{
    fn href(&self, key: &str) -> Result<String, RuleError> {
        self(key)
    }
}

/// Picks the bucket a post belongs to for one archive type.
/// `None` leaves the post out of that type.
pub trait SlugRule {
    fn bucket(&self, meta: &Meta) -> Result<Option<String>, RuleError>;
}

impl<F> SlugRule for F
where
    F: Fn(&Meta) -> Result<Option<String>, RuleError>,
{
    fn bucket(&self, meta: &Meta) -> Result<Option<String>, RuleError> {
        self(meta)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlugIdentity;

impl HrefRule for SlugIdentity {
    fn href(&self, slug: &str, _meta: &Meta) -> Result<String, RuleError> {
        Ok(slug.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyIdentity;

impl ArchiveHrefRule for KeyIdentity {
    fn href(&self, key: &str) -> Result<String, RuleError> {
        Ok(key.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SingleBucket;

impl SlugRule for SingleBucket {
    fn bucket(&self, _meta: &Meta) -> Result<Option<String>, RuleError> {
        Ok(Some(SINGLE_BUCKET_KEY.to_string()))
    }
}

// =============================================================================
// Config-driven rules
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slug,
    Field(String),
}

/// Href built from a pattern such as `"blog/{meta.year}/{slug}"`.
///
/// Placeholders: `{slug}` (the post slug or bucket key) and
/// `{meta.<field>}` (a post meta field; post hrefs only).
#[derive(Debug, Clone, PartialEq)]
pub struct HrefPattern {
    source: String,
    segments: Vec<Segment>,
}

impl HrefPattern {
    pub fn parse(pattern: &str) -> Result<Self, RuleError> {
        let invalid = |reason: &str| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut rest = pattern;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unterminated `{`"))?;
            let name = after[..close].trim();
            segments.push(match name {
                "slug" => Segment::Slug,
                _ => match name.strip_prefix("meta.") {
                    Some(field) if !field.is_empty() => Segment::Field(field.to_string()),
                    _ => return Err(invalid(&format!("unknown placeholder `{{{name}}}`"))),
                },
            });
            rest = &after[close + 1..];
        }
        if rest.contains('}') {
            return Err(invalid("`}` without matching `{`"));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Whether any placeholder reads a meta field.
    pub fn uses_meta(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Field(_)))
    }

    fn render(&self, slug: &str, meta: Option<&Meta>) -> Result<String, RuleError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slug => out.push_str(slug),
                Segment::Field(field) => {
                    let value = meta.and_then(|m| m.get(field)).ok_or_else(|| {
                        RuleError::MissingField {
                            pattern: self.source.clone(),
                            field: field.clone(),
                        }
                    })?;
                    out.push_str(&scalar_text(value));
                }
            }
        }
        Ok(out)
    }
}

impl HrefRule for HrefPattern {
    fn href(&self, slug: &str, meta: &Meta) -> Result<String, RuleError> {
        self.render(slug, Some(meta))
    }
}

impl ArchiveHrefRule for HrefPattern {
    fn href(&self, key: &str) -> Result<String, RuleError> {
        self.render(key, None)
    }
}

/// Classifies by the value of one meta field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlugRule {
    field: String,
}

impl FieldSlugRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl SlugRule for FieldSlugRule {
    fn bucket(&self, meta: &Meta) -> Result<Option<String>, RuleError> {
        match meta.get(&self.field) {
            None => Ok(None),
            Some(value) => bucket_key(value).map_err(|reason| RuleError::UnusableKey {
                field: self.field.clone(),
                reason,
            }),
        }
    }
}

/// Interpret a meta value as a bucket key. Falsy values (`null`, `false`,
/// `""`, `0`) classify nowhere.
pub fn bucket_key(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Bool(true) => Ok(Some("true".to_string())),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(None),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) => Err("arrays have no single key".to_string()),
        Value::Object(_) => Err("objects have no single key".to_string()),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
