//! Data payloads attached to files for the downstream rendering stage.
//!
//! A file's data is built from layers, later layers winning on key
//! collision:
//!
//! ```text
//! 1. data already on the file      (pass-through files only)
//! 2. caller locals
//! 3. { <namespace>: stage payload } (always wins)
//! ```
//!
//! The stage payload depends on what produced the file:
//!
//! | Producer | Keys under the namespace |
//! |----------|--------------------------|
//! | pass-through | `siteMap` |
//! | post | `siteMap`, `slug`, `meta`, `body` |
//! | archive | `siteMap`, `slug`, `posts` |
//!
//! `siteMap` is a [`SiteMapHandle`], so every file's payload resolves to the
//! one map published at the end of packing. [`FileData::to_value`] is where
//! the layers are flattened into plain JSON.

use crate::site_map::SiteMapHandle;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Metadata for one content item.
pub type Meta = Map<String, Value>;

/// Default key the stage payload is nested under.
pub const DEFAULT_NAMESPACE: &str = "massProduction";

/// Shallow-merge `overlay` on top of `base`; overlay keys replace base keys.
pub fn layer(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
}

/// Which producer created a file, and what that producer attaches.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A repository file passed through unchanged.
    PassThrough,
    /// One content item stamped from the main template.
    Post {
        slug: String,
        meta: Arc<Meta>,
        body: String,
    },
    /// One archive bucket stamped from its type's template.
    Archive {
        archive: String,
        slug: String,
        posts: Vec<Arc<Meta>>,
    },
}

/// The part of a file's data owned by this stage.
#[derive(Debug, Clone)]
pub struct StageData {
    pub namespace: String,
    pub site_map: SiteMapHandle,
    pub payload: Payload,
}

#[derive(Serialize)]
struct StageView<'a> {
    #[serde(rename = "siteMap")]
    site_map: &'a SiteMapHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    meta: Option<&'a Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    posts: Option<Vec<&'a Meta>>,
}

impl StageData {
    fn view(&self) -> StageView<'_> {
        let mut view = StageView {
            site_map: &self.site_map,
            slug: None,
            meta: None,
            body: None,
            posts: None,
        };
        match &self.payload {
            Payload::PassThrough => {}
            Payload::Post { slug, meta, body } => {
                view.slug = Some(slug.as_str());
                view.meta = Some(&**meta);
                view.body = Some(body.as_str());
            }
            Payload::Archive { slug, posts, .. } => {
                view.slug = Some(slug.as_str());
                view.posts = Some(posts.iter().map(|m| &**m).collect());
            }
        }
        view
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self.view()).unwrap_or(Value::Null)
    }
}

/// Everything attached to a [`File`](crate::file::File) for rendering.
#[derive(Debug, Clone, Default)]
pub struct FileData {
    /// Free-form fields: prior file data and caller locals, already layered.
    pub fields: Map<String, Value>,
    /// This stage's namespaced payload, if the file went through the press.
    pub stage: Option<StageData>,
}

impl FileData {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            stage: None,
        }
    }

    /// Layer `locals` and the namespaced payload over the existing fields.
    pub fn layered(mut self, locals: &Map<String, Value>, stage: StageData) -> Self {
        layer(&mut self.fields, locals);
        self.stage = Some(stage);
        self
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.stage.as_ref().map(|s| &s.payload)
    }

    /// Flatten all layers into one map. The namespace key is written last,
    /// so it replaces any field of the same name.
    pub fn flatten(&self) -> Map<String, Value> {
        let mut out = self.fields.clone();
        if let Some(stage) = &self.stage {
            out.insert(stage.namespace.clone(), stage.to_value());
        }
        out
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site_map::SiteMap;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn layer_overlay_wins() {
        let mut base = obj(json!({"a": 1, "b": 2}));
        layer(&mut base, &obj(json!({"b": 20, "c": 30})));
        assert_eq!(Value::Object(base), json!({"a": 1, "b": 20, "c": 30}));
    }

    #[test]
    fn layer_is_shallow() {
        let mut base = obj(json!({"nested": {"keep": true}}));
        layer(&mut base, &obj(json!({"nested": {"other": 1}})));
        assert_eq!(Value::Object(base), json!({"nested": {"other": 1}}));
    }

    #[test]
    fn namespace_wins_over_locals() {
        let locals = obj(json!({"massProduction": "shadowed", "title": "Site"}));
        let stage = StageData {
            namespace: DEFAULT_NAMESPACE.to_string(),
            site_map: SiteMapHandle::new(),
            payload: Payload::PassThrough,
        };
        let data = FileData::default().layered(&locals, stage);
        assert_eq!(
            data.to_value(),
            json!({"massProduction": {"siteMap": {}}, "title": "Site"})
        );
    }

    #[test]
    fn existing_fields_sit_under_locals() {
        let existing = obj(json!({"title": "Own", "draft": true}));
        let locals = obj(json!({"title": "Site"}));
        let stage = StageData {
            namespace: "ns".to_string(),
            site_map: SiteMapHandle::new(),
            payload: Payload::PassThrough,
        };
        let value = FileData::new(existing).layered(&locals, stage).to_value();
        assert_eq!(value["title"], "Site");
        assert_eq!(value["draft"], true);
    }

    #[test]
    fn post_payload_shape() {
        let meta = Arc::new(obj(json!({"title": "Hello", "href": "hello"})));
        let stage = StageData {
            namespace: "ns".to_string(),
            site_map: SiteMapHandle::new(),
            payload: Payload::Post {
                slug: "hello".to_string(),
                meta,
                body: "<p>hi</p>".to_string(),
            },
        };
        assert_eq!(
            stage.to_value(),
            json!({
                "siteMap": {},
                "slug": "hello",
                "meta": {"title": "Hello", "href": "hello"},
                "body": "<p>hi</p>",
            })
        );
    }

    #[test]
    fn archive_payload_lists_posts_and_skips_type_name() {
        let a = Arc::new(obj(json!({"title": "A"})));
        let b = Arc::new(obj(json!({"title": "B"})));
        let stage = StageData {
            namespace: "ns".to_string(),
            site_map: SiteMapHandle::new(),
            payload: Payload::Archive {
                archive: "category".to_string(),
                slug: "rust".to_string(),
                posts: vec![a, b],
            },
        };
        let value = stage.to_value();
        assert_eq!(value["slug"], "rust");
        assert_eq!(value["posts"], json!([{"title": "A"}, {"title": "B"}]));
        assert!(value.get("archive").is_none());
        assert!(value.get("meta").is_none());
    }

    #[test]
    fn site_map_resolves_at_flatten_time() {
        let handle = SiteMapHandle::new();
        let data = FileData::default().layered(
            &Map::new(),
            StageData {
                namespace: "ns".to_string(),
                site_map: handle.clone(),
                payload: Payload::PassThrough,
            },
        );
        assert_eq!(data.to_value()["ns"]["siteMap"], json!({}));

        let mut map = SiteMap::new();
        map.record("tag", "rust", "tags/rust");
        handle.publish(map).unwrap();
        assert_eq!(
            data.to_value()["ns"]["siteMap"],
            json!({"tag": {"rust": "tags/rust"}})
        );
    }
}
