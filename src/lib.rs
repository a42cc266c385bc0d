//! # Mass Production
//!
//! The page-generation stage of a static site build. Given one main template
//! and a stream of content items, it stamps one template copy per item (a
//! post page) and one copy of each archive template per bucket of posts (an
//! archive page), attaches the data a rendering stage needs, and passes every
//! other input file through untouched.
//!
//! Nothing is rendered here. Generated files carry the raw template source;
//! a later stage combines it with the attached data.
//!
//! # Architecture: One Press, Four Phases
//!
//! ```text
//! input files ──▶ pass-through filter ─┐
//!                                      ├──▶ queue ──▶ sink
//! content items ──▶ post emitter ──────┤
//!                        │             │
//!                        ▼             │
//!                   archive buckets ──▶ archive packer
//! ```
//!
//! A [`press::Press`] collects pass-through files and posts, classifies every
//! post into archive buckets as it goes, packs one page per bucket, publishes
//! the site map, and only then emits the queue. Every file in a run sees the
//! same, complete map of archive hrefs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`press`] | The engine: phases, post emitter, archive packer, pass-through filter, flush |
//! | [`template`] | Template file factory: stamps a template at an href |
//! | [`paths`] | Href → output path resolution |
//! | [`source`] | Content sources (pre-supplied params, markdown documents) and the input walker |
//! | [`frontmatter`] | YAML/TOML front-matter extraction |
//! | [`markdown`] | Markdown → HTML via pulldown-cmark |
//! | [`rules`] | Href and classification rules, with config-driven implementations |
//! | [`data`] | Layered file data and the namespaced payload |
//! | [`site_map`] | Archive type → bucket key → href, published once per run |
//! | [`file`] | The file object exchanged with the build pipeline |
//! | [`ordered`] | Insertion-ordered string-keyed map |
//! | [`config`] | `mass-production.toml` loading, validation, and conversion to press options |
//! | [`output`] | CLI output formatting: plan listing and JSON manifest |
//!
//! # Design Decisions
//!
//! ## Shared Site Map Handle
//!
//! Posts are queued long before archives are packed, yet their data must
//! show the final site map. Every payload holds a [`site_map::SiteMapHandle`]
//! to a write-once cell instead of a copy. The press publishes the map once,
//! after packing and before the first file leaves the queue.
//!
//! ## Shared Post Meta
//!
//! A post's meta, including its computed `href`, is wrapped in an `Arc` once
//! and shared between the post page and every archive bucket it was filed
//! into. Archive pages list exactly what their post pages carry.
//!
//! ## Rules as Traits
//!
//! Href and classification rules are traits with blanket impls for closures.
//! Library callers pass closures; the config layer passes
//! [`rules::HrefPattern`] and [`rules::FieldSlugRule`]. Defaults are types
//! ([`rules::SlugIdentity`], [`rules::KeyIdentity`], [`rules::SingleBucket`]),
//! never absent values.
//!
//! ## Pull-Based Content
//!
//! Content sources are pulled one item at a time. Exhaustion is the signal
//! that collection is over, so packing waits on nothing but the source.

pub mod config;
pub mod data;
pub mod file;
pub mod frontmatter;
pub mod markdown;
pub mod ordered;
pub mod output;
pub mod paths;
pub mod press;
pub mod rules;
pub mod site_map;
pub mod source;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Initialize tracing on stderr.
///
/// `verbose` maps to the default level: 0 = WARN, 1 = INFO, 2 = DEBUG,
/// 3+ = TRACE. `RUST_LOG` directives still apply on top.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
