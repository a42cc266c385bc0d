//! The generation engine.
//!
//! A [`Press`] turns one main template plus a stream of content items into
//! one post page per item, and one archive page per `(archive type, bucket)`
//! pair. Every file it hands downstream carries the same site map.
//!
//! ## Phases
//!
//! ```text
//! Collecting ──▶ Packing ──▶ Emitting ──▶ Done
//!      │             │            │
//!      └─────────────┴────────────┴──▶ Failed (permanent)
//! ```
//!
//! - **Collecting**: input files go through the pass-through filter
//!   ([`Press::accept`]); content items are stamped as posts and classified
//!   into archive buckets ([`Press::emit_post`]). [`Press::finish`] drains
//!   the configured content source here before moving on.
//! - **Packing**: each archive type's template is loaded and stamped once
//!   per bucket; the finished site map is published.
//! - **Emitting**: the queue is drained into the [`Sink`] in the order files
//!   were queued: pass-through files, then posts, then archive pages.
//! - **Done**: the sink is told the run is complete. Nothing more can be
//!   queued.
//!
//! Packing always completes before the first file is emitted, so every
//! file's `siteMap` resolves to the fully populated map.
//!
//! ## Failure
//!
//! Rule and content-source errors propagate unchanged. Files queued before
//! the error stay queued. An error raised while [`Press::finish`] drives the
//! run leaves the press in [`Phase::Failed`]; every later call is refused.

use crate::data::{FileData, Meta, Payload, StageData, DEFAULT_NAMESPACE};
use crate::file::File;
use crate::markdown::RenderOptions;
use crate::ordered::OrderedMap;
use crate::paths;
use crate::rules::{
    ArchiveHrefRule, HrefRule, KeyIdentity, RuleError, SingleBucket, SlugIdentity, SlugRule,
};
use crate::site_map::{SiteMap, SiteMapHandle};
use crate::source::{ContentItem, ContentSource, MarkdownSource, PostParams, SourceError};
use crate::template::Template;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PressError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("cannot read template {path}: {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),
    #[error("content source error: {0}")]
    Source(#[from] SourceError),
    #[error("cannot {operation} while {phase}")]
    Phase {
        operation: &'static str,
        phase: Phase,
    },
    #[error("sink error: {0}")]
    Sink(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Packing,
    Emitting,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Collecting => "collecting",
            Phase::Packing => "packing",
            Phase::Emitting => "emitting",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Receives emitted files, one at a time, in queue order.
pub trait Sink {
    fn push(&mut self, file: File) -> Result<(), PressError>;

    /// Called once after the last file.
    fn done(&mut self) -> Result<(), PressError> {
        Ok(())
    }
}

impl Sink for Vec<File> {
    fn push(&mut self, file: File) -> Result<(), PressError> {
        Vec::push(self, file);
        Ok(())
    }
}

/// Counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Input files queued unchanged.
    pub passed_through: usize,
    /// Input files dropped because they are template sources.
    pub templates_skipped: usize,
    pub posts: usize,
    /// Archive pages, summed over all types.
    pub archives: usize,
    /// Files handed to the sink.
    pub emitted: usize,
    /// Generated files whose output path an earlier post or bucket of the
    /// same archive type already claimed.
    pub collisions: usize,
}

// =============================================================================
// Configuration
// =============================================================================

/// One archive type: a template plus the rules that file posts into its
/// buckets and name each bucket's page.
pub struct ArchiveType {
    name: String,
    template: PathBuf,
    href_rule: Box<dyn ArchiveHrefRule>,
    slug_rule: Box<dyn SlugRule>,
}

impl ArchiveType {
    /// Defaults: bucket hrefs equal their keys; every post goes into the
    /// single [`SINGLE_BUCKET_KEY`](crate::rules::SINGLE_BUCKET_KEY) bucket.
    pub fn new(name: impl Into<String>, template: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            href_rule: Box::new(KeyIdentity),
            slug_rule: Box::new(SingleBucket),
        }
    }

    pub fn href_rule(mut self, rule: impl ArchiveHrefRule + 'static) -> Self {
        self.href_rule = Box::new(rule);
        self
    }

    pub fn href_fn(self, rule: impl Fn(&str) -> Result<String, RuleError> + 'static) -> Self {
        self.href_rule(rule)
    }

    pub fn slug_rule(mut self, rule: impl SlugRule + 'static) -> Self {
        self.slug_rule = Box::new(rule);
        self
    }

    pub fn slug_fn(
        self,
        rule: impl Fn(&Meta) -> Result<Option<String>, RuleError> + 'static,
    ) -> Self {
        self.slug_rule(rule)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Path {
        &self.template
    }
}

/// Everything a [`Press`] is built from.
///
/// Content comes from the first of these that is set: [`Options::content`],
/// [`Options::post_params`], [`Options::markdown`]. None at all is valid and
/// produces no posts.
pub struct Options {
    template: Option<PathBuf>,
    content: Option<Box<dyn ContentSource>>,
    post_params: Option<OrderedMap<Meta>>,
    markdown: Option<MarkdownSource>,
    archives: Vec<ArchiveType>,
    locals: Map<String, Value>,
    namespace: String,
    href_rule: Box<dyn HrefRule>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            template: None,
            content: None,
            post_params: None,
            markdown: None,
            archives: Vec::new(),
            locals: Map::new(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            href_rule: Box::new(SlugIdentity),
        }
    }
}

impl Options {
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Self::default().template(template)
    }

    pub fn template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn content(mut self, source: impl ContentSource + 'static) -> Self {
        self.content = Some(Box::new(source));
        self
    }

    pub fn post_params(mut self, params: OrderedMap<Meta>) -> Self {
        self.post_params = Some(params);
        self
    }

    pub fn markdown(mut self, root: impl Into<PathBuf>, render: RenderOptions) -> Self {
        self.markdown = Some(MarkdownSource::new(root, render));
        self
    }

    /// Archive types are packed in the order they are added.
    pub fn archive(mut self, archive: ArchiveType) -> Self {
        self.archives.push(archive);
        self
    }

    pub fn locals(mut self, locals: Map<String, Value>) -> Self {
        self.locals = locals;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn href_rule(mut self, rule: impl HrefRule + 'static) -> Self {
        self.href_rule = Box::new(rule);
        self
    }

    pub fn href_fn(
        self,
        rule: impl Fn(&str, &Meta) -> Result<String, RuleError> + 'static,
    ) -> Self {
        self.href_rule(rule)
    }

    fn select_source(
        content: Option<Box<dyn ContentSource>>,
        post_params: Option<OrderedMap<Meta>>,
        markdown: Option<MarkdownSource>,
    ) -> Option<Box<dyn ContentSource>> {
        content
            .or_else(|| post_params.map(|p| Box::new(PostParams::new(p)) as Box<dyn ContentSource>))
            .or_else(|| markdown.map(|m| Box::new(m) as Box<dyn ContentSource>))
    }
}

// =============================================================================
// Engine
// =============================================================================

struct Archive {
    kind: ArchiveType,
    template_path: PathBuf,
    buckets: OrderedMap<Vec<Arc<Meta>>>,
}

pub struct Press {
    phase: Phase,
    main: Template,
    archives: Vec<Archive>,
    content: Option<Box<dyn ContentSource>>,
    locals: Map<String, Value>,
    namespace: String,
    href_rule: Box<dyn HrefRule>,
    base: Option<PathBuf>,
    queue: VecDeque<File>,
    /// Output path → slug of the post that first claimed it.
    post_paths: HashMap<PathBuf, String>,
    site_map: SiteMapHandle,
    summary: RunSummary,
}

impl Press {
    /// Validate options and read the main template.
    pub fn new(options: Options) -> Result<Self, PressError> {
        let Options {
            template,
            content,
            post_params,
            markdown,
            archives,
            locals,
            namespace,
            href_rule,
        } = options;

        let template = template
            .ok_or_else(|| PressError::Configuration("no template given".to_string()))?;
        if namespace.is_empty() {
            return Err(PressError::Configuration(
                "namespace must not be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        let mut packed = Vec::with_capacity(archives.len());
        for kind in archives {
            if kind.template.as_os_str().is_empty() {
                return Err(PressError::Configuration(format!(
                    "archive type {:?} has no template",
                    kind.name
                )));
            }
            if !seen.insert(kind.name.clone()) {
                return Err(PressError::Configuration(format!(
                    "archive type {:?} declared twice",
                    kind.name
                )));
            }
            packed.push(Archive {
                template_path: paths::absolute(&kind.template),
                kind,
                buckets: OrderedMap::new(),
            });
        }

        let main = Template::load(&template).map_err(|source| PressError::Template {
            path: template.clone(),
            source,
        })?;

        Ok(Self {
            phase: Phase::Collecting,
            main,
            archives: packed,
            content: Options::select_source(content, post_params, markdown),
            locals,
            namespace,
            href_rule,
            base: None,
            queue: VecDeque::new(),
            post_paths: HashMap::new(),
            site_map: SiteMapHandle::new(),
            summary: RunSummary::default(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle shared by every file this press produces.
    pub fn site_map(&self) -> SiteMapHandle {
        self.site_map.clone()
    }

    /// Counts so far; final once the press is [`Phase::Done`].
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Files waiting for emission.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Pass-through filter for one input file.
    ///
    /// Template sources are dropped (`Ok(false)`). Anything else gets locals
    /// and the site map layered over its existing data and is queued
    /// (`Ok(true)`). The first file seen fixes the base used for generated
    /// files.
    pub fn accept(&mut self, mut file: File) -> Result<bool, PressError> {
        self.expect_phase(Phase::Collecting, "accept input files")?;
        if self.base.is_none() {
            self.base = Some(file.base.clone());
        }

        if self.is_template(&file.path) {
            debug!(path = %file.path.display(), "skipping template source");
            self.summary.templates_skipped += 1;
            return Ok(false);
        }

        let prior = file.data.flatten();
        file.data = FileData::new(prior).layered(&self.locals, self.stage(Payload::PassThrough));
        debug!(path = %file.path.display(), "queued pass-through file");
        self.queue.push_back(file);
        self.summary.passed_through += 1;
        Ok(true)
    }

    /// Post emitter for one content item.
    ///
    /// Stamps the main template at the item's href, records `href` in the
    /// item's meta, queues the page, then files the meta into every archive
    /// type whose rule yields a bucket key. Returns the shared meta.
    pub fn emit_post(&mut self, item: ContentItem) -> Result<Arc<Meta>, PressError> {
        self.expect_phase(Phase::Collecting, "emit posts")?;
        let ContentItem {
            slug,
            mut meta,
            body,
        } = item;

        let href = self.href_rule.href(&slug, &meta)?;
        let mut file = self.main.stamp(&href, self.base.as_deref());
        if let Some(previous) = self.post_paths.insert(file.path.clone(), slug.clone()) {
            warn!(
                path = %file.path.display(),
                first = %previous,
                second = %slug,
                "two posts resolve to the same output path"
            );
            self.summary.collisions += 1;
        }
        meta.insert("href".to_string(), Value::String(href));
        let meta = Arc::new(meta);

        file.data = FileData::default().layered(
            &self.locals,
            self.stage(Payload::Post {
                slug: slug.clone(),
                meta: Arc::clone(&meta),
                body,
            }),
        );
        debug!(slug = %slug, path = %file.path.display(), "queued post");
        self.queue.push_back(file);
        self.summary.posts += 1;

        for archive in &mut self.archives {
            let Some(key) = archive.kind.slug_rule.bucket(&meta)? else {
                continue;
            };
            debug!(slug = %slug, archive = %archive.kind.name, bucket = %key, "classified");
            archive
                .buckets
                .get_or_insert_with(&key, Vec::new)
                .push(Arc::clone(&meta));
        }

        Ok(meta)
    }

    /// Feed every input file through the filter, then [`finish`](Self::finish).
    pub fn run<I, S>(&mut self, input: I, sink: &mut S) -> Result<RunSummary, PressError>
    where
        I: IntoIterator<Item = File>,
        S: Sink + ?Sized,
    {
        for file in input {
            self.accept(file)?;
        }
        self.finish(sink)
    }

    /// Drain the content source, pack archives, publish the site map and
    /// emit every queued file into `sink`.
    pub fn finish<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<RunSummary, PressError> {
        self.expect_phase(Phase::Collecting, "finish")?;
        match self.drive(sink) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!(phase = %self.phase, error = %e, "run failed");
                self.phase = Phase::Failed;
                Err(e)
            }
        }
    }

    fn drive<S: Sink + ?Sized>(&mut self, sink: &mut S) -> Result<RunSummary, PressError> {
        self.collect()?;

        self.phase = Phase::Packing;
        self.pack_archives()?;
        info!(
            archive_types = self.archives.len(),
            archive_pages = self.summary.archives,
            "archives packed"
        );

        self.phase = Phase::Emitting;
        while let Some(file) = self.queue.pop_front() {
            sink.push(file)?;
            self.summary.emitted += 1;
        }
        sink.done()?;

        self.phase = Phase::Done;
        info!(
            emitted = self.summary.emitted,
            posts = self.summary.posts,
            passed_through = self.summary.passed_through,
            "run complete"
        );
        Ok(self.summary.clone())
    }

    fn collect(&mut self) -> Result<(), PressError> {
        let Some(mut source) = self.content.take() else {
            info!("no content source configured");
            return Ok(());
        };
        info!(source = %source.describe(), "collecting content");
        while let Some(item) = source.next_item() {
            self.emit_post(item?)?;
        }
        info!(posts = self.summary.posts, "content collected");
        Ok(())
    }

    /// Archive packer: one page per bucket, types in declaration order,
    /// buckets in first-classification order.
    fn pack_archives(&mut self) -> Result<(), PressError> {
        let mut site_map = SiteMap::new();
        let mut packed = Vec::new();
        let mut collisions = 0;

        for archive in &self.archives {
            let template =
                Template::load(&archive.template_path).map_err(|source| PressError::Template {
                    path: archive.kind.template.clone(),
                    source,
                })?;
            let name = archive.kind.name();
            site_map.add_type(name);

            let mut claimed: HashMap<PathBuf, &str> = HashMap::new();
            for (key, posts) in archive.buckets.iter() {
                let href = archive.kind.href_rule.href(key)?;
                let mut file = template.stamp(&href, self.base.as_deref());
                if let Some(previous) = claimed.insert(file.path.clone(), key) {
                    warn!(
                        archive = %name,
                        path = %file.path.display(),
                        first = %previous,
                        second = %key,
                        "two buckets resolve to the same output path"
                    );
                    collisions += 1;
                }
                file.data = FileData::default().layered(
                    &self.locals,
                    self.stage(Payload::Archive {
                        archive: name.to_string(),
                        slug: key.to_string(),
                        posts: posts.clone(),
                    }),
                );
                debug!(archive = %name, bucket = %key, posts = posts.len(), "queued archive page");
                packed.push(file);
                site_map.record(name, key, href);
            }
        }

        self.summary.archives += packed.len();
        self.summary.collisions += collisions;
        self.queue.extend(packed);
        self.site_map
            .publish(site_map)
            .map_err(|_| PressError::Phase {
                operation: "publish the site map twice",
                phase: self.phase,
            })
    }

    fn stage(&self, payload: Payload) -> StageData {
        StageData {
            namespace: self.namespace.clone(),
            site_map: self.site_map.clone(),
            payload,
        }
    }

    fn is_template(&self, path: &Path) -> bool {
        paths::same_path(path, self.main.path())
            || self.archives.iter().any(|a| paths::same_path(path, &a.template_path))
    }

    fn expect_phase(&self, expected: Phase, operation: &'static str) -> Result<(), PressError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(PressError::Phase {
                operation,
                phase: self.phase,
            })
        }
    }
}
