//! Pipeline orchestration
//!
//! normalize -> order -> resolve assets -> render -> package, inside a
//! temporary working tree that is removed however the run ends.

use crate::assets::{AssetResolver, HttpImageFetcher, ImageFetcher};
use crate::config::PipelineConfig;
use crate::error::{NormalizeError, Result};
use crate::normalizer::Normalizer;
use crate::order::order;
use crate::package::package;
use crate::render::{render_fragments, TemplateSet};
use crate::source::{fetch_or_empty, Fetched, RecordSource, SourceStatus};
use crate::types::{ImageAsset, RenderContext};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

/// Only one run may own the output directory at a time
static RUN_LOCK: Mutex<()> = Mutex::new(());

/// Plain inputs for a full run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub username: String,
    pub tags: Vec<String>,
    pub query: String,
}

/// Summary of a finished run
#[derive(Debug)]
pub struct RunReport {
    /// Path of the packaged EPUB
    pub archive: PathBuf,

    pub document_id: Uuid,

    /// Verse entries after normalization
    pub entries: usize,

    /// Fragments rendered into the content document
    pub fragments: usize,

    pub images: Vec<ImageAsset>,
    pub failed_images: Vec<String>,

    /// Image references dropped for not being images
    pub discarded_refs: usize,

    pub dropped_records: Vec<NormalizeError>,
    pub source_status: SourceStatus,
}

/// Assembles EPUBs from record sets
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Box<dyn ImageFetcher>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, fetcher: Box<dyn ImageFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Pipeline downloading images over HTTP with the configured timeout
    pub fn with_http(config: PipelineConfig) -> Result<Self> {
        let fetcher = HttpImageFetcher::new(config.fetch_timeout())?;
        Ok(Self::new(config, Box::new(fetcher)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fetch records for `tags` (plus the required tags) and `query`.
    /// A failing source yields an empty record set.
    pub fn fetch(&self, source: &dyn RecordSource, tags: &[String], query: &str) -> Fetched {
        let tags = self.config.merge_required_tags(tags);
        fetch_or_empty(source, &tags, query)
    }

    /// Fetch and assemble in one go
    pub fn run(&self, source: &dyn RecordSource, request: &RunRequest) -> Result<RunReport> {
        let fetched = self.fetch(source, &request.tags, &request.query);
        self.assemble(fetched, &request.username)
    }

    /// Build the EPUB for `username` from fetched records, dated today
    pub fn assemble(&self, fetched: Fetched, username: &str) -> Result<RunReport> {
        self.assemble_on(fetched, username, Local::now().date_naive())
    }

    /// Build the EPUB with an explicit generation date
    pub fn assemble_on(
        &self,
        fetched: Fetched,
        username: &str,
        date: NaiveDate,
    ) -> Result<RunReport> {
        let _guard = RUN_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", user = %username, run = %run_id);
        let _enter = span.enter();

        let config = &self.config;
        config.validate()?;
        let normalized = Normalizer::from_config(config).normalize(&fetched.records);
        let mut sequence = order(normalized.entries);
        let templates = TemplateSet::load(config)?;

        std::fs::create_dir_all(&config.output_dir)?;
        let tree = tempfile::Builder::new()
            .prefix(".epubible-")
            .tempdir_in(&config.output_dir)?;
        tracing::debug!("Working tree {}", tree.path().display());

        let assets = AssetResolver::new(self.fetcher.as_ref())
            .with_parallelism(config.fetch_parallelism)
            .with_reserved(templates.reserved_names(&config.images_dir))
            .resolve(&mut sequence, &tree.path().join(&config.images_dir))?;

        let fragments = render_fragments(&sequence, &assets, &config.image_href_prefix);
        let fragment_count = fragments.len();
        let context = RenderContext::new(
            &config.title,
            username,
            date,
            assets.images.clone(),
            fragments,
        );
        let document_id = context.document_id;
        templates.render_into(tree.path(), &context)?;

        let archive = package(tree.path(), &config.archive_name)?;
        tree.close()?;

        tracing::info!(
            "Assembled {} with {} verses and {} images",
            archive.display(),
            sequence.len(),
            assets.images.len()
        );
        Ok(RunReport {
            archive,
            document_id,
            entries: sequence.len(),
            fragments: fragment_count,
            images: assets.images,
            failed_images: assets.failed,
            discarded_refs: assets.discarded,
            dropped_records: normalized.dropped,
            source_status: fetched.status,
        })
    }
}
