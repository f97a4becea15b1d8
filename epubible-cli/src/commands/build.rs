//! Build command implementation

use crate::{BuildArgs, EXIT_SOURCE_FAILURE};
use anyhow::{bail, Context, Result};
use epubible_core::source::{FluidinfoSource, JsonFileSource, RecordSource, SourceStatus};
use epubible_core::{EpubibleError, Pipeline, PipelineConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Resolve the pipeline configuration from the config file and flags
fn load_config(args: &BuildArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path).map_err(EpubibleError::from)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &args.template_dir {
        config.template_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(url) = &args.service_url {
        config.record_service_url = url.clone();
    }
    Ok(config)
}

/// Pick the record source: a saved response file or the live service
fn open_source(args: &BuildArgs, config: &PipelineConfig) -> Result<Box<dyn RecordSource>> {
    if let Some(path) = &args.source_file {
        tracing::info!("Reading records from {}", path.display());
        return Ok(Box::new(JsonFileSource::new(path)));
    }

    let Some(password) = &args.password else {
        bail!("A password is required to query the record service (use --password or EPUBIBLE_PASSWORD)");
    };
    tracing::info!("Logging in as {}", args.username);
    let source = FluidinfoSource::new(
        &config.record_service_url,
        &args.username,
        password,
        config.fetch_timeout(),
    )
    .map_err(EpubibleError::from)?;
    Ok(Box::new(source))
}

/// Run the full batch: credentials, tag setup, fetch, mark as read,
/// assembly and packaging. Returns the process exit code.
pub fn build(args: &BuildArgs) -> Result<u8> {
    let config = load_config(args)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Acquiring credentials...");
    let source = open_source(args, &config)?;

    if args.create_has_read {
        pb.set_message("Creating has-read tag...");
        tracing::info!("Processing has-read tag");
        source
            .create_read_tag(&args.username)
            .map_err(EpubibleError::from)
            .context("Failed to create has-read tag")?;
    } else {
        tracing::info!("Has-read tag ignored");
    }

    let tags = config.merge_required_tags(&args.tags);
    tracing::info!(?tags, "Tags to retrieve");

    let query = match (&args.query, &args.source_file) {
        (Some(query), _) => query.clone(),
        (None, Some(_)) => String::new(),
        (None, None) => bail!("A query is required to select verses (use --query)"),
    };
    tracing::info!(query = %query, "Query");

    let pipeline = Pipeline::with_http(config).context("Failed to set up image fetching")?;

    pb.set_message("Fetching records...");
    let fetched = pipeline.fetch(source.as_ref(), &tags, &query);
    if let SourceStatus::Unavailable(reason) = &fetched.status {
        println!(
            "There was a problem getting your results ({}). Check the log!",
            reason
        );
    }

    if args.no_mark_read {
        tracing::info!("Not marking objects as read");
    } else {
        pb.set_message("Marking objects as read...");
        let today = chrono::Local::now().date_naive();
        if let Err(e) = source.mark_as_read(&args.username, &query, today) {
            tracing::warn!(query = %query, "Failed to mark objects as read: {}", e);
        }
    }

    pb.set_message("Assembling EPUB...");
    let report = pipeline
        .assemble(fetched, &args.username)
        .context("Failed to assemble EPUB")?;

    pb.finish_and_clear();

    println!("Built '{}' -> {}", pipeline.config().title, report.archive.display());
    println!("  {} verses, {} images", report.entries, report.images.len());

    if !report.failed_images.is_empty() {
        println!("Skipped {} images that could not be downloaded:", report.failed_images.len());
        for url in &report.failed_images {
            println!("  {}", url);
        }
    }
    if !report.dropped_records.is_empty() {
        println!("Skipped {} malformed records", report.dropped_records.len());
    }

    match report.source_status {
        SourceStatus::Ok => Ok(0),
        SourceStatus::Unavailable(_) => Ok(EXIT_SOURCE_FAILURE),
    }
}
