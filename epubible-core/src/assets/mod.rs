//! Image asset resolution
//!
//! Finds the image references in an ordered verse sequence, drops the ones
//! that are not embeddable images, downloads each distinct URL once and
//! stores it in the working tree's images directory.

mod fetch;

pub use fetch::{HttpImageFetcher, ImageFetcher};

use crate::error::{FetchError, Result};
use crate::types::{ImageAsset, ImageKind, ImageRef, OrderedVerseSequence};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Outcome of resolving a sequence's images
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    /// Downloaded images in first-reference order
    pub images: Vec<ImageAsset>,

    /// URLs whose download failed
    pub failed: Vec<String>,

    /// Number of references dropped for not being images
    pub discarded: usize,
}

impl ResolvedAssets {
    /// Map from source URL to asset
    pub fn index(&self) -> HashMap<&str, &ImageAsset> {
        self.images
            .iter()
            .map(|a| (a.source_url.as_str(), a))
            .collect()
    }
}

/// Resolves image references against a fetcher
pub struct AssetResolver<'a> {
    fetcher: &'a dyn ImageFetcher,
    parallelism: usize,
    reserved: Vec<String>,
}

impl<'a> AssetResolver<'a> {
    pub fn new(fetcher: &'a dyn ImageFetcher) -> Self {
        Self {
            fetcher,
            parallelism: 1,
            reserved: Vec::new(),
        }
    }

    /// File names already present in the images directory. A download
    /// whose name matches one of these gets a qualified name instead.
    pub fn with_reserved(mut self, names: Vec<String>) -> Self {
        self.reserved = names;
        self
    }

    /// Allow up to `jobs` downloads at once
    pub fn with_parallelism(mut self, jobs: usize) -> Self {
        self.parallelism = jobs.max(1);
        self
    }

    /// Resolve every image reference in `sequence`, writing downloads into
    /// `images_dir`. References that are not images or whose download failed
    /// are removed from their entries; entries themselves are kept.
    pub fn resolve(
        &self,
        sequence: &mut OrderedVerseSequence,
        images_dir: &Path,
    ) -> Result<ResolvedAssets> {
        tracing::info!("Getting images");
        let mut resolved = ResolvedAssets {
            discarded: discard_non_images(sequence),
            ..ResolvedAssets::default()
        };

        let plan = plan_downloads(sequence, &self.reserved);
        if plan.is_empty() {
            tracing::info!("No images referenced");
            return Ok(resolved);
        }
        tracing::info!(
            "Found {} distinct images: {:?}",
            plan.len(),
            plan.iter().map(|p| p.source_url.as_str()).collect::<Vec<_>>()
        );

        std::fs::create_dir_all(images_dir).map_err(|source| FetchError::Io {
            path: images_dir.display().to_string(),
            source,
        })?;

        for (planned, outcome) in self.download(&plan) {
            let stored = outcome.and_then(|bytes| {
                let path = images_dir.join(&planned.filename);
                std::fs::write(&path, bytes).map_err(|source| FetchError::Io {
                    path: path.display().to_string(),
                    source,
                })
            });
            match stored {
                Ok(()) => resolved.images.push(planned.clone()),
                Err(e) => {
                    tracing::warn!(url = %planned.source_url, "Skipping image: {}", e);
                    resolved.failed.push(planned.source_url.clone());
                }
            }
        }

        if !resolved.failed.is_empty() {
            let failed: HashSet<&str> = resolved.failed.iter().map(String::as_str).collect();
            for entry in sequence.entries_mut() {
                entry
                    .image_refs
                    .retain(|r| !failed.contains(r.url.as_str()));
            }
        }

        tracing::info!(
            "Downloaded {} images, {} failed",
            resolved.images.len(),
            resolved.failed.len()
        );
        Ok(resolved)
    }

    /// Fetch every planned image; results keep the plan's order
    fn download<'p>(
        &self,
        plan: &'p [ImageAsset],
    ) -> Vec<(&'p ImageAsset, std::result::Result<Vec<u8>, FetchError>)> {
        let fetch = |p: &'p ImageAsset| (p, self.fetcher.fetch(&p.source_url));

        if self.parallelism <= 1 || plan.len() == 1 {
            return plan.iter().map(fetch).collect();
        }

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .build()
        {
            Ok(pool) => pool.install(|| plan.par_iter().map(fetch).collect()),
            Err(e) => {
                tracing::warn!("Cannot start fetch pool, downloading sequentially: {}", e);
                plan.iter().map(fetch).collect()
            }
        }
    }
}

/// Classify a reference, returning its image kind when embeddable
fn classify(image: &ImageRef) -> Option<ImageKind> {
    ImageKind::from_url(&image.url).or_else(|| {
        image
            .declared_mime
            .as_deref()
            .and_then(ImageKind::from_mime)
    })
}

/// Drop every reference that is not an embeddable image
fn discard_non_images(sequence: &mut OrderedVerseSequence) -> usize {
    let mut discarded = 0;
    for entry in sequence.entries_mut() {
        let about = entry.about.clone();
        entry.image_refs.retain(|image| {
            let keep = classify(image).is_some();
            if !keep {
                tracing::info!(
                    about = %about,
                    url = %image.url,
                    "Not a valid image, dropping reference"
                );
                discarded += 1;
            }
            keep
        });
    }
    discarded
}

/// One asset per distinct URL, in first-reference order. File names avoid
/// `reserved` and each other; manifest ids are unique.
fn plan_downloads(sequence: &OrderedVerseSequence, reserved: &[String]) -> Vec<ImageAsset> {
    let mut seen = HashSet::new();
    let mut taken: HashSet<String> = reserved.iter().cloned().collect();
    let mut ids = HashSet::new();
    let mut plan = Vec::new();

    for image in sequence.iter().flat_map(|e| e.image_refs.iter()) {
        if !seen.insert(image.url.clone()) {
            continue;
        }
        let Some(kind) = classify(image) else {
            continue;
        };

        let mut filename = local_filename(&image.url, kind);
        if taken.contains(&filename) {
            let qualified = qualify_filename(&filename, &image.url);
            tracing::debug!(url = %image.url, %filename, %qualified, "Filename collision");
            filename = qualified;
        }
        taken.insert(filename.clone());

        let mut asset = ImageAsset::new(&image.url, filename, kind);
        if !ids.insert(asset.id.clone()) {
            asset.id = format!("{}-{}", asset.id, url_tag(&image.url));
            ids.insert(asset.id.clone());
        }
        plan.push(asset);
    }
    plan
}

/// File name for a URL: its final path segment, percent-decoded and
/// restricted to `[A-Za-z0-9._-]`, with the kind's extension appended when
/// the segment lacks it
pub fn local_filename(url: &str, kind: ImageKind) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));

    let mut name: String = decoded
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let suffix = format!(".{}", kind.extension());
    if !name.ends_with(&suffix) {
        name.push_str(&suffix);
    }
    if name == suffix {
        name = format!("image{}", suffix);
    }
    name
}

/// First 8 hex digits of the URL's SHA-256
fn url_tag(url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    digest[..8].to_string()
}

/// Insert a short URL hash before the extension: `a.png` -> `a-1f2e3d4c.png`
fn qualify_filename(filename: &str, url: &str) -> String {
    let tag = url_tag(url);
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{}-{}.{}", stem, tag, ext),
        None => format!("{}-{}", filename, tag),
    }
}
