//! End-to-end book build
//!
//! Reads the manifest, runs the pipeline, and writes every artifact into
//! the output directory:
//!
//! ```text
//! build/
//!   summary.md      manifest with inline titles as raw-title links
//!   combined.html   the merged document
//!   final.html      merged document inside the page template
//!   final.epub      one page per chapter
//!   images/         canonical assets
//! ```

use crate::assemble::assemble;
use crate::assets::{AssetResolver, HttpFetcher, RemoteFetcher};
use crate::config::BuildConfig;
use crate::convert::MarkdownConverter;
use crate::error::{ExportError, FolioError, Result};
use crate::export::{epub_stylesheet_path, exporter_for_format, AssembledBook, BookMetadata, Template};
use crate::manifest::read_manifest;
use crate::pipeline::{default_jobs, AssetFailure, Pipeline};
use crate::segment::ChapterSegmenter;
use crate::storage::{LocalStorage, OutputStore};
use crate::types::{FragmentStatus, TocNode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rewritten manifest
pub const SUMMARY_FILE: &str = "summary.md";
/// Merged document without a template
pub const COMBINED_FILE: &str = "combined.html";
/// Stem of the exported files (`final.html`, `final.epub`)
pub const FINAL_STEM: &str = "final";
/// Template picked up from the book root when none is configured
pub const DEFAULT_TEMPLATE: &str = "start.html";

/// Build phases, reported to an optional progress callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Manifest,
    Convert,
    Template,
    Segment,
    Export,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BuildPhase::Manifest => "Reading manifest",
            BuildPhase::Convert => "Converting chapters",
            BuildPhase::Template => "Applying template",
            BuildPhase::Segment => "Splitting chapters",
            BuildPhase::Export => "Exporting",
        };
        f.write_str(label)
    }
}

/// A chapter that produced placeholder content
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DegradedChapter {
    pub index: usize,
    pub target: String,
    pub reason: String,
}

/// Summary of a finished build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub title: String,
    pub out_dir: PathBuf,
    pub jobs: usize,
    /// Manifest entries, inline titles included
    pub chapters: usize,
    pub converted: usize,
    pub degraded: Vec<DegradedChapter>,
    pub assets_copied: usize,
    pub asset_failures: Vec<AssetFailure>,
    pub asset_collisions: Vec<String>,
    pub duplicate_anchors: Vec<String>,
    pub toc: Vec<TocNode>,
    /// Output-relative paths of the written files
    pub outputs: Vec<String>,
    pub built_at: DateTime<Utc>,
}

impl BuildReport {
    /// Whether every chapter and asset made it into the output
    pub fn is_clean(&self) -> bool {
        self.degraded.is_empty() && self.asset_failures.is_empty()
    }
}

type ProgressFn = Box<dyn Fn(BuildPhase) + Send + Sync>;

/// Builds one book from a [`BuildConfig`]
pub struct BookBuilder {
    config: BuildConfig,
    fetcher: Option<Box<dyn RemoteFetcher>>,
    progress: Option<ProgressFn>,
}

impl BookBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            fetcher: None,
            progress: None,
        }
    }

    /// Use this fetcher for remote assets instead of the HTTP client
    pub fn with_fetcher(mut self, fetcher: Box<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Call `progress` as each build phase starts
    pub fn with_progress(mut self, progress: impl Fn(BuildPhase) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    fn phase(&self, phase: BuildPhase) {
        tracing::info!("{}", phase);
        if let Some(progress) = &self.progress {
            progress(phase);
        }
    }

    pub fn build(&self) -> Result<BuildReport> {
        let config = &self.config;
        config.validate()?;

        let exporters = config
            .formats
            .iter()
            .map(|format| {
                exporter_for_format(format)
                    .ok_or_else(|| ExportError::UnsupportedFormat(format.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let store = prepare_output(&config.out_dir, config.clean)?;

        self.phase(BuildPhase::Manifest);
        let manifest = read_manifest(&config.manifest_path())?;
        store.write(SUMMARY_FILE, manifest.rewritten.as_bytes())?;
        tracing::info!(entries = manifest.len(), "manifest parsed");

        self.phase(BuildPhase::Convert);
        let http;
        let fetcher: Option<&dyn RemoteFetcher> = match (&self.fetcher, config.fetch_remote) {
            (_, false) => None,
            (Some(fetcher), true) => Some(fetcher.as_ref()),
            (None, true) => {
                http = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;
                Some(&http)
            }
        };

        let mut resolver = AssetResolver::new(config.asset_dir.as_str());
        if let Some(fetcher) = fetcher {
            resolver = resolver.with_remote(fetcher, &store);
        }

        let jobs = config.jobs.unwrap_or_else(default_jobs);
        let pipeline = Pipeline::new(&config.root, MarkdownConverter::new(), resolver, &store, jobs)?;
        let output = pipeline.run(&manifest.references)?;

        let document = assemble(&output.fragments);
        store.write(COMBINED_FILE, document.as_str().as_bytes())?;

        self.phase(BuildPhase::Template);
        let title = config.effective_title();
        let template = self.load_template(&title)?;
        let stylesheets = copy_stylesheets(&template, &config.root, &store);

        self.phase(BuildPhase::Segment);
        let segmentation = ChapterSegmenter::new()
            .with_stylesheets(stylesheets.iter().map(|s| epub_stylesheet_path(s)).collect())
            .segment(&document);

        self.phase(BuildPhase::Export);
        let metadata = BookMetadata {
            title: title.clone(),
            language: config.language.clone(),
            authors: config.authors.clone(),
        };
        let book = AssembledBook {
            metadata: &metadata,
            document: &document,
            segmentation: &segmentation,
            template: &template,
            stylesheets: &stylesheets,
            assets: &output.assets,
            inline_toc: config.inline_toc,
        };

        let mut outputs = vec![SUMMARY_FILE.to_string(), COMBINED_FILE.to_string()];
        for exporter in &exporters {
            let file_name = format!("{}.{}", FINAL_STEM, exporter.file_extension());
            let mut buffer = Vec::new();
            exporter.export(&book, &store, &mut buffer)?;
            store.write(&file_name, &buffer)?;
            tracing::info!(format = exporter.format_name(), file = %file_name, "exported");
            outputs.push(file_name);
        }

        let degraded: Vec<DegradedChapter> = output
            .fragments
            .iter()
            .filter(|f| f.status.is_degraded())
            .map(|f| DegradedChapter {
                index: f.index,
                target: manifest.references[f.index].target.clone(),
                reason: match &f.status {
                    FragmentStatus::Failed(reason) => reason.clone(),
                    _ => "source not found".to_string(),
                },
            })
            .collect();

        Ok(BuildReport {
            title,
            out_dir: config.out_dir.clone(),
            jobs: pipeline.jobs(),
            chapters: manifest.len(),
            converted: output
                .fragments
                .iter()
                .filter(|f| f.status == FragmentStatus::Converted)
                .count(),
            degraded,
            assets_copied: output.materialized.copied,
            asset_failures: output.materialized.failures,
            asset_collisions: output.materialized.collisions,
            duplicate_anchors: document.duplicate_anchors(),
            toc: segmentation.toc,
            outputs,
            built_at: Utc::now(),
        })
    }

    fn load_template(&self, title: &str) -> Result<Template> {
        if let Some(path) = &self.config.template {
            return Ok(Template::load(path)?);
        }

        let default = self.config.root.join(DEFAULT_TEMPLATE);
        if default.is_file() {
            tracing::debug!(path = %default.display(), "using template from book root");
            return Ok(Template::load(&default)?);
        }

        Ok(Template::builtin(title, &self.config.language))
    }
}

/// Create the output directory. Existing content, the asset directory in
/// particular, is kept unless `clean` is set.
fn prepare_output(out_dir: &Path, clean: bool) -> Result<LocalStorage> {
    if clean && out_dir.exists() {
        tracing::debug!(path = %out_dir.display(), "removing previous output");
        std::fs::remove_dir_all(out_dir)?;
    }
    std::fs::create_dir_all(out_dir).map_err(|e| {
        FolioError::Config(format!(
            "cannot create output directory {}: {}",
            out_dir.display(),
            e
        ))
    })?;
    Ok(LocalStorage::new(out_dir))
}

/// Copy the template's stylesheets into the store at their relative
/// hrefs. Returns the store paths that were copied.
fn copy_stylesheets(template: &Template, root: &Path, store: &dyn OutputStore) -> Vec<String> {
    let base = template.base_dir().unwrap_or(root);

    let mut copied = Vec::new();
    for href in template.stylesheets() {
        let path = href
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string();
        match store.copy_in(&base.join(&path), &path) {
            Ok(()) => copied.push(path),
            Err(e) => tracing::warn!(href = %href, error = %e, "stylesheet not copied"),
        }
    }
    copied
}
