//! Concurrent chapter conversion
//!
//! Phase 1 converts every chapter reference on a bounded worker pool. Each
//! worker owns exactly one slot of the result vector, so the fragment order
//! is the manifest order no matter which worker finishes first. Phase 2
//! copies the deduplicated set of local assets on the same pool.

mod materialize;

pub use materialize::{AssetFailure, MaterializeReport};

use crate::anchor::{anchor_id, file_anchor_id};
use crate::assets::AssetResolver;
use crate::convert::FragmentConverter;
use crate::error::{FolioError, Result};
use crate::storage::OutputStore;
use crate::types::{ChapterKind, ChapterReference, CopyTaskSet, Fragment, FragmentStatus};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default worker count: the available parallelism, but never fewer than 4
/// since chapter work is partly I/O bound.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(4)
}

/// Everything the two phases produced
#[derive(Debug)]
pub struct PipelineOutput {
    /// Fragments in manifest order
    pub fragments: Vec<Fragment>,
    pub copy_tasks: CopyTaskSet,
    pub materialized: MaterializeReport,
    /// Store paths of every asset this run's fragments reference
    pub assets: Vec<String>,
}

/// Schedules chapter conversion and asset materialization
pub struct Pipeline<'a, C> {
    /// Directory chapter targets are relative to
    root: PathBuf,
    converter: C,
    resolver: AssetResolver<'a>,
    store: &'a dyn OutputStore,
    pool: rayon::ThreadPool,
}

impl<'a, C: FragmentConverter> Pipeline<'a, C> {
    /// Create a pipeline with a dedicated pool of `jobs` workers
    pub fn new(
        root: impl Into<PathBuf>,
        converter: C,
        resolver: AssetResolver<'a>,
        store: &'a dyn OutputStore,
        jobs: usize,
    ) -> Result<Self> {
        if jobs == 0 {
            return Err(FolioError::Config("jobs must be at least 1".to_string()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("folio-worker-{}", i))
            .build()
            .map_err(|e| FolioError::Pipeline(format!("failed to build worker pool: {}", e)))?;

        Ok(Self {
            root: root.into(),
            converter,
            resolver,
            store,
            pool,
        })
    }

    /// Number of workers in the pool
    pub fn jobs(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run both phases over the manifest's references
    pub fn run(&self, references: &[ChapterReference]) -> Result<PipelineOutput> {
        let fragments = self.convert_all(references)?;

        let mut copy_tasks = CopyTaskSet::new();
        for fragment in &fragments {
            copy_tasks.extend_from_refs(&fragment.asset_refs, self.resolver.asset_dir());
        }

        let materialized = self.materialize(&copy_tasks);

        let assets: BTreeSet<String> = fragments
            .iter()
            .flat_map(|f| &f.asset_refs)
            .map(|r| r.store_path(self.resolver.asset_dir()))
            .collect();

        Ok(PipelineOutput {
            fragments,
            copy_tasks,
            materialized,
            assets: assets.into_iter().collect(),
        })
    }

    /// Phase 1: convert every reference into the slot matching its index
    pub fn convert_all(&self, references: &[ChapterReference]) -> Result<Vec<Fragment>> {
        if let Some((position, reference)) = references
            .iter()
            .enumerate()
            .find(|(position, r)| r.index != *position)
        {
            return Err(FolioError::Pipeline(format!(
                "chapter reference at position {} has index {}",
                position, reference.index
            )));
        }

        tracing::info!(
            chapters = references.len(),
            jobs = self.jobs(),
            "converting chapters"
        );

        let mut slots: Vec<Option<Fragment>> = vec![None; references.len()];
        self.pool.install(|| {
            slots
                .par_iter_mut()
                .zip(references.par_iter())
                .for_each(|(slot, reference)| *slot = Some(self.process(reference)));
        });

        let fragments = slots
            .into_iter()
            .zip(references)
            .map(|(slot, reference)| {
                slot.unwrap_or_else(|| {
                    failed_fragment(reference, "worker produced no result".to_string())
                })
            })
            .collect();

        Ok(fragments)
    }

    /// Phase 2: copy local assets into the store
    pub fn materialize(&self, tasks: &CopyTaskSet) -> MaterializeReport {
        materialize::run(&self.pool, self.store, tasks)
    }

    fn process(&self, reference: &ChapterReference) -> Fragment {
        match reference.kind {
            ChapterKind::InlineTitle => title_fragment(reference),
            ChapterKind::File => self.process_file(reference),
        }
    }

    fn process_file(&self, reference: &ChapterReference) -> Fragment {
        let relative = reference.source_path().unwrap_or(&reference.target);
        let path = self.root.join(relative);

        let markdown = match std::fs::read_to_string(&path) {
            Ok(markdown) => markdown,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "chapter source not found, skipped");
                return missing_fragment(reference);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "chapter source unreadable");
                return failed_fragment(reference, e.to_string());
            }
        };

        let html = self.converter.convert(&markdown);
        let chapter_dir = path.parent().unwrap_or(Path::new(""));
        let resolved = self.resolver.resolve(&html, chapter_dir);

        tracing::debug!(
            index = reference.index,
            path = %path.display(),
            assets = resolved.asset_refs.len(),
            "converted chapter"
        );

        let mut html = resolved.html;
        if !html.ends_with('\n') {
            html.push('\n');
        }

        Fragment::new(
            reference.index,
            chapter_anchor(reference),
            html,
            FragmentStatus::Converted,
        )
        .with_asset_refs(resolved.asset_refs)
    }
}

/// Anchor a reference registers in the merged document
pub fn chapter_anchor(reference: &ChapterReference) -> String {
    let anchor = match reference.kind {
        ChapterKind::File => file_anchor_id(reference.source_path().unwrap_or(&reference.target)),
        ChapterKind::InlineTitle => anchor_id(&reference.target),
    };
    if anchor.is_empty() {
        format!("chapter-{}", reference.index)
    } else {
        anchor
    }
}

fn title_fragment(reference: &ChapterReference) -> Fragment {
    Fragment::new(
        reference.index,
        chapter_anchor(reference),
        format!("<h1>{}</h1>\n", html_escape::encode_text(&reference.target)),
        FragmentStatus::Title,
    )
}

fn missing_fragment(reference: &ChapterReference) -> Fragment {
    Fragment::new(
        reference.index,
        chapter_anchor(reference),
        format!(
            "<!-- folio: chapter source not found: {} -->\n",
            comment_safe(&reference.target)
        ),
        FragmentStatus::Missing,
    )
}

fn failed_fragment(reference: &ChapterReference, reason: String) -> Fragment {
    Fragment::new(
        reference.index,
        chapter_anchor(reference),
        format!(
            "<!-- folio: chapter could not be converted: {}: {} -->\n",
            comment_safe(&reference.target),
            comment_safe(&reason)
        ),
        FragmentStatus::Failed(reason),
    )
}

fn comment_safe(text: &str) -> String {
    text.replace("--", "- -")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::MarkdownConverter;
    use crate::storage::MemoryStorage;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_inline_title_needs_no_io() {
        let store = MemoryStorage::new();
        let pipeline = Pipeline::new(
            "/nonexistent",
            MarkdownConverter::new(),
            AssetResolver::new("images"),
            &store,
            2,
        )
        .unwrap();

        let refs = vec![ChapterReference::inline_title(0, "Part <One>")];
        let fragments = pipeline.convert_all(&refs).unwrap();

        assert_eq!(fragments[0].anchor_id, "part-one");
        assert_eq!(fragments[0].html, "<h1>Part &lt;One&gt;</h1>\n");
        assert_eq!(fragments[0].status, FragmentStatus::Title);
    }

    #[test]
    fn test_missing_and_present_chapters() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "intro.md", "# Intro\n\n![x](img/a.png)");
        write(dir.path(), "img/a.png", "png");

        let store = MemoryStorage::new();
        let pipeline = Pipeline::new(
            dir.path(),
            MarkdownConverter::new(),
            AssetResolver::new("images"),
            &store,
            2,
        )
        .unwrap();

        let refs = vec![
            ChapterReference::file(0, "intro.md"),
            ChapterReference::file(1, "missing.md"),
        ];
        let output = pipeline.run(&refs).unwrap();

        assert_eq!(output.fragments[0].status, FragmentStatus::Converted);
        assert_eq!(output.fragments[0].anchor_id, "intro");
        assert!(output.fragments[0].html.contains(r#"src="images/a.png""#));

        assert_eq!(output.fragments[1].status, FragmentStatus::Missing);
        assert!(output.fragments[1].html.contains("missing.md"));

        assert_eq!(output.materialized.copied, 1);
        assert_eq!(store.read("images/a.png").unwrap(), b"png");
    }

    #[test]
    fn test_non_contiguous_indices_rejected() {
        let store = MemoryStorage::new();
        let pipeline = Pipeline::new(
            ".",
            MarkdownConverter::new(),
            AssetResolver::new("images"),
            &store,
            1,
        )
        .unwrap();

        let refs = vec![ChapterReference::inline_title(3, "x")];
        assert!(matches!(
            pipeline.convert_all(&refs),
            Err(FolioError::Pipeline(_))
        ));
    }

    #[test]
    fn test_zero_jobs_rejected() {
        let store = MemoryStorage::new();
        let result = Pipeline::new(
            ".",
            MarkdownConverter::new(),
            AssetResolver::new("images"),
            &store,
            0,
        );
        assert!(matches!(result, Err(FolioError::Config(_))));
    }

    #[test]
    fn test_empty_anchor_falls_back_to_index() {
        let reference = ChapterReference::inline_title(7, "!!!");
        assert_eq!(chapter_anchor(&reference), "chapter-7");
    }

    #[test]
    fn test_default_jobs_is_bounded_below() {
        assert!(default_jobs() >= 4);
    }
}
