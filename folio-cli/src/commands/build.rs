//! Build command implementation

use anyhow::{Context, Result};
use folio_core::{BookBuilder, BuildConfig, BuildReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line settings that take precedence over `folio.json`
#[derive(Debug, Default)]
pub struct Overrides {
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub no_remote: bool,
    pub template: Option<PathBuf>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub authors: Vec<String>,
    pub formats: Vec<String>,
    pub clean: bool,
}

impl Overrides {
    fn apply(self, mut config: BuildConfig) -> BuildConfig {
        if let Some(out_dir) = self.out_dir {
            config = config.with_out_dir(out_dir);
        }
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(jobs);
        }
        if self.no_remote {
            config = config.with_fetch_remote(false);
        }
        if let Some(template) = self.template {
            config = config.with_template(template);
        }
        if let Some(title) = self.title {
            config = config.with_title(title);
        }
        if let Some(language) = self.language {
            config = config.with_language(language);
        }
        if !self.authors.is_empty() {
            config = config.with_authors(self.authors);
        }
        if !self.formats.is_empty() {
            config = config.with_formats(self.formats);
        }
        if self.clean {
            config = config.with_clean(true);
        }
        config
    }
}

/// Build the book at `root`
pub fn build(root: &Path, overrides: Overrides, json: bool) -> Result<()> {
    let config = BuildConfig::load(root)
        .with_context(|| format!("Failed to load configuration from {}", root.display()))?;
    let config = overrides.apply(config);

    // Set up progress spinner
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let spinner = pb.clone();
    let report = BookBuilder::new(config)
        .with_progress(move |phase| spinner.set_message(format!("{}...", phase)))
        .build();

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e).with_context(|| format!("Failed to build {}", root.display()));
        }
    };

    pb.finish_with_message(format!(
        "Built '{}' -> {}",
        report.title,
        report.out_dir.display()
    ));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &BuildReport) {
    println!("Title:       {}", report.title);
    println!("Chapters:    {} ({} converted)", report.chapters, report.converted);
    println!("Assets:      {}", report.assets_copied);
    println!("Jobs:        {}", report.jobs);
    println!("Outputs:     {}", report.outputs.join(", "));

    for chapter in &report.degraded {
        println!("Skipped:     {} ({})", chapter.target, chapter.reason);
    }
    for failure in &report.asset_failures {
        println!("Asset error: {} ({})", failure.dest_path, failure.reason);
    }
    if !report.duplicate_anchors.is_empty() {
        println!("Duplicate anchors: {}", report.duplicate_anchors.join(", "));
    }
}
