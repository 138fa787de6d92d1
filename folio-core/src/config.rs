//! Build configuration

use crate::error::{FolioError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional configuration file looked up in the book root
pub const CONFIG_FILE_NAME: &str = "folio.json";

/// Settings for one book build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Book root holding the manifest; never read from the config file
    #[serde(skip)]
    pub root: PathBuf,

    /// Output directory, relative to the working directory
    pub out_dir: PathBuf,

    pub manifest_name: String,

    /// Canonical asset directory inside the output directory
    pub asset_dir: String,

    /// Worker count; defaults to the available parallelism, at least 4
    pub jobs: Option<usize>,

    pub fetch_remote: bool,
    pub fetch_timeout_secs: u64,

    /// Page template; `start.html` in the root is used when present
    pub template: Option<PathBuf>,

    /// Book title; defaults to the root directory name
    pub title: Option<String>,
    pub language: String,
    pub authors: Vec<String>,

    /// Output formats to export (`html`, `epub`)
    pub formats: Vec<String>,

    /// Wipe the output directory before building
    pub clean: bool,

    pub inline_toc: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            out_dir: PathBuf::from("build"),
            manifest_name: "SUMMARY.md".to_string(),
            asset_dir: "images".to_string(),
            jobs: None,
            fetch_remote: true,
            fetch_timeout_secs: 30,
            template: None,
            title: None,
            language: "en".to_string(),
            authors: Vec::new(),
            formats: vec!["html".to_string(), "epub".to_string()],
            clean: false,
            inline_toc: true,
        }
    }
}

impl BuildConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load `folio.json` from the root if present, otherwise defaults
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        let mut config: Self = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                FolioError::Config(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn with_fetch_remote(mut self, fetch_remote: bool) -> Self {
        self.fetch_remote = fetch_remote;
        self
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = authors;
        self
    }

    pub fn with_formats(mut self, formats: Vec<String>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest_name)
    }

    /// Title used in metadata and the built-in template
    pub fn effective_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| {
            self.root
                .canonicalize()
                .ok()
                .as_deref()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled".to_string())
        })
    }

    /// Reject settings no build can run with
    pub fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(FolioError::Config("jobs must be at least 1".to_string()));
        }
        if self.asset_dir.trim_matches('/').is_empty() {
            return Err(FolioError::Config("asset_dir must not be empty".to_string()));
        }
        if self.formats.is_empty() {
            return Err(FolioError::Config("no output formats selected".to_string()));
        }
        Ok(())
    }
}
