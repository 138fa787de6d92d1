//! Folio Core Library
//!
//! Assembles a book written as a directory of Markdown chapters, indexed by a
//! `SUMMARY.md` manifest, into one addressable HTML document. The document is
//! then split into a two-level table of contents and exported as a templated
//! HTML page and an EPUB container.
//!
//! The stages, in order: [`manifest`] → [`pipeline`] (with [`convert`] and
//! [`assets`]) → [`assemble`] → [`segment`] → [`export`]. [`BookBuilder`]
//! runs all of them against an output directory.

pub mod anchor;
pub mod assemble;
pub mod assets;
pub mod builder;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod manifest;
mod patterns;
pub mod pipeline;
pub mod segment;
pub mod storage;
pub mod types;

pub use assemble::assemble;
pub use builder::{BookBuilder, BuildPhase, BuildReport};
pub use config::BuildConfig;
pub use error::{AssetError, ExportError, FolioError, ManifestError, Result, StorageError};
pub use manifest::{parse_manifest, read_manifest, Manifest};
pub use pipeline::{Pipeline, PipelineOutput};
pub use segment::{ChapterSegmenter, ChapterUnit, Segmentation};
pub use types::{
    AssetRef, ChapterKind, ChapterReference, Fragment, FragmentStatus, MergedDocument, TocNode,
};
