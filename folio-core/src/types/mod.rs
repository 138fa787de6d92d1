//! Core types shared across the assembly pipeline

mod asset;
mod chapter;
mod document;
mod fragment;
mod toc;

pub use asset::{AssetCopyTask, AssetOrigin, AssetRef, CopyTaskSet};
pub use chapter::{ChapterKind, ChapterReference};
pub use document::MergedDocument;
pub use fragment::{Fragment, FragmentStatus};
pub use toc::TocNode;
