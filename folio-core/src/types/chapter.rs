//! Chapter references produced by the manifest parser

use serde::{Deserialize, Serialize};

/// What a manifest entry points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChapterKind {
    /// A Markdown source file, relative to the manifest directory
    File,
    /// A section title with no backing file
    InlineTitle,
}

/// A single manifest entry, keyed by its manifest position
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChapterReference {
    /// Manifest position (0..N-1), the sole ordering authority
    pub index: usize,

    pub kind: ChapterKind,

    /// File path for `File`, verbatim title for `InlineTitle`
    pub target: String,
}

impl ChapterReference {
    /// Create a reference to a source file
    pub fn file(index: usize, path: impl Into<String>) -> Self {
        Self {
            index,
            kind: ChapterKind::File,
            target: path.into(),
        }
    }

    /// Create an inline section title reference
    pub fn inline_title(index: usize, title: impl Into<String>) -> Self {
        Self {
            index,
            kind: ChapterKind::InlineTitle,
            target: title.into(),
        }
    }

    /// The path part of a `File` target, without any `#fragment`
    pub fn source_path(&self) -> Option<&str> {
        match self.kind {
            ChapterKind::File => Some(
                self.target
                    .split_once('#')
                    .map_or(self.target.as_str(), |(path, _)| path),
            ),
            ChapterKind::InlineTitle => None,
        }
    }
}
