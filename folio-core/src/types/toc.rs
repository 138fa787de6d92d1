//! Table of contents types

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A node of the two-level section/chapter hierarchy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TocNode {
    /// A navigable chapter backed by a span of the merged document
    Chapter {
        title: String,
        anchor_id: String,
        /// Byte range of the chapter within the merged document
        content_range: Range<usize>,
    },

    /// A grouping opened by a top-level heading
    Section {
        title: String,
        children: Vec<TocNode>,
    },
}

impl TocNode {
    /// Create a chapter node
    pub fn chapter(
        title: impl Into<String>,
        anchor_id: impl Into<String>,
        content_range: Range<usize>,
    ) -> Self {
        TocNode::Chapter {
            title: title.into(),
            anchor_id: anchor_id.into(),
            content_range,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TocNode::Chapter { title, .. } | TocNode::Section { title, .. } => title,
        }
    }

    /// Children of a section; chapters have none
    pub fn children(&self) -> &[TocNode] {
        match self {
            TocNode::Section { children, .. } => children,
            TocNode::Chapter { .. } => &[],
        }
    }

    /// Number of chapters in this subtree
    pub fn chapter_count(&self) -> usize {
        match self {
            TocNode::Chapter { .. } => 1,
            TocNode::Section { children, .. } => {
                children.iter().map(TocNode::chapter_count).sum()
            }
        }
    }
}
