//! Converted chapter fragments

use super::AssetRef;
use serde::{Deserialize, Serialize};

/// How a fragment's slot was filled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FragmentStatus {
    /// Source file converted normally
    Converted,
    /// Synthesized from an inline manifest title
    Title,
    /// Source file did not exist; html is a diagnostic placeholder
    Missing,
    /// Source existed but could not be processed
    Failed(String),
}

impl FragmentStatus {
    /// Whether this slot carries placeholder content instead of the chapter
    pub fn is_degraded(&self) -> bool {
        matches!(self, FragmentStatus::Missing | FragmentStatus::Failed(_))
    }
}

/// The converted and resolved HTML for one chapter reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fragment {
    /// Manifest position this fragment fills
    pub index: usize,

    /// Anchor registered in front of the fragment in the merged document
    pub anchor_id: String,

    pub html: String,

    /// Assets referenced by this fragment, in document order
    pub asset_refs: Vec<AssetRef>,

    pub status: FragmentStatus,
}

impl Fragment {
    /// Create a fragment with no asset references
    pub fn new(
        index: usize,
        anchor_id: impl Into<String>,
        html: impl Into<String>,
        status: FragmentStatus,
    ) -> Self {
        Self {
            index,
            anchor_id: anchor_id.into(),
            html: html.into(),
            asset_refs: Vec::new(),
            status,
        }
    }

    /// Attach asset references
    pub fn with_asset_refs(mut self, asset_refs: Vec<AssetRef>) -> Self {
        self.asset_refs = asset_refs;
        self
    }
}
