//! The merged, single-namespace document

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered concatenation of every fragment, each preceded by its anchor
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MergedDocument {
    html: String,

    /// Fragment anchors in the order they were registered
    anchors: Vec<String>,
}

impl MergedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one anchored fragment
    pub fn push_fragment(&mut self, anchor_id: &str, html: &str) {
        self.html.push_str("<a id=\"");
        self.html
            .push_str(&html_escape::encode_double_quoted_attribute(anchor_id));
        self.html.push_str("\"></a>\n");
        self.html.push_str(html);
        self.anchors.push(anchor_id.to_string());
    }

    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn anchors(&self) -> &[String] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }

    /// Fragment anchors registered more than once, in first-seen order.
    /// Navigation to such an anchor lands on its last occurrence.
    pub fn duplicate_anchors(&self) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for anchor in &self.anchors {
            *counts.entry(anchor.as_str()).or_default() += 1;
        }

        let mut seen = Vec::new();
        for anchor in &self.anchors {
            if counts[anchor.as_str()] > 1 && !seen.contains(anchor) {
                seen.push(anchor.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_anchors() {
        let mut doc = MergedDocument::new();
        doc.push_fragment("intro", "<p>a</p>\n");
        doc.push_fragment("setup", "<p>b</p>\n");
        doc.push_fragment("intro", "<p>c</p>\n");

        assert_eq!(doc.duplicate_anchors(), vec!["intro".to_string()]);
        assert!(doc.as_str().starts_with("<a id=\"intro\"></a>\n<p>a</p>"));
    }
}
