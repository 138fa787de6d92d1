//! Merging fragments into one addressable document

use crate::types::{Fragment, MergedDocument};

/// Concatenate fragments in slice order, each preceded by its anchor.
///
/// The caller passes fragments in manifest order; this function never
/// reorders them.
pub fn assemble(fragments: &[Fragment]) -> MergedDocument {
    let mut document = MergedDocument::new();
    for fragment in fragments {
        document.push_fragment(&fragment.anchor_id, &fragment.html);
    }

    let duplicates = document.duplicate_anchors();
    if !duplicates.is_empty() {
        tracing::warn!(
            anchors = ?duplicates,
            "duplicate chapter anchors, links resolve to the last occurrence"
        );
    }

    tracing::debug!(
        fragments = fragments.len(),
        bytes = document.len(),
        "assembled document"
    );
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FragmentStatus;

    #[test]
    fn test_fragments_are_anchored_in_order() {
        let fragments = vec![
            Fragment::new(0, "part-one", "<h1>Part One</h1>\n", FragmentStatus::Title),
            Fragment::new(1, "intro", "<h2 id=\"intro\">Intro</h2>\n", FragmentStatus::Converted),
        ];

        let document = assemble(&fragments);

        assert_eq!(
            document.as_str(),
            "<a id=\"part-one\"></a>\n<h1>Part One</h1>\n\
             <a id=\"intro\"></a>\n<h2 id=\"intro\">Intro</h2>\n"
        );
        assert_eq!(document.anchors(), &["part-one".to_string(), "intro".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        let document = assemble(&[]);
        assert!(document.is_empty());
        assert!(document.anchors().is_empty());
    }
}
