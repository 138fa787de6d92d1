//! Chapter manifest parsing
//!
//! A manifest is a Markdown outline. Lines of the form `## Title` become
//! inline section titles; every `[label](target)` link becomes a chapter
//! file. Both keep their relative document order.

use crate::error::ManifestError;
use crate::patterns::{MANIFEST_ENTRY_RE, MANIFEST_HEADING_RE};
use crate::types::ChapterReference;
use std::path::Path;

/// URL scheme used for inline titles in the rewritten manifest
pub const RAW_TITLE_SCHEME: &str = "rawchaptertext";

/// A parsed manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Chapter references, indexed 0..N-1 in document order
    pub references: Vec<ChapterReference>,

    /// The manifest with every heading line turned into a raw-title link
    pub rewritten: String,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Parse manifest text into ordered chapter references
pub fn parse_manifest(text: &str) -> Manifest {
    let mut references = Vec::new();

    for caps in MANIFEST_ENTRY_RE.captures_iter(text) {
        let index = references.len();
        if let Some(title) = caps.name("title") {
            let title = title.as_str().trim_end();
            if title.is_empty() {
                continue;
            }
            references.push(ChapterReference::inline_title(index, title));
        } else if let Some(target) = caps.name("target") {
            references.push(ChapterReference::file(index, target.as_str().trim()));
        }
    }

    let rewritten = MANIFEST_HEADING_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let title = caps["title"].trim_end();
            if title.is_empty() {
                caps[0].to_string()
            } else {
                format!("[{title}]({RAW_TITLE_SCHEME}:{title}){}", &caps["eol"])
            }
        })
        .into_owned();

    tracing::debug!(entries = references.len(), "parsed manifest");

    Manifest {
        references,
        rewritten,
    }
}

/// Read and parse a manifest file. Failure here is fatal for a build.
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
        _ => ManifestError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    Ok(parse_manifest(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChapterKind;

    const SUMMARY: &str = "# Summary\n\n\
        [Preface](preface.md)\n\n\
        ## Part One\n\n\
        - [Getting Started](guide/start.md)\n\
        - [Install](guide/install.md#linux)\n\n\
        ## Part Two  \n\n\
        - [Reference](ref.md)\n";

    #[test]
    fn test_entries_in_document_order() {
        let manifest = parse_manifest(SUMMARY);
        let entries: Vec<(usize, ChapterKind, &str)> = manifest
            .references
            .iter()
            .map(|r| (r.index, r.kind, r.target.as_str()))
            .collect();

        assert_eq!(
            entries,
            vec![
                (0, ChapterKind::File, "preface.md"),
                (1, ChapterKind::InlineTitle, "Part One"),
                (2, ChapterKind::File, "guide/start.md"),
                (3, ChapterKind::File, "guide/install.md#linux"),
                (4, ChapterKind::InlineTitle, "Part Two"),
                (5, ChapterKind::File, "ref.md"),
            ]
        );
    }

    #[test]
    fn test_heading_must_start_line() {
        let manifest = parse_manifest("text ## not a title\n###  Deeper\n## Real\n");
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.references[0].target, "Real");
    }

    #[test]
    fn test_rewritten_manifest() {
        let manifest = parse_manifest("## Part One\r\n- [A](a.md)\n##   \n");
        assert_eq!(
            manifest.rewritten,
            "[Part One](rawchaptertext:Part One)\r\n- [A](a.md)\n##   \n"
        );
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = parse_manifest("# Summary\n\nNothing here yet.\n");
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_manifest(&dir.path().join("SUMMARY.md")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound(_)));
    }
}
