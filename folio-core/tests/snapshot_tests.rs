//! Snapshot tests for folio-core using insta
//!
//! These tests capture the manifest and table-of-contents structure of a
//! small sample book to detect unintended changes.

use folio_core::assets::AssetResolver;
use folio_core::convert::MarkdownConverter;
use folio_core::pipeline::Pipeline;
use folio_core::storage::MemoryStorage;
use folio_core::{assemble, parse_manifest, ChapterSegmenter};
use std::fs;
use tempfile::TempDir;

const SUMMARY: &str = "# Summary

[Preface](preface.md)

## Part One

- [Getting Started](guide/start.md)
- [Configuration](guide/config.md)

## Part Two

- [Reference](ref.md)
";

/// Helper to create the sample book on disk
fn sample_book() -> TempDir {
    let dir = TempDir::new().unwrap();
    let files = [
        ("SUMMARY.md", SUMMARY),
        ("preface.md", "# Preface\n\nWelcome to the book.\n"),
        ("guide/start.md", "## Getting Started\n\nInstall it.\n"),
        ("guide/config.md", "## Configuration\n\n### Options\n\nSet them.\n"),
        ("ref.md", "## Reference\n\nEverything else.\n"),
    ];
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn test_snapshot_manifest_references() {
    let manifest = parse_manifest(SUMMARY);
    insta::assert_json_snapshot!("manifest_references", manifest.references);
}

#[test]
fn test_snapshot_toc_outline() {
    let dir = sample_book();
    let manifest = parse_manifest(SUMMARY);

    let store = MemoryStorage::new();
    let pipeline = Pipeline::new(
        dir.path(),
        MarkdownConverter::new(),
        AssetResolver::new("images"),
        &store,
        4,
    )
    .unwrap();
    let output = pipeline.run(&manifest.references).unwrap();
    let segmentation = ChapterSegmenter::new().segment(&assemble(&output.fragments));

    insta::assert_snapshot!("toc_outline", segmentation.outline());
}
