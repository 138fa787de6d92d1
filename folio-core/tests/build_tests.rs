//! End-to-end build tests

use folio_core::builder::{BookBuilder, BuildPhase};
use folio_core::{BuildConfig, FolioError, ManifestError};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn sample_book(dir: &Path) {
    write(
        dir,
        "SUMMARY.md",
        "# Summary\n\n[Preface](preface.md)\n\n## Part One\n\n\
         - [Start](part1/start.md)\n- [Missing](part1/missing.md)\n",
    );
    write(dir, "preface.md", "# Preface\n\n![cover](img/cover.png)\n");
    write(
        dir,
        "part1/start.md",
        "## Start\n\nBack to the [preface](../preface.md).\n",
    );
    write(dir, "img/cover.png", "PNG");
    write(
        dir,
        "start.html",
        "<html><head><link rel=\"stylesheet\" href=\"theme/book.css\"></head>\
         <body><p>template placeholder</p></body></html>",
    );
    write(dir, "theme/book.css", "body { margin: 0; }");
}

fn config(root: &Path, out: &Path) -> BuildConfig {
    BuildConfig::new(root)
        .with_out_dir(out)
        .with_fetch_remote(false)
        .with_title("Sample")
        .with_authors(vec!["Jane Doe".to_string()])
        .with_jobs(2)
}

fn epub_entries(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    archive.file_names().map(str::to_string).collect()
}

#[test]
fn test_full_build_writes_every_artifact() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());

    let report = BookBuilder::new(config(book.path(), out.path()))
        .build()
        .unwrap();

    for file in ["summary.md", "combined.html", "final.html", "final.epub"] {
        assert!(out.path().join(file).is_file(), "{} not written", file);
    }
    assert!(out.path().join("images/cover.png").is_file());
    assert!(out.path().join("theme/book.css").is_file());

    let summary = fs::read_to_string(out.path().join("summary.md")).unwrap();
    assert!(summary.contains("[Part One](rawchaptertext:Part One)"));

    let combined = fs::read_to_string(out.path().join("combined.html")).unwrap();
    assert!(combined.contains(r#"src="images/cover.png""#));
    assert!(combined.contains(r##"href="#preface""##));

    let page = fs::read_to_string(out.path().join("final.html")).unwrap();
    assert!(page.contains("theme/book.css"));
    assert!(page.contains("<a id=\"preface\"></a>"));
    assert!(!page.contains("template placeholder"));

    assert_eq!(report.chapters, 4);
    assert_eq!(report.converted, 2);
    assert_eq!(report.degraded.len(), 1);
    assert_eq!(report.degraded[0].target, "part1/missing.md");
    assert_eq!(report.assets_copied, 1);
    assert!(!report.is_clean());
}

#[test]
fn test_epub_contains_chapters_and_resources() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());

    BookBuilder::new(config(book.path(), out.path()))
        .build()
        .unwrap();

    let epub = out.path().join("final.epub");
    let entries = epub_entries(&epub);
    assert!(entries.iter().any(|n| n == "mimetype"));
    assert!(entries.iter().any(|n| n.ends_with("chap_0001.xhtml")));
    assert!(entries.iter().any(|n| n.ends_with("chap_0003.xhtml")));
    assert!(entries.iter().any(|n| n.ends_with("images/cover.png")));
    assert!(entries.iter().any(|n| n.ends_with("css/book.css")));

    let mut archive = zip::ZipArchive::new(File::open(&epub).unwrap()).unwrap();
    let name = entries
        .iter()
        .find(|n| n.ends_with("chap_0003.xhtml"))
        .unwrap()
        .clone();
    let mut chapter = String::new();
    archive
        .by_name(&name)
        .unwrap()
        .read_to_string(&mut chapter)
        .unwrap();

    // Link to the preface now crosses into the first chapter page
    assert!(chapter.contains(r##"href="chap_0001.xhtml#preface""##));
    assert!(chapter.contains(r#"href="css/book.css""#));
}

#[test]
fn test_toc_of_sample_book() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());

    let report = BookBuilder::new(config(book.path(), out.path()))
        .build()
        .unwrap();

    let titles: Vec<&str> = report.toc.iter().map(|n| n.title()).collect();
    assert_eq!(titles, vec!["Preface", "Part One"]);
    let children: Vec<&str> = report.toc[1].children().iter().map(|n| n.title()).collect();
    assert_eq!(children, vec!["Part One", "Start"]);
}

#[test]
fn test_missing_manifest_is_fatal() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let err = BookBuilder::new(config(book.path(), out.path()))
        .build()
        .unwrap_err();
    assert!(matches!(err, FolioError::Manifest(ManifestError::NotFound(_))));
}

#[test]
fn test_unknown_format_is_rejected_before_work() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());

    let err = BookBuilder::new(config(book.path(), out.path()).with_formats(vec!["docx".into()]))
        .build()
        .unwrap_err();
    assert!(matches!(err, FolioError::Export(_)));
    assert!(!out.path().join("combined.html").exists());
}

#[test]
fn test_book_without_headings_has_one_chapter() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write(book.path(), "SUMMARY.md", "[Notes](notes.md)\n");
    write(book.path(), "notes.md", "Just a paragraph.\n");

    let report = BookBuilder::new(config(book.path(), out.path()).with_formats(vec!["epub".into()]))
        .build()
        .unwrap();

    assert_eq!(report.toc.len(), 1);
    assert_eq!(report.toc[0].title(), "Content");
    assert!(!out.path().join("final.html").exists());
}

#[test]
fn test_clean_flag_controls_previous_output() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());
    write(out.path(), "images/fetched.png", "kept");

    BookBuilder::new(config(book.path(), out.path()))
        .build()
        .unwrap();
    assert!(out.path().join("images/fetched.png").is_file());

    BookBuilder::new(config(book.path(), out.path()).with_clean(true))
        .build()
        .unwrap();
    assert!(!out.path().join("images/fetched.png").exists());
    assert!(out.path().join("images/cover.png").is_file());
}

#[test]
fn test_epub_skips_leftover_assets() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());
    write(out.path(), "images/stale.png", "from an older build");

    BookBuilder::new(config(book.path(), out.path()))
        .build()
        .unwrap();

    let entries = epub_entries(&out.path().join("final.epub"));
    assert!(entries.iter().any(|n| n.ends_with("images/cover.png")));
    assert!(!entries.iter().any(|n| n.ends_with("stale.png")));
    // Leftovers stay on disk without --clean
    assert!(out.path().join("images/stale.png").is_file());
}

#[test]
fn test_progress_reports_phases_in_order() {
    let book = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    sample_book(book.path());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    BookBuilder::new(config(book.path(), out.path()))
        .with_progress(move |phase| sink.lock().unwrap().push(phase))
        .build()
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            BuildPhase::Manifest,
            BuildPhase::Convert,
            BuildPhase::Template,
            BuildPhase::Segment,
            BuildPhase::Export,
        ]
    );
}
