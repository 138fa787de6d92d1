//! Assembly and segmentation benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use folio_core::convert::{FragmentConverter, MarkdownConverter};
use folio_core::types::{Fragment, FragmentStatus};
use folio_core::{assemble, ChapterSegmenter};

/// A book of `parts` sections with `chapters` chapters each
fn sample_fragments(parts: usize, chapters: usize) -> Vec<Fragment> {
    let converter = MarkdownConverter::new();
    let mut fragments = Vec::new();

    for part in 0..parts {
        let index = fragments.len();
        fragments.push(Fragment::new(
            index,
            format!("part-{}", part),
            format!("<h1>Part {}</h1>\n", part),
            FragmentStatus::Title,
        ));

        for chapter in 0..chapters {
            let markdown = format!(
                "## Chapter {part}.{chapter}\n\nSome *text* with a [link](#part-{part}).\n\n\
                 ```rust\nfn main() {{}}\n```\n\n- [x] done\n- [ ] todo\n"
            );
            let index = fragments.len();
            fragments.push(Fragment::new(
                index,
                format!("chapter-{}-{}", part, chapter),
                converter.convert(&markdown),
                FragmentStatus::Converted,
            ));
        }
    }

    fragments
}

fn assembly_benchmark(c: &mut Criterion) {
    let fragments = sample_fragments(10, 20);

    c.bench_function("assemble_200_fragments", |b| {
        b.iter(|| assemble(black_box(&fragments)))
    });

    let document = assemble(&fragments);
    let segmenter = ChapterSegmenter::new().with_stylesheets(vec!["css/book.css".to_string()]);
    c.bench_function("segment_200_chapters", |b| {
        b.iter(|| segmenter.segment(black_box(&document)))
    });
}

fn conversion_benchmark(c: &mut Criterion) {
    let converter = MarkdownConverter::new();
    let markdown = "# Title\n\nParagraph with **bold** and `code`.\n\n| a | b |\n|---|---|\n| 1 | 2 |\n"
        .repeat(50);

    c.bench_function("convert_markdown", |b| {
        b.iter(|| converter.convert(black_box(&markdown)))
    });
}

criterion_group!(benches, assembly_benchmark, conversion_benchmark);
criterion_main!(benches);
