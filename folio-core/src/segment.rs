//! Chapter segmentation
//!
//! Splits the merged document at its `<h1>`/`<h2>` headings into a
//! two-level table of contents, and renders each chapter as a standalone
//! XHTML page.
//!
//! Structure rules:
//! - an `<h1>` opens a section whose first child is its own chapter
//! - an `<h2>` joins the open section, or stands alone if none is open
//! - a section left with only its own chapter is reported as that chapter
//! - a document without headings becomes one synthetic chapter

use crate::anchor::anchor_id;
use crate::patterns::{
    FRAGMENT_ANCHOR_RE, HEADING_RE, ID_ATTR_RE, LOCAL_HREF_RE, TAG_RE, TRAILING_ANCHORS_RE,
};
use crate::types::{MergedDocument, TocNode};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Title of the chapter synthesized for a document without headings
pub const FALLBACK_TITLE: &str = "Content";

/// One chapter rendered as its own page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChapterUnit {
    pub title: String,
    pub anchor_id: String,
    /// Navigation depth: 1 for top-level entries and section heads, 2 below
    pub level: u8,
    /// Page file name, e.g. `chap_0001.xhtml`
    pub file_name: String,
    /// Complete XHTML page
    pub html: String,
}

/// Result of segmenting a merged document
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Segmentation {
    pub toc: Vec<TocNode>,
    /// Chapter pages in table-of-contents order
    pub chapters: Vec<ChapterUnit>,
}

impl Segmentation {
    /// Indented outline of the table of contents, one node per line
    pub fn outline(&self) -> String {
        fn walk(nodes: &[TocNode], depth: usize, out: &mut String) {
            for node in nodes {
                out.push_str(&"  ".repeat(depth));
                match node {
                    TocNode::Section { title, children } => {
                        out.push_str(&format!("[{}]\n", title));
                        walk(children, depth + 1, out);
                    }
                    TocNode::Chapter { title, anchor_id, .. } => {
                        out.push_str(&format!("{} #{}\n", title, anchor_id));
                    }
                }
            }
        }

        let mut out = String::new();
        walk(&self.toc, 0, &mut out);
        out
    }
}

/// A heading that starts a chapter
#[derive(Debug)]
struct Boundary {
    level: u8,
    title: String,
    anchor_id: String,
    start: usize,
}

/// Splits merged documents into chapters
#[derive(Debug, Clone, Default)]
pub struct ChapterSegmenter {
    /// Stylesheet hrefs linked from every chapter page
    stylesheets: Vec<String>,
}

impl ChapterSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link these stylesheets from each chapter page
    pub fn with_stylesheets(mut self, stylesheets: Vec<String>) -> Self {
        self.stylesheets = stylesheets;
        self
    }

    pub fn segment(&self, document: &MergedDocument) -> Segmentation {
        let html = document.as_str();
        let boundaries = find_boundaries(html);

        let toc = if boundaries.is_empty() {
            vec![TocNode::chapter(
                FALLBACK_TITLE,
                anchor_id(FALLBACK_TITLE),
                0..html.len(),
            )]
        } else {
            build_toc(boundaries, html.len())
        };

        let chapters = self.render_units(html, &toc);
        tracing::debug!(
            nodes = toc.len(),
            chapters = chapters.len(),
            "segmented document"
        );

        Segmentation { toc, chapters }
    }

    fn render_units(&self, html: &str, toc: &[TocNode]) -> Vec<ChapterUnit> {
        let mut chapters: Vec<(&str, &str, Range<usize>, u8)> = Vec::new();
        collect_chapters(toc, 1, &mut chapters);

        let file_names: Vec<String> = (1..=chapters.len()).map(unit_file_name).collect();

        let unit_ids: Vec<HashSet<&str>> = chapters
            .iter()
            .map(|(_, _, range, _)| ids_in(&html[range.clone()]).collect())
            .collect();

        // Later occurrences win, matching how a browser resolves duplicates
        let mut id_owner: HashMap<&str, usize> = HashMap::new();
        for (unit, ids) in unit_ids.iter().enumerate() {
            for id in ids {
                id_owner.insert(*id, unit);
            }
        }

        chapters
            .iter()
            .enumerate()
            .map(|(unit, (title, anchor, range, level))| {
                let body = drop_shadowed_anchors(&html[range.clone()]);

                // A link stays local whenever this unit defines the id itself
                let relink = |caps: &regex::Captures<'_>| {
                    let id = &caps["id"];
                    match id_owner.get(id) {
                        Some(&owner) if owner != unit && !unit_ids[unit].contains(id) => {
                            format!("href=\"{}#{}\"", file_names[owner], xml_id(id))
                        }
                        _ => format!("href=\"#{}\"", xml_id(id)),
                    }
                };
                let body = LOCAL_HREF_RE.replace_all(&body, relink);
                let body = ID_ATTR_RE.replace_all(&body, |caps: &regex::Captures<'_>| {
                    format!("id=\"{}\"", xml_id(&caps["id"]))
                });

                ChapterUnit {
                    title: title.to_string(),
                    anchor_id: anchor.to_string(),
                    level: *level,
                    file_name: file_names[unit].clone(),
                    html: self.xhtml_page(title, &body),
                }
            })
            .collect()
    }

    fn xhtml_page(&self, title: &str, body: &str) -> String {
        let links: String = self
            .stylesheets
            .iter()
            .map(|href| {
                format!(
                    "    <link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"/>\n",
                    html_escape::encode_double_quoted_attribute(href)
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
    <title>{}</title>
    <meta charset="UTF-8"/>
{}</head>
<body>
{}
</body>
</html>"#,
            html_escape::encode_text(title),
            links,
            body
        )
    }
}

/// Ids defined anywhere in a slice of markup
fn ids_in(html: &str) -> impl Iterator<Item = &str> {
    ID_ATTR_RE
        .captures_iter(html)
        .filter_map(|caps| caps.name("id").map(|id| id.as_str()))
}

/// Remove fragment anchors whose id an element of the same page already
/// carries, typically the heading right after them
fn drop_shadowed_anchors(html: &str) -> Cow<'_, str> {
    let without_anchors = FRAGMENT_ANCHOR_RE.replace_all(html, "");
    let element_ids: HashSet<&str> = ids_in(&without_anchors).collect();
    if element_ids.is_empty() {
        return Cow::Borrowed(html);
    }
    FRAGMENT_ANCHOR_RE.replace_all(html, |caps: &regex::Captures<'_>| {
        if element_ids.contains(&caps["id"]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    })
}

/// An id usable as an XML name; ids such as footnote numbers get a prefix
fn xml_id(id: &str) -> Cow<'_, str> {
    match id.chars().next() {
        Some(c) if c.is_alphabetic() || c == '_' => Cow::Borrowed(id),
        _ => Cow::Owned(format!("_{}", id)),
    }
}

/// File name of the n-th chapter page, counting from 1
pub fn unit_file_name(n: usize) -> String {
    format!("chap_{:04}.xhtml", n)
}

fn find_boundaries(html: &str) -> Vec<Boundary> {
    let mut boundaries: Vec<Boundary> = Vec::new();

    for caps in HEADING_RE.captures_iter(html) {
        let Some(heading) = caps.get(0) else { continue };
        let title = heading_text(&caps["inner"]);
        if title.is_empty() {
            continue;
        }

        let level = if &caps["level"] == "1" { 1 } else { 2 };
        let anchor = ID_ATTR_RE
            .captures(&caps["attrs"])
            .map(|id| id["id"].to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| anchor_id(&title));
        let anchor = if anchor.is_empty() {
            format!("chapter-{}", boundaries.len())
        } else {
            anchor
        };

        // Pull in the fragment anchors sitting right before the heading
        let floor = boundaries.last().map_or(0, |b| b.start);
        let start = TRAILING_ANCHORS_RE
            .find(&html[floor..heading.start()])
            .map_or(heading.start(), |m| floor + m.start());

        boundaries.push(Boundary {
            level,
            title,
            anchor_id: anchor,
            start,
        });
    }

    // The first chapter absorbs any preamble
    if let Some(first) = boundaries.first_mut() {
        first.start = 0;
    }
    boundaries
}

fn build_toc(boundaries: Vec<Boundary>, len: usize) -> Vec<TocNode> {
    let ends: Vec<usize> = boundaries
        .iter()
        .skip(1)
        .map(|b| b.start)
        .chain(std::iter::once(len))
        .collect();

    let mut toc: Vec<TocNode> = Vec::new();

    for (boundary, end) in boundaries.into_iter().zip(ends) {
        let chapter = TocNode::chapter(
            boundary.title.clone(),
            boundary.anchor_id,
            boundary.start..end,
        );

        if boundary.level == 1 {
            toc.push(TocNode::Section {
                title: boundary.title,
                children: vec![chapter],
            });
            continue;
        }

        // Only an h1 pushes sections, so a trailing section is the open one
        if let Some(TocNode::Section { children, .. }) = toc.last_mut() {
            children.push(chapter);
            continue;
        }
        toc.push(chapter);
    }

    toc.into_iter().map(flatten_lone_section).collect()
}

fn flatten_lone_section(node: TocNode) -> TocNode {
    match node {
        TocNode::Section {
            title,
            mut children,
        } => {
            if children.len() == 1 {
                children.remove(0)
            } else {
                TocNode::Section { title, children }
            }
        }
        chapter => chapter,
    }
}

fn collect_chapters<'a>(
    nodes: &'a [TocNode],
    level: u8,
    out: &mut Vec<(&'a str, &'a str, Range<usize>, u8)>,
) {
    for node in nodes {
        match node {
            TocNode::Chapter {
                title,
                anchor_id,
                content_range,
            } => out.push((title.as_str(), anchor_id.as_str(), content_range.clone(), level)),
            TocNode::Section { children, .. } => {
                // A section's first child is the chapter of its own heading
                for (i, child) in children.iter().enumerate() {
                    let depth = if i == 0 { level } else { level + 1 };
                    collect_chapters(std::slice::from_ref(child), depth, out);
                }
            }
        }
    }
}

/// Visible text of a heading's inner markup
fn heading_text(inner: &str) -> String {
    let stripped = TAG_RE.replace_all(inner, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
