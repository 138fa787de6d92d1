//! Cached regex patterns.
//!
//! Every rewrite in this crate is a narrow text pass over markup the
//! converter produced itself, so these patterns only need to match the
//! converter's output shape (double-quoted attributes, lowercase tags).

use regex::Regex;
use std::sync::LazyLock;

// === Anchors ===

/// Runs of non-word characters, collapsed to one separator in anchor ids
pub static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

// === Manifest ===

/// A `## title` line or a `[label](target)` link, in document order
pub static MANIFEST_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]+(?P<title>[^\r\n]*?)[ \t]*\r?$|\[[^\]\r\n]*\]\((?P<target>[^)\r\n]*)\)")
        .unwrap()
});

/// A `## title` line, for the rewritten manifest
pub static MANIFEST_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##[ \t]+(?P<title>[^\r\n]*?)[ \t]*(?P<eol>\r?)$").unwrap()
});

// === Asset rewriting ===

/// `src="..."` and `href="..."` attributes
pub static URL_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?P<attr>src|href)="(?P<value>[^"]+)""#).unwrap()
});

/// A URL scheme prefix such as `https:` or `data:`
pub static URL_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap());

/// File stems that are kept verbatim as canonical asset names
pub static PLAIN_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

// === Segmentation ===

/// Top- and second-level heading elements
pub static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h(?P<level>[12])(?P<attrs>(?:\s[^>]*)?)>(?P<inner>.*?)</h[12]\s*>").unwrap()
});

/// `id="..."` inside an attribute list
pub static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bid="(?P<id>[^"]*)""#).unwrap());

/// Fragment anchors sitting directly in front of a heading
pub static TRAILING_ANCHORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:<a id="[^"]*"></a>\s*)+$"#).unwrap());

/// One fragment anchor with the line break after it
pub static FRAGMENT_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a id="(?P<id>[^"]*)"></a>\n?"#).unwrap());

/// Same-document links, rewritten when a chapter is split into its own file
pub static LOCAL_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r##"href="#(?P<id>[^"]+)""##).unwrap());

/// Any markup tag, stripped when extracting heading text
pub static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

// === Templates ===

/// The body element of a page template
pub static BODY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?P<open><body\b[^>]*>)(?P<content>.*)(?P<close></body\s*>)").unwrap()
});
