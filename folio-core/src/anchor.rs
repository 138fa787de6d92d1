//! Anchor id derivation shared by the converter, resolver and pipeline

use crate::patterns::NON_WORD_RE;
use std::path::Path;

/// Normalize free text into a URL-fragment-safe anchor id.
///
/// Lower-cases, replaces every run of non-word characters with `-` and
/// strips separators from both ends. May return an empty string.
pub fn anchor_id(text: &str) -> String {
    let lower = text.to_lowercase();
    NON_WORD_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Anchor for a chapter file: derived from the file stem only, so a link
/// `../guide/setup.md` and the chapter `guide/setup.md` agree.
pub fn file_anchor_id(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    anchor_id(&stem)
}
