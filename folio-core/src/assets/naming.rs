//! Canonical asset names
//!
//! Names depend only on the locator, never on file content: the same
//! basename always lands in the same slot of the asset directory.

use crate::patterns::PLAIN_STEM_RE;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hex digits kept from the SHA-256 digest
const DIGEST_LEN: usize = 32;

/// Extensions probed when a remote URL carries none
pub const KNOWN_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "gif", "svg", "webp", "bmp", "ico"];

/// Stable digest of a string, used for non-conforming names
pub fn digest(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(DIGEST_LEN);
    hex
}

fn split_basename(basename: &str) -> (String, Option<String>) {
    let path = Path::new(basename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .filter(|e| !e.is_empty());
    (stem, ext)
}

fn join_name(stem: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

/// Canonical name for a local asset path.
///
/// Stems made only of ASCII letters and digits are kept; anything else is
/// replaced by a digest of the stem, keeping the extension. Returns `None`
/// when the path has no file name at all (`.`, `..`, empty).
pub fn local_asset_name(locator: &str) -> Option<String> {
    let basename = Path::new(locator).file_name()?.to_string_lossy().into_owned();
    let (stem, ext) = split_basename(&basename);

    if PLAIN_STEM_RE.is_match(&stem) {
        Some(basename)
    } else {
        Some(join_name(&digest(&stem), ext.as_deref()))
    }
}

/// Planned name for a remote asset before it is fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteName {
    pub stem: String,
    /// Extension from the URL path, if it had one
    pub ext: Option<String>,
}

impl RemoteName {
    /// Derive the name from a URL: the path basename when its stem is
    /// plain ASCII alphanumerics, otherwise a digest of the whole URL.
    pub fn from_url(url: &str) -> Self {
        let basename = url_basename(url);
        let (stem, ext) = split_basename(&basename);

        if PLAIN_STEM_RE.is_match(&stem) {
            Self { stem, ext }
        } else {
            Self {
                stem: digest(url),
                ext,
            }
        }
    }

    /// The final name when the URL already fixed the extension
    pub fn known_name(&self) -> Option<String> {
        self.ext.as_deref().map(|ext| join_name(&self.stem, Some(ext)))
    }

    /// Names an earlier run could have stored this asset under
    pub fn candidates(&self) -> Vec<String> {
        match self.known_name() {
            Some(name) => vec![name],
            None => KNOWN_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| join_name(&self.stem, Some(ext)))
                .chain(std::iter::once(self.stem.clone()))
                .collect(),
        }
    }

    /// The final name once the response content type is known
    pub fn resolve(&self, content_type: Option<&str>) -> String {
        let ext = self
            .ext
            .as_deref()
            .or_else(|| content_type.and_then(extension_for_content_type));
        join_name(&self.stem, ext)
    }
}

/// Decoded last path segment of a URL, ignoring query and fragment
fn url_basename(url: &str) -> String {
    let without_scheme = match url.find("//") {
        Some(pos) => &url[pos + 2..],
        None => url,
    };
    let path = without_scheme
        .split_once('/')
        .map(|(_, path)| path)
        .unwrap_or("");
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or("");
    let segment = path.rsplit('/').next().unwrap_or("");

    percent_encoding::percent_decode_str(segment)
        .decode_utf8_lossy()
        .into_owned()
}

/// File extension for an image content type
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        _ => None,
    }
}

/// Media type for a stored asset file name
pub fn media_type_for_name(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    match lower.rsplit('.').next() {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
