//! Asset resolution for converted fragments
//!
//! The resolver rewrites the `src`/`href` attributes of one fragment:
//! local images move into the canonical asset directory, links to other
//! chapter sources become in-document anchors, and remote images are
//! optionally fetched into the asset directory. Local copies are only
//! recorded here; the pipeline performs them in its second phase.

mod fetch;
pub mod naming;

pub use fetch::{FetchedAsset, HttpFetcher, RemoteFetcher};
pub use naming::{local_asset_name, media_type_for_name};

use crate::anchor::file_anchor_id;
use crate::error::AssetError;
use crate::patterns::{URL_ATTR_RE, URL_SCHEME_RE};
use crate::storage::OutputStore;
use crate::types::{AssetOrigin, AssetRef};
use naming::RemoteName;
use regex::Captures;
use std::path::Path;

/// Link targets with these extensions are chapter sources
const SOURCE_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Fragment HTML after resolution, with the assets it references
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFragment {
    pub html: String,
    pub asset_refs: Vec<AssetRef>,
}

/// Fetcher and destination used for remote assets
#[derive(Clone, Copy)]
struct RemoteAssets<'a> {
    fetcher: &'a dyn RemoteFetcher,
    store: &'a dyn OutputStore,
}

/// Rewrites asset and chapter references of a single fragment
#[derive(Clone)]
pub struct AssetResolver<'a> {
    /// Store-relative canonical asset directory, also the rewritten prefix
    asset_dir: String,
    remote: Option<RemoteAssets<'a>>,
}

impl<'a> AssetResolver<'a> {
    /// Resolver that leaves remote references untouched
    pub fn new(asset_dir: impl Into<String>) -> Self {
        Self {
            asset_dir: asset_dir.into().trim_end_matches('/').to_string(),
            remote: None,
        }
    }

    /// Fetch remote images into `store` under the asset directory
    pub fn with_remote(mut self, fetcher: &'a dyn RemoteFetcher, store: &'a dyn OutputStore) -> Self {
        self.remote = Some(RemoteAssets { fetcher, store });
        self
    }

    pub fn asset_dir(&self) -> &str {
        &self.asset_dir
    }

    /// Rewrite one fragment. `chapter_dir` is the directory of the chapter
    /// source, against which relative locators are resolved.
    pub fn resolve(&self, html: &str, chapter_dir: &Path) -> ResolvedFragment {
        let mut asset_refs = Vec::new();

        let html = URL_ATTR_RE
            .replace_all(html, |caps: &Captures| {
                let attr = &caps["attr"];
                let decoded = decode_locator(&caps["value"]);

                let rewritten = if attr == "src" {
                    self.rewrite_src(&decoded, chapter_dir, &mut asset_refs)
                } else {
                    self.rewrite_href(&decoded)
                };

                match rewritten {
                    Some(value) => format!(
                        "{}=\"{}\"",
                        attr,
                        html_escape::encode_double_quoted_attribute(&value)
                    ),
                    None => caps[0].to_string(),
                }
            })
            .into_owned();

        ResolvedFragment { html, asset_refs }
    }

    fn rewrite_src(
        &self,
        locator: &str,
        chapter_dir: &Path,
        asset_refs: &mut Vec<AssetRef>,
    ) -> Option<String> {
        if is_remote(locator) {
            let remote = self.remote?;
            return match self.fetch_remote(remote, locator) {
                Ok(name) => {
                    asset_refs.push(AssetRef {
                        source_locator: locator.to_string(),
                        resolved_name: name.clone(),
                        origin_chapter_dir: chapter_dir.to_path_buf(),
                        origin: AssetOrigin::Remote,
                    });
                    Some(self.asset_path(&name))
                }
                Err(e) => {
                    tracing::warn!(url = locator, error = %e, "remote asset left unresolved");
                    None
                }
            };
        }

        if URL_SCHEME_RE.is_match(locator) {
            // data:, mailto: and friends are not files
            return None;
        }

        let Some(name) = naming::local_asset_name(locator) else {
            tracing::warn!(locator, "asset reference has no file name");
            return None;
        };

        asset_refs.push(AssetRef {
            source_locator: locator.to_string(),
            resolved_name: name.clone(),
            origin_chapter_dir: chapter_dir.to_path_buf(),
            origin: AssetOrigin::Local,
        });
        Some(self.asset_path(&name))
    }

    fn rewrite_href(&self, locator: &str) -> Option<String> {
        if URL_SCHEME_RE.is_match(locator) || locator.starts_with("//") {
            return None;
        }

        let (path, fragment) = match locator.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (locator, None),
        };

        if !self.is_source_file(path) {
            return None;
        }

        match fragment {
            Some(fragment) if !fragment.is_empty() => Some(format!("#{}", fragment)),
            _ => Some(format!("#{}", file_anchor_id(path))),
        }
    }

    fn is_source_file(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| SOURCE_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Fetch a remote asset unless an earlier run already stored it
    fn fetch_remote(&self, remote: RemoteAssets<'_>, locator: &str) -> Result<String, AssetError> {
        let url = if locator.starts_with("//") {
            format!("https:{}", locator)
        } else {
            locator.to_string()
        };
        let planned = RemoteName::from_url(&url);

        for candidate in planned.candidates() {
            if remote.store.exists(&self.asset_path(&candidate))? {
                tracing::debug!(%url, name = %candidate, "remote asset already present");
                return Ok(candidate);
            }
        }

        let fetched = remote.fetcher.fetch(&url)?;
        let name = planned.resolve(fetched.content_type.as_deref());
        remote.store.write(&self.asset_path(&name), &fetched.bytes)?;
        tracing::debug!(%url, %name, "stored remote asset");
        Ok(name)
    }

    fn asset_path(&self, name: &str) -> String {
        if self.asset_dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.asset_dir, name)
        }
    }
}

fn is_remote(locator: &str) -> bool {
    locator.starts_with("//")
        || locator
            .get(..8)
            .is_some_and(|p| p.eq_ignore_ascii_case("https://"))
        || locator
            .get(..7)
            .is_some_and(|p| p.eq_ignore_ascii_case("http://"))
}

/// Undo the converter's attribute escaping and URL percent-encoding
fn decode_locator(value: &str) -> String {
    let unescaped = html_escape::decode_html_entities(value);
    percent_encoding::percent_decode_str(&unescaped)
        .decode_utf8_lossy()
        .into_owned()
}
