//! Asset references and the deduplicated copy-task set

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Where a resolved asset came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssetOrigin {
    /// A file next to the chapter source; copied during materialization
    Local,
    /// A remote URL; already fetched by the resolver
    Remote,
}

/// A resource reference found in one fragment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRef {
    /// Decoded locator as written in the chapter (relative path or URL)
    pub source_locator: String,

    /// Canonical file name inside the asset directory
    pub resolved_name: String,

    /// Directory of the chapter that referenced the asset
    pub origin_chapter_dir: PathBuf,

    pub origin: AssetOrigin,
}

impl AssetRef {
    /// Store path of the canonical copy
    pub fn store_path(&self, asset_dir: &str) -> String {
        format!("{}/{}", asset_dir, self.resolved_name)
    }

    /// Copy task for a local asset; remote assets have nothing left to copy
    pub fn copy_task(&self, asset_dir: &str) -> Option<AssetCopyTask> {
        match self.origin {
            AssetOrigin::Local => Some(AssetCopyTask {
                source_path: self.origin_chapter_dir.join(&self.source_locator),
                dest_path: self.store_path(asset_dir),
            }),
            AssetOrigin::Remote => None,
        }
    }
}

/// One file copy into the output store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetCopyTask {
    /// Absolute or working-directory relative source file
    pub source_path: PathBuf,

    /// Store-relative destination (e.g. `images/cover.png`)
    pub dest_path: String,
}

/// Copy tasks deduplicated by exact `(source, dest)` equality
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CopyTaskSet {
    tasks: BTreeSet<AssetCopyTask>,
}

impl CopyTaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the copy tasks of every local reference
    pub fn extend_from_refs<'a>(
        &mut self,
        refs: impl IntoIterator<Item = &'a AssetRef>,
        asset_dir: &str,
    ) {
        self.tasks
            .extend(refs.into_iter().filter_map(|r| r.copy_task(asset_dir)));
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetCopyTask> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(dir: &str, locator: &str, name: &str) -> AssetRef {
        AssetRef {
            source_locator: locator.to_string(),
            resolved_name: name.to_string(),
            origin_chapter_dir: PathBuf::from(dir),
            origin: AssetOrigin::Local,
        }
    }

    #[test]
    fn test_identical_tasks_collapse() {
        let refs = vec![
            local("book/ch1", "img/a.png", "a.png"),
            local("book/ch1", "img/a.png", "a.png"),
            local("book/ch2", "img/a.png", "a.png"),
        ];

        let mut set = CopyTaskSet::new();
        set.extend_from_refs(&refs, "images");

        // Same destination from two sources stays two tasks; last writer wins on disk
        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|t| t.dest_path == "images/a.png"));
    }

    #[test]
    fn test_remote_refs_produce_no_tasks() {
        let remote = AssetRef {
            origin: AssetOrigin::Remote,
            ..local("book", "https://example.com/x.png", "x.png")
        };

        let mut set = CopyTaskSet::new();
        set.extend_from_refs([&remote], "images");
        assert!(set.is_empty());
    }
}
