//! Asset materialization

use crate::error::AssetError;
use crate::storage::OutputStore;
use crate::types::{AssetCopyTask, CopyTaskSet};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A copy that did not happen
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssetFailure {
    pub source_path: PathBuf,
    pub dest_path: String,
    pub reason: String,
}

/// Outcome of the copy phase
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MaterializeReport {
    pub copied: usize,
    pub failures: Vec<AssetFailure>,
    /// Destinations written by more than one distinct source
    pub collisions: Vec<String>,
}

pub(super) fn run(
    pool: &rayon::ThreadPool,
    store: &dyn OutputStore,
    tasks: &CopyTaskSet,
) -> MaterializeReport {
    if tasks.is_empty() {
        return MaterializeReport::default();
    }

    // Copies sharing a destination run in set order on one worker, so the
    // last of them wins whole instead of interleaving with the others
    let groups = by_destination(tasks);
    let collisions: Vec<String> = groups
        .iter()
        .filter(|group| group.len() > 1)
        .map(|group| group[0].dest_path.clone())
        .collect();
    for dest in &collisions {
        tracing::warn!(dest = %dest, "several sources share one asset name, last copy wins");
    }

    tracing::info!(tasks = tasks.len(), "copying assets");

    let results: Vec<Vec<(&AssetCopyTask, Result<(), AssetError>)>> = pool.install(|| {
        groups
            .par_iter()
            .map(|group| {
                group
                    .iter()
                    .map(|task| (*task, copy_one(store, task)))
                    .collect()
            })
            .collect()
    });

    let mut report = MaterializeReport {
        collisions,
        ..Default::default()
    };
    for (task, result) in results.into_iter().flatten() {
        match result {
            Ok(()) => report.copied += 1,
            Err(e) => {
                tracing::warn!(dest = %task.dest_path, error = %e, "asset copy failed");
                report.failures.push(AssetFailure {
                    source_path: task.source_path.clone(),
                    dest_path: task.dest_path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    report
}

fn copy_one(store: &dyn OutputStore, task: &AssetCopyTask) -> Result<(), AssetError> {
    store
        .copy_in(&task.source_path, &task.dest_path)
        .map_err(|e| AssetError::Copy {
            source_path: task.source_path.clone(),
            reason: e.to_string(),
        })
}

/// Tasks grouped by destination, each group in set order
fn by_destination(tasks: &CopyTaskSet) -> Vec<Vec<&AssetCopyTask>> {
    let mut groups: BTreeMap<&str, Vec<&AssetCopyTask>> = BTreeMap::new();
    for task in tasks.iter() {
        groups.entry(task.dest_path.as_str()).or_default().push(task);
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, MemoryStorage};
    use crate::types::{AssetOrigin, AssetRef};
    use std::fs;

    fn local_ref(dir: &std::path::Path, locator: &str, name: &str) -> AssetRef {
        AssetRef {
            source_locator: locator.to_string(),
            resolved_name: name.to_string(),
            origin_chapter_dir: dir.to_path_buf(),
            origin: AssetOrigin::Local,
        }
    }

    fn pool() -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn test_copies_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"a").unwrap();

        let mut tasks = CopyTaskSet::new();
        tasks.extend_from_refs(
            &[
                local_ref(dir.path(), "a.png", "a.png"),
                local_ref(dir.path(), "gone.png", "gone.png"),
            ],
            "images",
        );

        let store = MemoryStorage::new();
        let report = run(&pool(), &store, &tasks);

        assert_eq!(report.copied, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].dest_path, "images/gone.png");
        assert_eq!(store.read("images/a.png").unwrap(), b"a");
    }

    #[test]
    fn test_reports_shared_destinations() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::create_dir_all(dir.path().join("y")).unwrap();
        fs::write(dir.path().join("x/logo.png"), b"x").unwrap();
        fs::write(dir.path().join("y/logo.png"), b"y").unwrap();

        let mut tasks = CopyTaskSet::new();
        tasks.extend_from_refs(
            &[
                local_ref(&dir.path().join("x"), "logo.png", "logo.png"),
                local_ref(&dir.path().join("y"), "logo.png", "logo.png"),
            ],
            "images",
        );

        let store = MemoryStorage::new();
        let report = run(&pool(), &store, &tasks);

        assert_eq!(report.copied, 2);
        assert_eq!(report.collisions, vec!["images/logo.png".to_string()]);
    }

    #[test]
    fn test_shared_destination_holds_one_whole_source() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::create_dir_all(dir.path().join("y")).unwrap();
        let big = vec![b'A'; 4 * 1024 * 1024];
        let small = vec![b'B'; 1024 * 1024];
        fs::write(dir.path().join("x/logo.png"), &big).unwrap();
        fs::write(dir.path().join("y/logo.png"), &small).unwrap();

        let mut tasks = CopyTaskSet::new();
        tasks.extend_from_refs(
            &[
                local_ref(&dir.path().join("x"), "logo.png", "logo.png"),
                local_ref(&dir.path().join("y"), "logo.png", "logo.png"),
            ],
            "images",
        );

        let out = tempfile::tempdir().unwrap();
        let store = LocalStorage::new(out.path());
        let pool = pool();
        for _ in 0..10 {
            let report = run(&pool, &store, &tasks);
            assert_eq!(report.copied, 2);
            // Set order puts x/ before y/, so y/ is written last
            let written = fs::read(out.path().join("images/logo.png")).unwrap();
            assert!(written == small, "destination mixes both sources");
        }
    }
}
