use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directory-name pattern of a snapshot: `YYYYMMDD_HHMMSS`.
const SNAPSHOT_GLOB: &str = "20[0-9][0-9][01][0-9][0-3][0-9]_[0-2][0-9][0-5][0-9][0-5][0-9]";

/// Entries under the backup root that are never databases.
const IGNORED_DIRS: &[&str] = &["all", "ALL", "All", "lost+found"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub timestamp: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseSummary {
    pub name: String,
    pub snapshot_count: usize,
    pub latest: Option<Snapshot>,
    pub total_bytes: u64,
}

/// Read-only view of `<backup_root>/<database>/<timestamp>/`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_dir(&self, database: &str) -> PathBuf {
        self.root.join(database)
    }

    pub fn has_database(&self, database: &str) -> bool {
        self.database_dir(database).is_dir()
    }

    /// Database directories holding at least one snapshot or file, sorted by name.
    pub fn databases(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || IGNORED_DIRS.contains(&name.as_str()) {
                continue;
            }
            if self.is_populated(&entry.path()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Snapshots of one database, newest first.
    pub fn snapshots(&self, database: &str) -> Vec<Snapshot> {
        let dir = self.database_dir(database);
        let pattern = format!(
            "{}/{}",
            Pattern::escape(&dir.to_string_lossy()),
            SNAPSHOT_GLOB
        );

        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Bad snapshot pattern for {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut snapshots: Vec<Snapshot> = paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let timestamp = path.file_name()?.to_string_lossy().into_owned();
                let size_bytes = directory_size(&path);
                Some(Snapshot {
                    timestamp,
                    path,
                    size_bytes,
                })
            })
            .collect();

        snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        snapshots
    }

    pub fn summary(&self, database: &str) -> DatabaseSummary {
        let snapshots = self.snapshots(database);
        DatabaseSummary {
            name: database.to_string(),
            snapshot_count: snapshots.len(),
            total_bytes: snapshots.iter().map(|s| s.size_bytes).sum(),
            latest: snapshots.into_iter().next(),
        }
    }

    fn is_populated(&self, dir: &Path) -> bool {
        let Some(name) = dir.file_name() else {
            return false;
        };
        if !self.snapshots(&name.to_string_lossy()).is_empty() {
            return true;
        }
        match fs::read_dir(dir) {
            Ok(entries) => entries
                .flatten()
                .any(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false)),
            Err(_) => false,
        }
    }
}

fn directory_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_snapshot(root: &Path, db: &str, ts: &str, bytes: usize) {
        let dir = root.join(db).join(ts);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("backup.dump"), vec![0u8; bytes]).unwrap();
    }

    #[test]
    fn test_snapshots_newest_first_with_sizes() {
        let root = tempdir().unwrap();
        make_snapshot(root.path(), "db1", "20260206_120000", 100);
        make_snapshot(root.path(), "db1", "20260208_183432", 300);
        fs::create_dir_all(root.path().join("db1").join("not_a_snapshot")).unwrap();

        let store = SnapshotStore::new(root.path());
        let snapshots = store.snapshots("db1");
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].timestamp, "20260208_183432");
        assert_eq!(snapshots[0].size_bytes, 300);
        assert_eq!(snapshots[1].timestamp, "20260206_120000");
    }

    #[test]
    fn test_databases_skip_system_dirs() {
        let root = tempdir().unwrap();
        make_snapshot(root.path(), "db1", "20260206_120000", 10);
        make_snapshot(root.path(), "all", "20260206_120000", 10);
        make_snapshot(root.path(), ".hidden", "20260206_120000", 10);
        fs::create_dir_all(root.path().join("lost+found")).unwrap();
        fs::create_dir_all(root.path().join("empty_db")).unwrap();

        let store = SnapshotStore::new(root.path());
        assert_eq!(store.databases().unwrap(), vec!["db1"]);
        assert!(store.has_database("empty_db"));
        assert!(!store.has_database("missing"));
    }

    #[test]
    fn test_summary() {
        let root = tempdir().unwrap();
        make_snapshot(root.path(), "db1", "20260206_120000", 100);
        make_snapshot(root.path(), "db1", "20260207_120000", 50);

        let summary = SnapshotStore::new(root.path()).summary("db1");
        assert_eq!(summary.snapshot_count, 2);
        assert_eq!(summary.total_bytes, 150);
        assert_eq!(summary.latest.unwrap().timestamp, "20260207_120000");
    }

    #[test]
    fn test_missing_database_has_no_snapshots() {
        let root = tempdir().unwrap();
        assert!(SnapshotStore::new(root.path()).snapshots("nope").is_empty());
    }
}
