use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Error;

/// Ordered list of known database names, one per line in `ib_list.conf`.
#[derive(Debug, Clone, Default)]
pub struct DatabaseRegistry {
    names: Vec<String>,
}

impl DatabaseRegistry {
    pub fn load(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(content) => {
                let registry = Self::parse(&content);
                debug!("Loaded {} database(s) from {}", registry.names.len(), path.display());
                Ok(registry)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Database list {} does not exist", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(Error::Registry(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Self {
        let names = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names eligible for `--all`: no `_`-prefixed service entries and none of `reserved`.
    pub fn eligible(&self, reserved: &[String]) -> Vec<String> {
        self.names
            .iter()
            .filter(|name| !name.starts_with('_') && !reserved.contains(name))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let registry = DatabaseRegistry::parse("# header\nartel_2025\n\n  oksana_2025  \n#old_db\n");
        assert_eq!(registry.names(), &["artel_2025", "oksana_2025"]);
    }

    #[test]
    fn test_eligible_filters_reserved() {
        let registry = DatabaseRegistry::parse("artel_2025\n_service\nall\ntest_ib\noksana_2025\n");
        let reserved = vec!["all".to_string(), "test_ib".to_string()];
        assert_eq!(registry.eligible(&reserved), vec!["artel_2025", "oksana_2025"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let registry = DatabaseRegistry::load(&dir.path().join("ib_list.conf")).unwrap();
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ib_list.conf");
        fs::write(&path, "db1\ndb2\n").unwrap();
        let registry = DatabaseRegistry::load(&path).unwrap();
        assert_eq!(registry.names(), &["db1", "db2"]);
    }

    #[test]
    fn test_unreadable_list_is_registry_error() {
        let dir = tempdir().unwrap();
        let err = DatabaseRegistry::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
    }
}
