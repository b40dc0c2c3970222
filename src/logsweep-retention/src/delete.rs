//! Removal of expired log files.

use std::fs;
use std::path::Path;

use crate::{Result, RetentionError};

/// Remove `name` from `dir`.
pub fn remove_file(dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    fs::remove_file(&path).map_err(|source| RetentionError::Deletion { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("app.log.1"), "x").unwrap();

        remove_file(temp_dir.path(), "app.log.1").unwrap();
        assert!(!temp_dir.path().join("app.log.1").exists());
    }

    #[test]
    fn test_remove_missing_file_is_deletion_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = remove_file(temp_dir.path(), "gone").unwrap_err();
        assert!(matches!(err, RetentionError::Deletion { .. }));
    }
}
