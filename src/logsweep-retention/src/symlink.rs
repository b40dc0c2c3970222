//! Protection of files that a current-log symlink points at.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

use crate::entry::DirectoryEntry;
use crate::severity::Severity;
use crate::{Result, RetentionError};

/// Which symlinks in the directory protect their targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymlinkScope {
    /// Only `<prefix>.INFO`, `<prefix>.WARNING`, `<prefix>.ERROR` and
    /// `<prefix>.FATAL`.
    #[default]
    Severity,

    /// Every symlink in the directory.
    Any,
}

/// Names of files that must not be touched during the current cycle.
#[derive(Debug, Default, Clone)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Resolves the recognized symlinks of a directory listing.
#[derive(Debug, Clone)]
pub struct SymlinkResolver {
    scope: SymlinkScope,
    recognized: HashSet<String>,
}

impl SymlinkResolver {
    pub fn new(prefix: &str, scope: SymlinkScope) -> Self {
        let recognized = match scope {
            SymlinkScope::Severity => Severity::ALL
                .iter()
                .map(|severity| severity.symlink_name(prefix))
                .collect(),
            SymlinkScope::Any => HashSet::new(),
        };

        Self { scope, recognized }
    }

    /// Whether a symlink with this name protects its target.
    pub fn recognizes(&self, name: &str) -> bool {
        match self.scope {
            SymlinkScope::Severity => self.recognized.contains(name),
            SymlinkScope::Any => true,
        }
    }

    /// Build the exclusion set for one cycle.
    ///
    /// Links that cannot be resolved (dangling, loops, permission errors)
    /// protect nothing.
    pub fn exclusions(&self, dir: &Path, entries: &[DirectoryEntry]) -> ExclusionSet {
        let mut set = ExclusionSet::default();

        for entry in entries {
            if !entry.is_symlink || !self.recognizes(&entry.name) {
                continue;
            }

            match resolve_target(&dir.join(&entry.name)) {
                Ok(target) => {
                    debug!(link = %entry.name, target = %target, "Protecting symlink target");
                    set.names.insert(target);
                }
                Err(e) => {
                    debug!(error = %e, "Ignoring unresolvable symlink");
                }
            }
        }

        set
    }
}

/// Fully resolve `link` and return the base name of the final target.
fn resolve_target(link: &Path) -> Result<String> {
    let resolution_error = |source: io::Error| RetentionError::SymlinkResolution {
        path: link.to_path_buf(),
        source,
    };

    let resolved = fs::canonicalize(link).map_err(resolution_error)?;

    resolved
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| {
            resolution_error(io::Error::new(
                io::ErrorKind::InvalidData,
                "target has no UTF-8 file name",
            ))
        })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::entry::read_entries;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_severity_links_protect_targets() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("app.log.1"), "info").unwrap();
        fs::write(dir.join("app.log.2"), "error").unwrap();
        fs::write(dir.join("app.log.3"), "old").unwrap();
        symlink("app.log.1", dir.join("app.INFO")).unwrap();
        symlink("app.log.2", dir.join("app.ERROR")).unwrap();

        let resolver = SymlinkResolver::new("app", SymlinkScope::Severity);
        let set = resolver.exclusions(dir, &read_entries(dir).unwrap());

        assert_eq!(set.len(), 2);
        assert!(set.contains("app.log.1"));
        assert!(set.contains("app.log.2"));
        assert!(!set.contains("app.log.3"));
    }

    #[test]
    fn test_unrecognized_links_are_ignored_in_severity_scope() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("app.log.1"), "info").unwrap();
        symlink("app.log.1", dir.join("app.latest")).unwrap();

        let resolver = SymlinkResolver::new("app", SymlinkScope::Severity);
        assert!(resolver.exclusions(dir, &read_entries(dir).unwrap()).is_empty());

        let resolver = SymlinkResolver::new("app", SymlinkScope::Any);
        assert!(resolver
            .exclusions(dir, &read_entries(dir).unwrap())
            .contains("app.log.1"));
    }

    #[test]
    fn test_dangling_link_excludes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        symlink("app.log.gone", dir.join("app.WARNING")).unwrap();

        let resolver = SymlinkResolver::new("app", SymlinkScope::Severity);
        assert!(resolver.exclusions(dir, &read_entries(dir).unwrap()).is_empty());
    }

    #[test]
    fn test_chained_links_resolve_to_final_target() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("app.log.7"), "x").unwrap();
        symlink("app.log.7", dir.join("intermediate")).unwrap();
        symlink("intermediate", dir.join("app.FATAL")).unwrap();

        let resolver = SymlinkResolver::new("app", SymlinkScope::Severity);
        let set = resolver.exclusions(dir, &read_entries(dir).unwrap());
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["app.log.7"]);
    }

    #[test]
    fn test_regular_file_with_link_name_is_not_resolved() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("app.INFO"), "not a link").unwrap();

        let resolver = SymlinkResolver::new("app", SymlinkScope::Severity);
        assert!(resolver.exclusions(dir, &read_entries(dir).unwrap()).is_empty());
    }
}
