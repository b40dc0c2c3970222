//! Validated, immutable cleaner policy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::CleanerConfig;
use crate::naming::NamingScheme;
use crate::symlink::SymlinkScope;
use crate::{Result, RetentionError};

/// The settings one cleaner runs with for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Policy {
    dir: PathBuf,
    prefix: String,
    interval: Duration,
    reserve: Duration,
    compress_after: Duration,
    naming: NamingScheme,
    symlinks: SymlinkScope,
    append_compressed: bool,
}

impl Policy {
    /// Validate a configuration record.
    ///
    /// A missing directory is fine here; it is checked on every cycle.
    pub fn from_config(config: CleanerConfig) -> Result<Self> {
        if config.prefix.is_empty() {
            return Err(RetentionError::Config("prefix must not be empty".to_string()));
        }
        if config.prefix.contains(std::path::is_separator) {
            return Err(RetentionError::Config(format!(
                "prefix {:?} must not contain a path separator",
                config.prefix
            )));
        }
        if config.interval.is_zero() {
            return Err(RetentionError::Config(
                "interval must be greater than zero".to_string(),
            ));
        }
        if config.reserve.is_zero() {
            return Err(RetentionError::Config(
                "reserve must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            dir: config.path,
            prefix: config.prefix,
            interval: config.interval,
            reserve: config.reserve,
            compress_after: config.compress_after,
            naming: config.naming,
            symlinks: config.symlinks,
            append_compressed: config.append_compressed,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reserve(&self) -> Duration {
        self.reserve
    }

    pub fn compress_after(&self) -> Duration {
        self.compress_after
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    pub fn symlinks(&self) -> SymlinkScope {
        self.symlinks
    }

    pub fn append_compressed(&self) -> bool {
        self.append_compressed
    }

    /// Whether a file name is in scope for this policy.
    pub fn is_managed(&self, name: &str) -> bool {
        self.naming.matches(name, &self.prefix)
    }
}

impl TryFrom<CleanerConfig> for Policy {
    type Error = RetentionError;

    fn try_from(config: CleanerConfig) -> Result<Self> {
        Self::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CleanerConfig {
        CleanerConfig::new(
            "/tmp/logs",
            "app",
            Duration::from_secs(1),
            Duration::from_secs(3),
        )
    }

    #[test]
    fn test_valid_policy() {
        let policy = Policy::from_config(config()).unwrap();
        assert_eq!(policy.dir(), Path::new("/tmp/logs"));
        assert_eq!(policy.prefix(), "app");
        assert!(policy.is_managed("app.log.1"));
        assert!(!policy.is_managed("other.log.1"));
    }

    #[test]
    fn test_rejects_empty_prefix() {
        let err = Policy::from_config(CleanerConfig {
            prefix: String::new(),
            ..config()
        })
        .unwrap_err();
        assert!(matches!(err, RetentionError::Config(_)));
    }

    #[test]
    fn test_rejects_prefix_with_separator() {
        let result = Policy::try_from(CleanerConfig {
            prefix: "../app".to_string(),
            ..config()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_durations() {
        assert!(Policy::from_config(CleanerConfig {
            interval: Duration::ZERO,
            ..config()
        })
        .is_err());
        assert!(Policy::from_config(CleanerConfig {
            reserve: Duration::ZERO,
            ..config()
        })
        .is_err());
    }

    #[test]
    fn test_empty_path_is_accepted() {
        // Nothing to scan yet is a valid steady state.
        let policy = Policy::from_config(CleanerConfig {
            path: PathBuf::new(),
            ..config()
        })
        .unwrap();
        assert_eq!(policy.dir(), Path::new(""));
    }
}
