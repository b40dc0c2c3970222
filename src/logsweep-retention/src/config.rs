//! Configuration for a log cleaner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::naming::NamingScheme;
use crate::symlink::SymlinkScope;

// ============================================================================
// Constants
// ============================================================================

/// Default scan interval (1 minute).
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Default reserve duration (7 days).
pub const DEFAULT_RESERVE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default age after which a log file is compressed (3 minutes).
pub const DEFAULT_COMPRESS_AFTER: Duration = Duration::from_secs(3 * 60);

// ============================================================================
// Configuration
// ============================================================================

/// Configuration record for one cleaner.
///
/// Durations are written in human-readable form when deserialized, e.g.
/// `interval = "1m"` or `reserve = "72h"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Directory holding the log files.
    pub path: PathBuf,

    /// File-name prefix of managed log files.
    pub prefix: String,

    /// Time between scan cycles.
    #[serde(with = "humantime_serde", default = "default_interval")]
    pub interval: Duration,

    /// Files older than this are deleted.
    #[serde(with = "humantime_serde", default = "default_reserve")]
    pub reserve: Duration,

    /// Uncompressed files older than this are gzipped.
    #[serde(with = "humantime_serde", default = "default_compress_after")]
    pub compress_after: Duration,

    /// Which file names count as managed logs.
    #[serde(default)]
    pub naming: NamingScheme,

    /// Which symlinks protect their targets.
    #[serde(default)]
    pub symlinks: SymlinkScope,

    /// Append a new gzip member to an existing `<name>.gz` instead of failing.
    #[serde(default)]
    pub append_compressed: bool,
}

fn default_interval() -> Duration {
    DEFAULT_SCAN_INTERVAL
}

fn default_reserve() -> Duration {
    DEFAULT_RESERVE
}

fn default_compress_after() -> Duration {
    DEFAULT_COMPRESS_AFTER
}

impl CleanerConfig {
    /// Create a config with the four required options and defaults for the rest.
    pub fn new(
        path: impl Into<PathBuf>,
        prefix: impl Into<String>,
        interval: Duration,
        reserve: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
            interval,
            reserve,
            compress_after: DEFAULT_COMPRESS_AFTER,
            naming: NamingScheme::default(),
            symlinks: SymlinkScope::default(),
            append_compressed: false,
        }
    }
}
