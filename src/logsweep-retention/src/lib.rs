//! Age-based retention for rotated log directories.
//!
//! A [`Cleaner`] owns one directory and one file-name prefix. On a fixed
//! interval it scans the directory and moves every managed log file through
//! a simple lifecycle:
//!
//! - **keep** while the file is younger than the compression threshold
//! - **compress** into `<name>.gz` once it is older than the threshold
//! - **delete** once it is older than the reserve duration
//!
//! Files that a "current log" symlink (`<prefix>.INFO`, `<prefix>.WARNING`,
//! `<prefix>.ERROR`, `<prefix>.FATAL`) resolves to are never touched, and
//! files outside the prefix are never touched regardless of age.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use logsweep_retention::{Cleaner, CleanerConfig};
//!
//! let config = CleanerConfig::new(
//!     "/var/log/myapp",
//!     "myapp",
//!     Duration::from_secs(60),
//!     Duration::from_secs(72 * 60 * 60),
//! );
//!
//! // The background loop is already running when `spawn` returns.
//! let mut handle = Cleaner::spawn(config).expect("invalid cleaner config");
//!
//! // ... later, on shutdown
//! handle.stop();
//! ```

pub mod age;
pub mod compress;
pub mod config;
pub mod delete;
pub mod entry;
pub mod naming;
pub mod policy;
pub mod scanner;
pub mod scheduler;
pub mod severity;
pub mod symlink;

pub use age::{Action, AgeClassifier};
pub use compress::{CompressionOutcome, Compressor};
pub use config::{CleanerConfig, DEFAULT_COMPRESS_AFTER, DEFAULT_RESERVE, DEFAULT_SCAN_INTERVAL};
pub use entry::DirectoryEntry;
pub use naming::NamingScheme;
pub use policy::Policy;
pub use scanner::{CycleReport, Scanner};
pub use scheduler::{CancellationToken, Cleaner, CleanerHandle};
pub use severity::Severity;
pub use symlink::{ExclusionSet, SymlinkResolver, SymlinkScope};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Suffix of compressed log artifacts.
pub const COMPRESSED_SUFFIX: &str = ".gz";

/// Suffix of in-flight compression output.
pub const TEMP_SUFFIX: &str = ".tmp";

#[derive(Error, Debug)]
pub enum RetentionError {
    #[error("Directory {} unavailable: {source}", .path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to list {}: {source}", .path.display())]
    ListingFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to resolve symlink {}: {source}", .path.display())]
    SymlinkResolution {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to compress {}: {source}", .path.display())]
    Compression {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to delete {}: {source}", .path.display())]
    Deletion {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid cleaner configuration: {0}")]
    Config(String),

    #[error("Failed to spawn cleaner thread: {0}")]
    Spawn(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, RetentionError>;
