//! One retention cycle over a log directory.

use serde::Serialize;
use std::fs;
use std::io;
use std::time::SystemTime;
use tracing::{debug, error, info};

use crate::age::{Action, AgeClassifier, age_of};
use crate::compress::{Compressor, compressed_name};
use crate::delete::remove_file;
use crate::entry::{DirectoryEntry, read_entries};
use crate::policy::Policy;
use crate::symlink::SymlinkResolver;
use crate::RetentionError;

/// Result of one cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// The directory did not exist; nothing was scanned.
    pub directory_missing: bool,
    /// Number of directory entries listed.
    pub scanned: usize,
    /// Number of files compressed (and their sources removed).
    pub compressed: usize,
    /// Number of files deleted.
    pub deleted: usize,
    /// Number of in-scope files skipped because a symlink points at them.
    pub protected: usize,
    /// Bytes released by deletion and compression.
    pub bytes_freed: u64,
    /// Errors encountered (non-fatal).
    pub errors: Vec<String>,
}

impl CycleReport {
    fn add_error(&mut self, error: RetentionError) {
        self.errors.push(error.to_string());
    }

    /// Whether the cycle changed anything on disk.
    pub fn any_changes(&self) -> bool {
        self.compressed > 0 || self.deleted > 0
    }
}

/// Runs retention cycles for one policy.
#[derive(Debug, Clone)]
pub struct Scanner {
    policy: Policy,
    resolver: SymlinkResolver,
    classifier: AgeClassifier,
    compressor: Compressor,
}

impl Scanner {
    pub fn new(policy: Policy) -> Self {
        let resolver = SymlinkResolver::new(policy.prefix(), policy.symlinks());
        let classifier = AgeClassifier::new(policy.reserve(), policy.compress_after());
        let compressor = Compressor::new(policy.dir(), policy.append_compressed());

        Self {
            policy,
            resolver,
            classifier,
            compressor,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Run one cycle against the current time.
    pub fn scan(&self) -> CycleReport {
        self.scan_at(SystemTime::now())
    }

    /// Run one cycle, judging file ages against `now`.
    ///
    /// Failures are logged and recorded in the report; they never abort the
    /// remaining entries.
    pub fn scan_at(&self, now: SystemTime) -> CycleReport {
        let mut report = CycleReport::default();
        let dir = self.policy.dir();

        match fs::metadata(dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                let e = RetentionError::DirectoryUnavailable {
                    path: dir.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
                };
                error!(error = %e, "Skipping retention cycle");
                report.add_error(e);
                return report;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %dir.display(), "Log directory does not exist yet");
                report.directory_missing = true;
                return report;
            }
            Err(source) => {
                let e = RetentionError::DirectoryUnavailable {
                    path: dir.to_path_buf(),
                    source,
                };
                error!(error = %e, "Skipping retention cycle");
                report.add_error(e);
                return report;
            }
        }

        let entries = match read_entries(dir) {
            Ok(entries) => entries,
            Err(source) => {
                let e = RetentionError::ListingFailure {
                    path: dir.to_path_buf(),
                    source,
                };
                error!(error = %e, "Skipping retention cycle");
                report.add_error(e);
                return report;
            }
        };
        report.scanned = entries.len();

        self.apply(&entries, now, &mut report);

        if report.any_changes() || !report.errors.is_empty() {
            info!(
                path = %dir.display(),
                compressed = report.compressed,
                deleted = report.deleted,
                bytes_freed = report.bytes_freed,
                errors = report.errors.len(),
                "Retention cycle completed"
            );
        } else {
            debug!(path = %dir.display(), scanned = report.scanned, "Retention cycle completed");
        }

        report
    }

    /// Act on one listing of the directory.
    ///
    /// Entries that vanished or changed since the listing surface as per-file
    /// errors in `report`.
    fn apply(&self, entries: &[DirectoryEntry], now: SystemTime, report: &mut CycleReport) {
        // Computed before anything is touched, so a link seen now protects its
        // target for the rest of the cycle.
        let exclusions = self.resolver.exclusions(self.policy.dir(), entries);

        for entry in entries {
            if entry.is_dir || entry.is_symlink || !self.policy.is_managed(&entry.name) {
                continue;
            }

            if exclusions.contains(&entry.name) {
                debug!(name = %entry.name, "Skipping file held by a current-log symlink");
                report.protected += 1;
                continue;
            }

            match self.classifier.classify(&entry.name, entry.modified, now) {
                Action::Keep => {}
                Action::Delete => self.delete(entry, now, report),
                Action::Compress => self.compress(entry, report),
            }
        }
    }

    fn delete(&self, entry: &DirectoryEntry, now: SystemTime, report: &mut CycleReport) {
        match remove_file(self.policy.dir(), &entry.name) {
            Ok(()) => {
                report.deleted += 1;
                report.bytes_freed += entry.size;
                info!(
                    name = %entry.name,
                    age_secs = age_of(entry.modified, now).as_secs(),
                    "Deleted expired log file"
                );
            }
            Err(e) => {
                error!(error = %e, "Log deletion failed");
                report.add_error(e);
            }
        }
    }

    fn compress(&self, entry: &DirectoryEntry, report: &mut CycleReport) {
        let destination = compressed_name(&entry.name);

        let outcome = match self.compressor.compress(&entry.name, &destination) {
            Ok(outcome) => outcome,
            Err(e) => {
                // The source stays for the next cycle.
                error!(error = %e, "Log compression failed");
                report.add_error(e);
                return;
            }
        };

        match remove_file(self.policy.dir(), &entry.name) {
            Ok(()) => {
                report.compressed += 1;
                report.bytes_freed += outcome.bytes_saved();
                info!(
                    name = %entry.name,
                    dest = %destination,
                    original_bytes = outcome.original_bytes,
                    compressed_bytes = outcome.compressed_bytes,
                    "Compressed log file"
                );
            }
            Err(e) => {
                error!(error = %e, "Failed to remove compressed log source");
                report.add_error(e);
            }
        }
    }
}
