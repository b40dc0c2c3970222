//! Age-based lifecycle decisions.

use serde::Serialize;
use std::time::{Duration, SystemTime};

use crate::COMPRESSED_SUFFIX;

/// Lifecycle transition for one file in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Keep,
    Compress,
    Delete,
}

/// Decides the transition of a file from its modification time.
#[derive(Debug, Clone, Copy)]
pub struct AgeClassifier {
    reserve: Duration,
    compress_after: Duration,
}

impl AgeClassifier {
    pub fn new(reserve: Duration, compress_after: Duration) -> Self {
        Self {
            reserve,
            compress_after,
        }
    }

    /// First match wins: expired files are deleted outright, never compressed
    /// first.
    pub fn classify(&self, name: &str, modified: SystemTime, now: SystemTime) -> Action {
        let age = age_of(modified, now);

        if age > self.reserve {
            Action::Delete
        } else if age > self.compress_after && !name.ends_with(COMPRESSED_SUFFIX) {
            Action::Compress
        } else {
            Action::Keep
        }
    }
}

/// Age of a file at `now`; modification times in the future count as zero.
pub fn age_of(modified: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or_default()
}
