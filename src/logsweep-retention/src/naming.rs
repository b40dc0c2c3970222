//! Classification of directory entries into managed log files.

use serde::{Deserialize, Serialize};

use crate::COMPRESSED_SUFFIX;

/// Number of dot-separated segments in a structured log file name.
const STRUCTURED_SEGMENTS: usize = 7;

/// Position of the literal `log` token in a structured name.
const LOG_SEGMENT_INDEX: usize = 3;

const LOG_TOKEN: &str = "log";

/// File-name grammar that decides which files a cleaner manages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingScheme {
    /// Any file whose name starts with the prefix.
    #[default]
    Prefix,

    /// `<prefix>.<host>.<user>.log.<SEVERITY>.<timestamp>.<pid>`, optionally
    /// followed by `.gz`.
    Structured,
}

impl NamingScheme {
    /// Whether `name` is a managed log file under this scheme.
    pub fn matches(&self, name: &str, prefix: &str) -> bool {
        if !name.starts_with(prefix) {
            return false;
        }

        match self {
            NamingScheme::Prefix => true,
            NamingScheme::Structured => has_structured_shape(name),
        }
    }
}

fn has_structured_shape(name: &str) -> bool {
    // Compressed artifacts keep their original shape under the suffix.
    let stem = name.strip_suffix(COMPRESSED_SUFFIX).unwrap_or(name);

    let mut count = 0;
    let mut log_token = false;
    for (idx, segment) in stem.split('.').enumerate() {
        if idx == LOG_SEGMENT_INDEX {
            log_token = segment == LOG_TOKEN;
        }
        count += 1;
    }

    count == STRUCTURED_SEGMENTS && log_token
}
