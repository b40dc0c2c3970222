//! Directory listing snapshots.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// One entry of a directory listing, taken without following symlinks.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub name: String,
    pub modified: SystemTime,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub size: u64,
}

/// List `dir` once.
///
/// Entries whose metadata vanishes between listing and stat, entries without a
/// modification time, and entries with non UTF-8 names are left out. A failure
/// to open or iterate the directory itself is returned.
pub fn read_entries(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!(name = ?raw, "Skipping entry with non UTF-8 name");
                continue;
            }
        };

        // DirEntry::metadata does not traverse symlinks.
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(name = %name, error = %e, "Entry disappeared during listing");
                continue;
            }
        };

        let Some(modified) = modification_time(&name, metadata.modified()) else {
            continue;
        };

        let file_type = metadata.file_type();
        entries.push(DirectoryEntry {
            name,
            modified,
            is_dir: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
            size: metadata.len(),
        });
    }

    Ok(entries)
}

/// An entry whose age cannot be known is never classified.
fn modification_time(name: &str, modified: io::Result<SystemTime>) -> Option<SystemTime> {
    match modified {
        Ok(modified) => Some(modified),
        Err(e) => {
            debug!(name = %name, error = %e, "Skipping entry without a modification time");
            None
        }
    }
}
