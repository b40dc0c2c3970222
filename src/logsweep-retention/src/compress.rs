//! Gzip compression of aging log files.
//!
//! Fresh artifacts are written through a hidden temp file that is synced and
//! then linked into place, so a failed compression never leaves a partial
//! `.gz` behind and never costs the source file.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{COMPRESSED_SUFFIX, Result, RetentionError, TEMP_SUFFIX};

/// Name of the compressed artifact for `name`.
pub fn compressed_name(name: &str) -> String {
    format!("{}{}", name, COMPRESSED_SUFFIX)
}

/// Sizes observed while compressing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOutcome {
    /// Bytes read from the source.
    pub original_bytes: u64,
    /// Bytes added to the destination.
    pub compressed_bytes: u64,
}

impl CompressionOutcome {
    pub fn bytes_saved(&self) -> u64 {
        self.original_bytes.saturating_sub(self.compressed_bytes)
    }
}

/// Compresses files within one directory.
#[derive(Debug, Clone)]
pub struct Compressor {
    dir: PathBuf,
    append: bool,
}

impl Compressor {
    /// With `append` unset, an existing destination is an error.
    pub fn new(dir: impl Into<PathBuf>, append: bool) -> Self {
        Self {
            dir: dir.into(),
            append,
        }
    }

    /// Compress `source` into `destination`, both relative to the directory.
    ///
    /// The source is left in place; removing it is up to the caller once this
    /// returns `Ok`.
    pub fn compress(&self, source: &str, destination: &str) -> Result<CompressionOutcome> {
        let source_path = self.dir.join(source);
        let dest_path = self.dir.join(destination);

        let outcome = if self.append {
            append_member(&source_path, &dest_path)
        } else {
            self.write_fresh(&source_path, &dest_path, destination)
        };

        outcome.map_err(|e| RetentionError::Compression {
            path: source_path,
            source: e,
        })
    }

    fn write_fresh(
        &self,
        source: &Path,
        dest: &Path,
        destination: &str,
    ) -> io::Result<CompressionOutcome> {
        match fs::symlink_metadata(dest) {
            Ok(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("destination {} already exists", dest.display()),
                ));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let input = File::open(source)?;

        // Leading dot keeps the temp file out of any prefix scope.
        let temp_path = self.dir.join(format!(".{}{}", destination, TEMP_SUFFIX));

        let result = File::create(&temp_path)
            .and_then(|output| encode(input, output))
            .and_then(|outcome| {
                commit(&temp_path, dest)?;
                Ok(outcome)
            });

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }

        if let Ok(outcome) = &result {
            debug!(
                dest = %dest.display(),
                original_bytes = outcome.original_bytes,
                compressed_bytes = outcome.compressed_bytes,
                "Wrote compressed log"
            );
        }

        result
    }
}

/// Move a finished temp file to `dest`, failing if `dest` exists.
///
/// Linking refuses an existing name where `rename` would replace it.
fn commit(temp: &Path, dest: &Path) -> io::Result<()> {
    fs::hard_link(temp, dest)?;
    // The artifact is in place; a leftover temp is truncated by the next write.
    if let Err(e) = fs::remove_file(temp) {
        debug!(temp = %temp.display(), error = %e, "Failed to remove compression temp file");
    }
    Ok(())
}

/// Append one gzip member to `dest`, creating it if needed.
///
/// On failure `dest` is truncated back to its previous length, so a partial
/// member never follows the existing ones.
fn append_member(source: &Path, dest: &Path) -> io::Result<CompressionOutcome> {
    let input = File::open(source)?;
    let output = OpenOptions::new().create(true).append(true).open(dest)?;
    let start_len = output.metadata()?.len();
    let rollback = output.try_clone()?;

    encode(input, output).inspect_err(|e| {
        if let Err(truncate_err) = rollback.set_len(start_len) {
            warn!(
                dest = %dest.display(),
                error = %e,
                truncate_error = %truncate_err,
                "Failed to roll back partial gzip member"
            );
        }
    })
}

fn encode(input: File, output: File) -> io::Result<CompressionOutcome> {
    let modified = input.metadata()?.modified()?;
    let start_len = output.metadata()?.len();

    let mut reader = BufReader::new(input);
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    let original_bytes = io::copy(&mut reader, &mut encoder)?;

    let output = encoder
        .finish()?
        .into_inner()
        .map_err(|e| e.into_error())?;
    output.sync_all()?;

    // The artifact keeps aging from the original write, not from compression.
    output.set_modified(modified)?;

    let end_len = output.metadata()?.len();
    Ok(CompressionOutcome {
        original_bytes,
        compressed_bytes: end_len.saturating_sub(start_len),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{GzDecoder, MultiGzDecoder};
    use std::io::Read;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn gunzip(path: &Path) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_compress_round_trips_content() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let content = "line one\nline two\n".repeat(100);
        fs::write(dir.join("app.log.1"), &content).unwrap();

        let compressor = Compressor::new(dir, false);
        let outcome = compressor.compress("app.log.1", "app.log.1.gz").unwrap();

        assert_eq!(outcome.original_bytes, content.len() as u64);
        assert!(outcome.bytes_saved() > 0);
        assert_eq!(gunzip(&dir.join("app.log.1.gz")), content.as_bytes());
        // Source is the caller's to remove.
        assert!(dir.join("app.log.1").exists());
        assert!(!dir.join(".app.log.1.gz.tmp").exists());
    }

    #[test]
    fn test_compress_preserves_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let source = dir.join("app.log.1");
        fs::write(&source, "data").unwrap();

        let past = SystemTime::now() - Duration::from_secs(600);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(past)
            .unwrap();

        Compressor::new(dir, false)
            .compress("app.log.1", "app.log.1.gz")
            .unwrap();

        let modified = fs::metadata(dir.join("app.log.1.gz"))
            .unwrap()
            .modified()
            .unwrap();
        let drift = modified
            .duration_since(past)
            .unwrap_or_else(|e| e.duration());
        assert!(drift < Duration::from_secs(1));
    }

    #[test]
    fn test_compress_refuses_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("app.log.1"), "new").unwrap();
        fs::write(dir.join("app.log.1.gz"), "existing").unwrap();

        let err = Compressor::new(dir, false)
            .compress("app.log.1", "app.log.1.gz")
            .unwrap_err();

        assert!(matches!(err, RetentionError::Compression { .. }));
        assert_eq!(fs::read(dir.join("app.log.1.gz")).unwrap(), b"existing");
        assert_eq!(fs::read(dir.join("app.log.1")).unwrap(), b"new");
    }

    #[test]
    fn test_compress_missing_source_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        let result = Compressor::new(dir, false).compress("app.log.9", "app.log.9.gz");

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir).unwrap().count(), 0);
    }

    #[test]
    fn test_append_mode_adds_gzip_member() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("first"), "first\n").unwrap();
        fs::write(dir.join("second"), "second\n").unwrap();

        let compressor = Compressor::new(dir, true);
        compressor.compress("first", "combined.gz").unwrap();
        compressor.compress("second", "combined.gz").unwrap();

        let mut out = String::new();
        MultiGzDecoder::new(File::open(dir.join("combined.gz")).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "first\nsecond\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_append_leaves_destination_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("first"), "first\n").unwrap();
        // Opening a directory succeeds on unix; reading it fails mid-encode.
        fs::create_dir(dir.join("unreadable")).unwrap();

        let compressor = Compressor::new(dir, true);
        compressor.compress("first", "combined.gz").unwrap();
        let before = fs::read(dir.join("combined.gz")).unwrap();

        let err = compressor
            .compress("unreadable", "combined.gz")
            .unwrap_err();

        assert!(matches!(err, RetentionError::Compression { .. }));
        assert_eq!(fs::read(dir.join("combined.gz")).unwrap(), before);

        let mut out = String::new();
        MultiGzDecoder::new(File::open(dir.join("combined.gz")).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "first\n");
    }

    #[test]
    fn test_commit_refuses_to_replace_destination() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let temp = dir.join(".app.log.1.gz.tmp");
        let dest = dir.join("app.log.1.gz");
        fs::write(&temp, "new").unwrap();
        fs::write(&dest, "raced").unwrap();

        let err = commit(&temp, &dest).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&dest).unwrap(), b"raced");
    }

    #[test]
    fn test_commit_moves_temp_into_place() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let temp = dir.join(".app.log.1.gz.tmp");
        let dest = dir.join("app.log.1.gz");
        fs::write(&temp, "payload").unwrap();

        commit(&temp, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"payload");
        assert!(!temp.exists());
    }

    #[test]
    fn test_compressed_name() {
        assert_eq!(compressed_name("app.log.1"), "app.log.1.gz");
    }
}
