//! File access on both ends of a transfer.
//!
//! The client side reads a source file fully into memory ([`File`]). The
//! server side writes recovered plaintext into a single output directory
//! ([`OutputDir`]). The name used there comes from the peer and is untrusted,
//! so it is reduced to a bare file name before it gets anywhere near a path.
//!
//! ## Security Features
//!
//! - Only the final component of the received name is kept, splitting on both
//!   `/` and `\` regardless of platform
//! - `.`, `..`, empty names, NUL bytes and over-long names are rejected
//! - Output is written to a uniquely named temporary sibling and renamed into
//!   place, so a failed or concurrent write never leaves a truncated or mixed
//!   `received_*` file behind
//! - Errors sent back to the peer never echo the received name or the
//!   server's directory layout

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::config::{MAX_FILE_SIZE, MAX_FILENAME_LENGTH, RECEIVED_PREFIX};
use crate::error::{Result, TransferError};

const PARTIAL_SUFFIX: &str = ".part";

/// A local source file selected for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The base name sent to the server; directory components never leave
    /// this machine.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Filesystem`] if the path has no UTF-8 file name.
    pub fn file_name(&self) -> Result<String> {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .ok_or_else(|| TransferError::filesystem(format!("path has no usable file name: {}", self.path.display())))
    }

    /// Reads the whole file.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Filesystem`] if the path is missing, is not a
    /// regular file, exceeds [`MAX_FILE_SIZE`], or cannot be read.
    pub async fn read_all(&self) -> Result<Vec<u8>> {
        let meta = fs::metadata(&self.path).await.map_err(|e| TransferError::filesystem(format!("failed to get metadata: {}: {e}", self.path.display())))?;

        if !meta.is_file() {
            return Err(TransferError::filesystem(format!("not a regular file: {}", self.path.display())));
        }

        if meta.len() > MAX_FILE_SIZE {
            return Err(TransferError::filesystem(format!("file too large: {} bytes exceeds {MAX_FILE_SIZE}", meta.len())));
        }

        fs::read(&self.path).await.map_err(|e| TransferError::filesystem(format!("failed to read {}: {e}", self.path.display())))
    }
}

/// Reduces an untrusted name to a single safe path component.
///
/// `"../../etc/passwd"` becomes `"passwd"`; `"C:\\temp\\a.txt"` becomes
/// `"a.txt"`.
///
/// # Errors
///
/// Returns [`TransferError::Filesystem`] if nothing usable remains.
pub fn sanitize_filename(name: &str) -> Result<&str> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    if base.is_empty() || base == "." || base == ".." {
        return Err(TransferError::filesystem("invalid path: filename has no usable component"));
    }

    if base.contains('\0') {
        return Err(TransferError::filesystem("invalid path: filename contains NUL"));
    }

    if RECEIVED_PREFIX.len() + base.len() > MAX_FILENAME_LENGTH {
        return Err(TransferError::filesystem(format!("invalid path: filename longer than {MAX_FILENAME_LENGTH} bytes")));
    }

    Ok(base)
}

/// Directory that receives decrypted files.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The stored name and full path for a received filename.
    ///
    /// # Errors
    ///
    /// Propagates [`sanitize_filename`] rejections.
    pub fn target(&self, filename: &str) -> Result<(String, PathBuf)> {
        let stored = format!("{RECEIVED_PREFIX}{}", sanitize_filename(filename)?);
        let path = self.root.join(&stored);

        Ok((stored, path))
    }

    /// Writes `data` to `path` by way of a uniquely named temporary sibling
    /// and a rename. Concurrent writes of the same name each land whole; the
    /// last rename wins.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Filesystem`] on any I/O failure. The message
    /// names only the stored file; the full path goes to the log. The
    /// temporary file is removed if the write does not complete.
    pub async fn write(&self, path: &Path, data: Vec<u8>) -> Result<()> {
        let stored = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        let (root, target) = (self.root.clone(), path.to_path_buf());
        let len = data.len();

        let written = tokio::task::spawn_blocking(move || persist(&root, &target, &data))
            .await
            .map_err(|e| TransferError::filesystem(format!("failed to write {stored}: {e}")))?;

        match written {
            Ok(()) => {
                debug!(path = %path.display(), bytes = len, "output written");
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "output write failed");
                Err(TransferError::filesystem(format!("failed to write {stored}: {}", e.kind())))
            }
        }
    }
}

fn persist(root: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(root)?;

    let mut partial = tempfile::Builder::new().prefix(".").suffix(PARTIAL_SUFFIX).tempfile_in(root)?;
    partial.write_all(data)?;
    partial.as_file().sync_all()?;
    partial.persist(path).map_err(|e| e.error)?;

    Ok(())
}
