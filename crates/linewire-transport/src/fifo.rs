use std::ffi::CString;
use std::fs::File;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// A named FIFO at a caller-chosen filesystem path.
///
/// Creation is idempotent: an existing FIFO at the path is reused, anything
/// else at the path is an error. The path is unlinked on `Drop` only when
/// this instance created it and its identity is unchanged.
pub struct Fifo {
    path: PathBuf,
    created_inode: Option<(u64, u64)>,
    cleanup_on_drop: bool,
}

impl Fifo {
    /// Default permission mode for created FIFOs.
    pub const DEFAULT_FIFO_MODE: u32 = 0o600;

    /// Create a FIFO at `path`, or adopt an existing one.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::create_with_mode(path, Self::DEFAULT_FIFO_MODE)
    }

    /// Create a FIFO at `path` with an explicit permission mode.
    pub fn create_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let c_path =
            CString::new(path.as_os_str().as_bytes()).map_err(|_| TransportError::Create {
                path: path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path contains an interior NUL byte",
                ),
            })?;

        // SAFETY: `c_path` is a valid NUL-terminated string owned by this frame.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), mode as libc::mode_t) };
        if rc == 0 {
            let metadata =
                std::fs::symlink_metadata(&path).map_err(|e| TransportError::Create {
                    path: path.clone(),
                    source: e,
                })?;
            info!(?path, "created fifo");
            return Ok(Self {
                path,
                created_inode: Some((metadata.dev(), metadata.ino())),
                cleanup_on_drop: true,
            });
        }

        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::AlreadyExists {
            return Err(TransportError::Create { path, source: err });
        }

        // Reuse an existing FIFO, but never adopt a non-FIFO file.
        let metadata = std::fs::symlink_metadata(&path).map_err(|e| TransportError::Create {
            path: path.clone(),
            source: e,
        })?;
        if !metadata.file_type().is_fifo() {
            return Err(TransportError::Create {
                path,
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "existing path is not a fifo",
                ),
            });
        }

        debug!(?path, "reusing existing fifo");
        Ok(Self {
            path,
            created_inode: None,
            cleanup_on_drop: false,
        })
    }

    /// Open the read end (blocks until a writer opens the FIFO).
    pub fn open_reader(&self) -> Result<File> {
        debug!(path = ?self.path, "opening fifo for reading");
        File::options()
            .read(true)
            .open(&self.path)
            .map_err(|e| TransportError::Open {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Open the write end (blocks until a reader opens the FIFO).
    pub fn open_writer(&self) -> Result<File> {
        debug!(path = ?self.path, "opening fifo for writing");
        File::options()
            .write(true)
            .open(&self.path)
            .map_err(|e| TransportError::Open {
                path: self.path.clone(),
                source: e,
            })
    }

    /// The path this FIFO lives at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "named-fifo"
    }
}

impl Drop for Fifo {
    fn drop(&mut self) {
        if self.cleanup_on_drop {
            if let Some((expected_dev, expected_ino)) = self.created_inode {
                if let Ok(metadata) = std::fs::symlink_metadata(&self.path) {
                    if metadata.file_type().is_fifo()
                        && metadata.dev() == expected_dev
                        && metadata.ino() == expected_ino
                    {
                        debug!(path = ?self.path, "cleaning up fifo");
                        let _ = std::fs::remove_file(&self.path);
                    } else {
                        debug!(
                            path = ?self.path,
                            "fifo path identity changed; skipping cleanup"
                        );
                    }
                }
            }
        }
    }
}
