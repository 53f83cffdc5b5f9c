//! High-level API for one-shot work on mapped files.
//!
//! Provides convenience functions that wrap [`MappedFile`] construction.

use std::path::Path;

use crate::errors::{MmapFileError, Result};
use crate::mmap::MappedFile;
use crate::options::ResidencyMode;

/// Create (or open) a read-write mapping of at least `size` bytes.
///
/// # Errors
///
/// Returns errors from `MappedFile::create_rw`.
pub fn create_mapped<P: AsRef<Path>>(path: P, size: u64) -> Result<MappedFile> {
    MappedFile::create_rw(path, size)
}

/// Map an existing file read-only.
///
/// # Errors
///
/// Returns errors from `MappedFile::open_ro`.
pub fn load_mapped<P: AsRef<Path>>(path: P) -> Result<MappedFile> {
    MappedFile::open_ro(path)
}

/// Write bytes at an offset into the file at `path`, growing it to fit, and
/// flush before returning.
///
/// # Errors
///
/// Returns `MmapFileError::OutOfBounds` if `offset + data.len()` overflows.
/// Returns errors from opening, updating, flushing or closing the mapping.
pub fn write_mapped<P: AsRef<Path>>(path: P, offset: u64, data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let len = data.len() as u64;
    let end = offset.checked_add(len).ok_or(MmapFileError::OutOfBounds {
        offset,
        len,
        total: u64::MAX,
    })?;
    let mut mmap = MappedFile::open(path, end, true, ResidencyMode::Quick)?;
    mmap.update_region(offset, data)?;
    mmap.flush()?;
    mmap.close()
}

/// Read `len` bytes at `offset` from the file at `path`.
///
/// # Errors
///
/// Returns errors from `MappedFile::open_ro` or `MappedFile::read_into`.
pub fn read_mapped<P: AsRef<Path>>(path: P, offset: u64, len: usize) -> Result<Vec<u8>> {
    let mmap = MappedFile::open_ro(path)?;
    let mut buf = vec![0u8; len];
    mmap.read_into(offset, &mut buf)?;
    Ok(buf)
}

#[cfg(feature = "async")]
pub mod r#async {
    //! Async helpers (Tokio) that run the blocking open on the blocking pool.
    use std::io;
    use std::path::Path;

    use crate::errors::{MmapFileError, Result};
    use crate::mmap::MappedFile;
    use crate::options::MappedFileOptions;

    /// Open a mapping without blocking the current task.
    ///
    /// # Errors
    ///
    /// Returns errors from `MappedFileOptions::open`, or `MmapFileError::Io`
    /// if the blocking task panicked or was cancelled.
    pub async fn open_async(options: MappedFileOptions) -> Result<MappedFile> {
        tokio::task::spawn_blocking(move || options.open())
            .await
            .map_err(|e| MmapFileError::Io(io::Error::other(e)))?
    }

    /// Create (or open) a read-write mapping asynchronously.
    ///
    /// # Errors
    ///
    /// Returns errors from `open_async`.
    pub async fn create_mapped_async<P: AsRef<Path>>(path: P, size: u64) -> Result<MappedFile> {
        open_async(MappedFile::options(path).size(size).write(true)).await
    }

    /// Map an existing file read-only asynchronously.
    ///
    /// # Errors
    ///
    /// Returns errors from `open_async`.
    pub async fn load_mapped_async<P: AsRef<Path>>(path: P) -> Result<MappedFile> {
        open_async(MappedFile::options(path)).await
    }
}
