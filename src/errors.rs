//! Crate-specific error types for mmap-file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for mmap-file operations.
pub type Result<T> = std::result::Result<T, MmapFileError>;

/// Error type covering every stage of acquiring, using and releasing a mapping.
///
/// Construction errors are reported only after every resource acquired before
/// the failing stage has been released again.
#[derive(Debug, Error)]
pub enum MmapFileError {
    /// The backing file could not be opened or created.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// Path passed to the constructor.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The backing file could not be stretched to the requested size.
    #[error("failed to extend {} to {size} bytes: {source}", .path.display())]
    Extend {
        /// Path of the backing file.
        path: PathBuf,
        /// Target length in bytes.
        size: u64,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The OS refused to create the mapping object.
    #[error("failed to create mapping for {}: {source}", .path.display())]
    MapCreate {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The OS refused to produce an addressable view of the mapping.
    #[error("failed to map view of {}: {source}", .path.display())]
    MapView {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Both the access-pattern hint and the pinning fallback failed.
    #[error("residency request failed for {}: hint: {hint}; pin: {pin}", .path.display())]
    Residency {
        /// Path of the backing file.
        path: PathBuf,
        /// Error reported by the access-pattern hint.
        hint: io::Error,
        /// Error reported by the pinning fallback.
        #[source]
        pin: io::Error,
    },

    /// Releasing pinned pages failed during teardown.
    #[error("failed to unpin mapped range: {source}")]
    Unlock {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The requested size is zero or does not fit the address space.
    #[error("invalid size {size}: {reason}")]
    InvalidSize {
        /// Requested size in bytes.
        size: u64,
        /// Why the size was rejected.
        reason: &'static str,
    },

    /// Error returned when attempting an operation in an incompatible mode.
    #[error("invalid access mode: {0}")]
    InvalidMode(&'static str),

    /// Error when a requested offset/length pair is out of bounds.
    #[error("range out of bounds: offset={offset}, len={len}, total={total}")]
    OutOfBounds {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Total size of the mapped file.
        total: u64,
    },

    /// The mapping has already been torn down.
    #[error("mapping is closed")]
    Closed,

    /// Error when an access-pattern hint on a sub-range fails.
    #[error("advice failed: {0}")]
    AdviceFailed(#[source] io::Error),

    /// Error when a flush operation fails.
    #[error("flush failed: {0}")]
    FlushFailed(#[source] io::Error),

    /// Wrapper for `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
