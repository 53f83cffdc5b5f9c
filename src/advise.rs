//! Access-pattern hints and the advised-residency policy.

use std::io;

#[cfg(feature = "advise")]
use crate::errors::{MmapFileError, Result};
#[cfg(feature = "advise")]
use crate::mmap::MappedFile;
#[cfg(feature = "advise")]
use crate::utils::slice_range;

/// Memory access pattern advice for the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPattern {
    /// Normal access pattern.
    Normal,
    /// Random access pattern (default for advised mappings).
    #[default]
    Random,
    /// Sequential access pattern.
    Sequential,
    /// Will need this range soon.
    WillNeed,
}

/// What an advised mapping ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Residency {
    /// The access hint was accepted.
    Hinted,
    /// The hint was refused and the range was pinned instead.
    Pinned,
}

/// Ask for `hint`; only if that fails, fall back to `pin`.
///
/// A successful hint never pins. When both fail the two errors are handed
/// back so the caller can report them together.
pub(crate) fn request_residency<H, P>(hint: H, pin: P) -> std::result::Result<Residency, (io::Error, io::Error)>
where
    H: FnOnce() -> io::Result<()>,
    P: FnOnce() -> io::Result<()>,
{
    let hint_err = match hint() {
        Ok(()) => return Ok(Residency::Hinted),
        Err(e) => e,
    };
    log::warn!("access hint rejected ({hint_err}); pinning mapped range instead");
    match pin() {
        Ok(()) => Ok(Residency::Pinned),
        Err(pin_err) => Err((hint_err, pin_err)),
    }
}

#[cfg(feature = "advise")]
impl MappedFile {
    /// Advise the OS about expected access patterns for a sub-range.
    ///
    /// The advice is a hint and may be ignored by the OS. Ranges are widened
    /// to start on a page boundary.
    ///
    /// # Platform-specific behavior
    ///
    /// - **Unix**: Uses `madvise` system call
    /// - **Windows**: Uses `PrefetchVirtualMemory` for `WillNeed`, no-op for others
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    /// Returns `MmapFileError::OutOfBounds` if the range exceeds file bounds.
    /// Returns `MmapFileError::AdviceFailed` if the system call fails.
    pub fn advise(&self, offset: u64, len: u64, pattern: AccessPattern) -> Result<()> {
        let view = self.view()?;
        if len == 0 {
            return Ok(());
        }
        let (start, end) = slice_range(offset, len, self.size())?;
        view.advise(start, end - start, pattern)
            .map_err(MmapFileError::AdviceFailed)
    }
}
