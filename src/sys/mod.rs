//! Platform back-ends for the file/mapping/view triad.
//!
//! Each back-end exposes the same set of functions:
//!
//! - `open_file`: open (or create) the backing file with the right access and sharing
//! - `create_mapping`: produce the mapping object for a file
//! - `map_view`: project a mapping into the address space
//! - `advise` / `lock` / `unlock` / `flush` / `unmap_view`: operate on a live view
//! - `page_size`: system page size
//!
//! The back-end is picked at build time. [`View`] and the back-end's
//! `MappingHandle` release their OS object on drop, so an early return during
//! construction unwinds exactly what was acquired so far.

use std::fs::File;
use std::io;
use std::ptr::NonNull;

use crate::advise::AccessPattern;
use crate::utils::align_down;

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        mod windows;
        pub(crate) use self::windows::*;
    } else if #[cfg(unix)] {
        mod unix;
        pub(crate) use self::unix::*;
    } else {
        compile_error!("mmap-file supports Unix and Windows targets only");
    }
}

/// An owned, mapped address range. Unmapped on drop.
pub(crate) struct View {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: the view exclusively owns its address range; releasing it from
// another thread is permitted by every supported OS.
unsafe impl Send for View {}
// SAFETY: shared access only hands out the base address; mutation goes
// through `&mut MappedFile`.
unsafe impl Sync for View {}

impl View {
    /// # Safety
    ///
    /// `ptr` must be the base address of a live mapping of exactly `len`
    /// bytes that nothing else will unmap.
    pub(crate) unsafe fn from_raw(ptr: NonNull<u8>, len: usize) -> Self {
        Self { ptr, len }
    }

    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Hint the access pattern for `[start, start + len)`. The range must lie
    /// inside the view.
    pub(crate) fn advise(&self, start: usize, len: usize, pattern: AccessPattern) -> io::Result<()> {
        let (addr, span) = self.page_span(start, len);
        // SAFETY: page_span stays inside the view, which is page aligned.
        unsafe { advise(addr, span, pattern) }
    }

    /// Pin the whole view in physical memory.
    pub(crate) fn lock(&self) -> io::Result<()> {
        // SAFETY: the full range belongs to this live view.
        unsafe { lock(self.as_ptr(), self.len) }
    }

    /// Release a pin taken by [`View::lock`].
    pub(crate) fn unlock(&self) -> io::Result<()> {
        // SAFETY: the full range belongs to this live view.
        unsafe { unlock(self.as_ptr(), self.len) }
    }

    /// Write dirty pages in `[start, start + len)` back to `file`.
    pub(crate) fn flush(&self, file: &File, start: usize, len: usize) -> io::Result<()> {
        let (addr, span) = self.page_span(start, len);
        // SAFETY: page_span stays inside the view, which is page aligned.
        unsafe { flush(file, addr, span) }
    }

    // Widen a sub-range so that it starts on a page boundary.
    fn page_span(&self, start: usize, len: usize) -> (*mut u8, usize) {
        debug_assert!(start.saturating_add(len) <= self.len);
        let aligned = align_down(start, page_size());
        // SAFETY: aligned <= start <= self.len.
        let addr = unsafe { self.as_ptr().add(aligned) };
        (addr, len + (start - aligned))
    }
}

impl Drop for View {
    fn drop(&mut self) {
        // SAFETY: we own the range and nothing references it past this point.
        if let Err(e) = unsafe { unmap_view(self.as_ptr(), self.len) } {
            log::error!("failed to unmap {} byte view: {e}", self.len);
        }
    }
}
