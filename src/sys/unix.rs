//! Descriptor-based back-end (`mmap(2)` family).

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::{self, NonNull};

use libc::{c_int, c_void};

use super::View;
use crate::advise::AccessPattern;

// Permissions for files created by a write-mode open.
const CREATE_MODE: u32 = 0o600;

/// Open `path` read-only, or read-write and created when absent.
pub(crate) fn open_file(path: &Path, writing: bool) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(writing)
        .create(writing)
        .mode(CREATE_MODE)
        .open(path)
}

/// Descriptor platforms have no separate mapping object: the descriptor
/// itself is mapped. This only records what `mmap` will be asked for.
#[derive(Debug)]
pub(crate) struct MappingHandle {
    len: usize,
    prot: c_int,
}

pub(crate) fn create_mapping(_file: &File, len: usize, writable: bool) -> io::Result<MappingHandle> {
    if len == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "zero-length mapping"));
    }
    let prot = if writable {
        libc::PROT_READ | libc::PROT_WRITE
    } else {
        libc::PROT_READ
    };
    Ok(MappingHandle { len, prot })
}

pub(crate) fn map_view(file: &File, mapping: &MappingHandle) -> io::Result<View> {
    // SAFETY: fd is open for the lifetime of this call and the kernel picks the address.
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            mapping.len,
            mapping.prot,
            libc::MAP_SHARED,
            file.as_raw_fd(),
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    match NonNull::new(addr.cast::<u8>()) {
        // SAFETY: mmap succeeded for exactly mapping.len bytes and we are the only owner.
        Some(base) => Ok(unsafe { View::from_raw(base, mapping.len) }),
        None => Err(io::Error::new(io::ErrorKind::Other, "mmap returned a null view")),
    }
}

pub(crate) unsafe fn unmap_view(addr: *mut u8, len: usize) -> io::Result<()> {
    if libc::munmap(addr.cast::<c_void>(), len) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) unsafe fn advise(addr: *mut u8, len: usize, pattern: AccessPattern) -> io::Result<()> {
    let flag = match pattern {
        AccessPattern::Normal => libc::MADV_NORMAL,
        AccessPattern::Random => libc::MADV_RANDOM,
        AccessPattern::Sequential => libc::MADV_SEQUENTIAL,
        AccessPattern::WillNeed => libc::MADV_WILLNEED,
    };
    if libc::madvise(addr.cast::<c_void>(), len, flag) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) unsafe fn lock(addr: *mut u8, len: usize) -> io::Result<()> {
    if libc::mlock(addr.cast::<c_void>().cast_const(), len) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) unsafe fn unlock(addr: *mut u8, len: usize) -> io::Result<()> {
    if libc::munlock(addr.cast::<c_void>().cast_const(), len) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

// msync(MS_SYNC) also writes the pages through to the file, so `_file` is unused here.
pub(crate) unsafe fn flush(_file: &File, addr: *mut u8, len: usize) -> io::Result<()> {
    if libc::msync(addr.cast::<c_void>(), len, libc::MS_SYNC) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    // Page size should always be positive and fit in usize
    size.max(0) as usize
}
