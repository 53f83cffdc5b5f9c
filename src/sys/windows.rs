//! Handle-based back-end (`CreateFileMappingW` / `MapViewOfFile`).

use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::windows::fs::OpenOptionsExt;
use std::os::windows::io::AsRawHandle;
use std::path::Path;
use std::ptr::{self, NonNull};

use super::View;
use crate::advise::AccessPattern;

type Handle = *mut c_void;

const FILE_SHARE_READ: u32 = 0x0000_0001;
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
const PAGE_READONLY: u32 = 0x02;
const PAGE_READWRITE: u32 = 0x04;
const FILE_MAP_WRITE: u32 = 0x0002;
const FILE_MAP_READ: u32 = 0x0004;
const ERROR_NOT_LOCKED: i32 = 158;

#[allow(non_snake_case)]
#[repr(C)]
struct WIN32_MEMORY_RANGE_ENTRY {
    VirtualAddress: *mut c_void,
    NumberOfBytes: usize,
}

#[allow(non_snake_case)]
#[repr(C)]
struct SYSTEM_INFO {
    wProcessorArchitecture: u16,
    wReserved: u16,
    dwPageSize: u32,
    lpMinimumApplicationAddress: *mut c_void,
    lpMaximumApplicationAddress: *mut c_void,
    dwActiveProcessorMask: usize,
    dwNumberOfProcessors: u32,
    dwProcessorType: u32,
    dwAllocationGranularity: u32,
    wProcessorLevel: u16,
    wProcessorRevision: u16,
}

#[allow(non_snake_case)]
extern "system" {
    fn CreateFileMappingW(
        hFile: Handle,
        lpFileMappingAttributes: *const c_void,
        flProtect: u32,
        dwMaximumSizeHigh: u32,
        dwMaximumSizeLow: u32,
        lpName: *const u16,
    ) -> Handle;
    fn MapViewOfFile(
        hFileMappingObject: Handle,
        dwDesiredAccess: u32,
        dwFileOffsetHigh: u32,
        dwFileOffsetLow: u32,
        dwNumberOfBytesToMap: usize,
    ) -> *mut c_void;
    fn UnmapViewOfFile(lpBaseAddress: *const c_void) -> i32;
    fn FlushViewOfFile(lpBaseAddress: *const c_void, dwNumberOfBytesToFlush: usize) -> i32;
    fn CloseHandle(hObject: Handle) -> i32;
    fn VirtualLock(lpAddress: *const c_void, dwSize: usize) -> i32;
    fn VirtualUnlock(lpAddress: *const c_void, dwSize: usize) -> i32;
    fn PrefetchVirtualMemory(
        hProcess: Handle,
        NumberOfEntries: usize,
        VirtualAddresses: *const WIN32_MEMORY_RANGE_ENTRY,
        Flags: u32,
    ) -> i32;
    fn GetCurrentProcess() -> Handle;
    fn GetSystemInfo(lpSystemInfo: *mut SYSTEM_INFO);
}

/// Open `path` read-only, or read-write and created when absent. Other
/// handles may read and write the file concurrently.
pub(crate) fn open_file(path: &Path, writing: bool) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .write(writing)
        .create(writing)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE)
        .open(path)
}

/// File-mapping object. Closed on drop.
#[derive(Debug)]
pub(crate) struct MappingHandle {
    handle: Handle,
    len: usize,
    access: u32,
}

// SAFETY: kernel object handles are process-wide and may be closed from any thread.
unsafe impl Send for MappingHandle {}
// SAFETY: the handle is never used mutably through a shared reference.
unsafe impl Sync for MappingHandle {}

impl Drop for MappingHandle {
    fn drop(&mut self) {
        // SAFETY: we own the handle and close it exactly once.
        if unsafe { CloseHandle(self.handle) } == 0 {
            log::error!("failed to close mapping handle: {}", io::Error::last_os_error());
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn create_mapping(file: &File, len: usize, writable: bool) -> io::Result<MappingHandle> {
    if len == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "zero-length mapping"));
    }
    let (protect, access) = if writable {
        (PAGE_READWRITE, FILE_MAP_READ | FILE_MAP_WRITE)
    } else {
        (PAGE_READONLY, FILE_MAP_READ)
    };
    let max = len as u64;
    // SAFETY: the file handle is live for this call; no name, default security.
    let handle = unsafe {
        CreateFileMappingW(
            file.as_raw_handle().cast::<c_void>(),
            ptr::null(),
            protect,
            (max >> 32) as u32,
            max as u32,
            ptr::null(),
        )
    };
    if handle.is_null() {
        return Err(io::Error::last_os_error());
    }
    Ok(MappingHandle { handle, len, access })
}

pub(crate) fn map_view(_file: &File, mapping: &MappingHandle) -> io::Result<View> {
    // SAFETY: the mapping handle is live and sized for at least mapping.len bytes.
    let addr = unsafe { MapViewOfFile(mapping.handle, mapping.access, 0, 0, mapping.len) };
    match NonNull::new(addr.cast::<u8>()) {
        // SAFETY: MapViewOfFile succeeded for exactly mapping.len bytes and we are the only owner.
        Some(base) => Ok(unsafe { View::from_raw(base, mapping.len) }),
        None => Err(io::Error::last_os_error()),
    }
}

pub(crate) unsafe fn unmap_view(addr: *mut u8, _len: usize) -> io::Result<()> {
    if UnmapViewOfFile(addr.cast::<c_void>().cast_const()) == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Windows only has a prefetch primitive; the other patterns are accepted
/// and have no effect.
pub(crate) unsafe fn advise(addr: *mut u8, len: usize, pattern: AccessPattern) -> io::Result<()> {
    if pattern != AccessPattern::WillNeed {
        return Ok(());
    }
    let entry = WIN32_MEMORY_RANGE_ENTRY {
        VirtualAddress: addr.cast::<c_void>(),
        NumberOfBytes: len,
    };
    if PrefetchVirtualMemory(GetCurrentProcess(), 1, &entry, 0) == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) unsafe fn lock(addr: *mut u8, len: usize) -> io::Result<()> {
    if VirtualLock(addr.cast::<c_void>().cast_const(), len) == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub(crate) unsafe fn unlock(addr: *mut u8, len: usize) -> io::Result<()> {
    if VirtualUnlock(addr.cast::<c_void>().cast_const(), len) == 0 {
        let err = io::Error::last_os_error();
        // Pages that were never locked are not a leak.
        if err.raw_os_error() != Some(ERROR_NOT_LOCKED) {
            return Err(err);
        }
    }
    Ok(())
}

// FlushViewOfFile only queues the writes; FlushFileBuffers (sync_data) waits for them.
pub(crate) unsafe fn flush(file: &File, addr: *mut u8, len: usize) -> io::Result<()> {
    if FlushViewOfFile(addr.cast::<c_void>().cast_const(), len) == 0 {
        return Err(io::Error::last_os_error());
    }
    file.sync_data()
}

pub(crate) fn page_size() -> usize {
    let mut sysinfo = MaybeUninit::<SYSTEM_INFO>::uninit();
    // SAFETY: GetSystemInfo always fills the struct.
    unsafe {
        GetSystemInfo(sysinfo.as_mut_ptr());
        sysinfo.assume_init().dwPageSize as usize
    }
}
