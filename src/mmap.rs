//! The owned file/mapping/view triad.

use std::{
    fs::File,
    io::{self, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    ptr,
};

use log::{debug, error, trace};

use crate::advise::{request_residency, AccessPattern, Residency};
use crate::errors::{MmapFileError, Result};
use crate::options::{MappedFileOptions, ResidencyMode};
use crate::sys::{self, MappingHandle, View};
use crate::utils::slice_range;

// Error message constants
const ERR_ZERO_SIZE: &str = "size must be greater than zero";
const ERR_TOO_LARGE: &str = "exceeds maximum mappable size";
const ERR_ZERO_LENGTH_FILE: &str = "cannot map zero-length file";

// Largest length a single view may have.
const MAX_MAP_LEN: u64 = isize::MAX as u64;

/// A file region mapped into memory.
///
/// One value owns three OS resources: the file handle, the mapping object and
/// the mapped view. They are acquired together by [`MappedFile::open`] and
/// released together, view first and file last, by [`MappedFile::close`] or
/// on drop. If any acquisition step fails, the resources already acquired
/// are released before the error is returned.
///
/// # Examples
///
/// ```no_run
/// use mmap_file::{MappedFile, ResidencyMode};
///
/// let mut mmap = MappedFile::open("a.dat", 1024, true, ResidencyMode::Quick)?;
/// assert!(mmap.is_open());
/// assert_eq!(mmap.size(), 1024);
///
/// mmap.update_region(0, b"hello world!!!!")?;
/// mmap.flush()?;
/// mmap.close()?;
///
/// let again = MappedFile::open_ro("a.dat")?;
/// assert_eq!(&again.as_slice()?[..15], b"hello world!!!!");
/// # Ok::<(), mmap_file::MmapFileError>(())
/// ```
pub struct MappedFile {
    // Field order is release order.
    view: Option<View>,
    mapping: Option<MappingHandle>,
    file: Option<File>,
    path: PathBuf,
    len: u64,
    writable: bool,
    residency: ResidencyMode,
    pinned: bool,
}

impl std::fmt::Debug for MappedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedFile")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("writable", &self.writable)
            .field("residency", &self.residency)
            .field("pinned", &self.pinned)
            .field("open", &self.is_open())
            .finish()
    }
}

impl MappedFile {
    /// Open `path` and map it.
    ///
    /// With `writing`, the file is opened read-write (created if absent) and
    /// stretched to at least `size` bytes. Without it, the file must exist,
    /// is mapped read-only and `size` is ignored: the mapping covers the
    /// file's current length.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::InvalidSize` if `writing` and `size` is zero or too large.
    /// Returns `MmapFileError::Open` if the file cannot be opened or created.
    /// Returns `MmapFileError::Extend` if the file cannot be grown to `size`.
    /// Returns `MmapFileError::MapCreate` if the mapping object cannot be created.
    /// Returns `MmapFileError::MapView` if the view cannot be mapped.
    /// Returns `MmapFileError::Residency` if, in advised mode, both the hint and the pin fail.
    pub fn open<P: AsRef<Path>>(path: P, size: u64, writing: bool, mode: ResidencyMode) -> Result<Self> {
        MappedFileOptions::new(path)
            .size(size)
            .write(writing)
            .residency(mode)
            .open()
    }

    /// Start building a mapping with non-default options.
    pub fn options<P: AsRef<Path>>(path: P) -> MappedFileOptions {
        MappedFileOptions::new(path)
    }

    /// Open (or create) `path` read-write with at least `size` bytes.
    ///
    /// # Errors
    ///
    /// See [`MappedFile::open`].
    pub fn create_rw<P: AsRef<Path>>(path: P, size: u64) -> Result<Self> {
        Self::open(path, size, true, ResidencyMode::Quick)
    }

    /// Open an existing file and map it read-only.
    ///
    /// # Errors
    ///
    /// See [`MappedFile::open`].
    pub fn open_ro<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, 0, false, ResidencyMode::Quick)
    }

    pub(crate) fn from_options(opts: &MappedFileOptions) -> Result<Self> {
        Self::open_with(
            opts,
            |view, pattern| view.advise(0, view.len(), pattern),
            View::lock,
        )
    }

    /// Staged construction; `hint` and `pin` run only in advised mode.
    fn open_with<H, P>(opts: &MappedFileOptions, hint: H, pin: P) -> Result<Self>
    where
        H: FnOnce(&View, AccessPattern) -> io::Result<()>,
        P: FnOnce(&View) -> io::Result<()>,
    {
        let path = opts.path();
        let writing = opts.is_write();
        let requested = opts.requested_size();
        if writing {
            validate_size(requested)?;
        }

        trace!("opening {}", path.display());
        let mut file = sys::open_file(path, writing).map_err(|source| MmapFileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let len = size_file(&mut file, path, writing, requested)?;
        trace!("sized {} at {len} bytes", path.display());

        let map_create = |source| MmapFileError::MapCreate {
            path: path.to_path_buf(),
            source,
        };
        let map_len = view_len(len).map_err(map_create)?;
        let mapping = sys::create_mapping(&file, map_len, writing).map_err(map_create)?;
        let view = sys::map_view(&file, &mapping).map_err(|source| MmapFileError::MapView {
            path: path.to_path_buf(),
            source,
        })?;
        trace!("mapped {} ({map_len} bytes)", path.display());

        let pinned = match opts.residency_mode() {
            ResidencyMode::Quick => false,
            ResidencyMode::Advised => {
                let pattern = opts.pattern();
                let outcome = request_residency(|| hint(&view, pattern), || pin(&view))
                    .map_err(|(hint, pin)| MmapFileError::Residency {
                        path: path.to_path_buf(),
                        hint,
                        pin,
                    })?;
                trace!("advised {} ({outcome:?})", path.display());
                outcome == Residency::Pinned
            }
        };

        debug!(
            "mapped {} ({len} bytes, {}, {:?})",
            path.display(),
            if writing { "read-write" } else { "read-only" },
            opts.residency_mode()
        );
        Ok(Self {
            view: Some(view),
            mapping: Some(mapping),
            file: Some(file),
            path: path.to_path_buf(),
            len,
            writable: writing,
            residency: opts.residency_mode(),
            pinned,
        })
    }

    /// Whether the mapped view is live.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.view.is_some()
    }

    /// Length of the mapping in bytes. Fixed at construction, and still
    /// reported after [`MappedFile::close`].
    #[must_use]
    pub fn size(&self) -> u64 {
        self.len
    }

    /// Alias of [`MappedFile::size`].
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the mapping is zero bytes long. A successfully opened mapping never is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the mapping was opened read-write.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Residency mode requested at construction.
    #[must_use]
    pub fn residency(&self) -> ResidencyMode {
        self.residency
    }

    /// Whether the mapped range is currently pinned in physical memory.
    /// Only an advised mapping whose access hint was refused gets pinned.
    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base address of the mapped range, or null once closed.
    ///
    /// Valid for [`MappedFile::size`] bytes while `self` is open. Anything
    /// beyond that is the caller's responsibility.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.view.as_ref().map_or(ptr::null(), |v| v.as_ptr().cast_const())
    }

    /// Mutable base address of the mapped range, or null once closed.
    ///
    /// Writing through this pointer on a read-only mapping faults.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.view.as_ref().map_or(ptr::null_mut(), View::as_ptr)
    }

    /// The whole mapped range as a byte slice.
    ///
    /// Other processes mapping the same file may change these bytes at any
    /// time; this type provides no synchronisation with them.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    pub fn as_slice(&self) -> Result<&[u8]> {
        let view = self.view()?;
        // SAFETY: the view is live for the borrow of self and spans view.len() bytes.
        Ok(unsafe { std::slice::from_raw_parts(view.as_ptr(), view.len()) })
    }

    /// The whole mapped range as a mutable byte slice.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::InvalidMode` for read-only mappings.
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        if !self.writable {
            return Err(MmapFileError::InvalidMode("mutable access on read-only mapping"));
        }
        let view = self.view()?;
        // SAFETY: the view is live and writable, and &mut self makes this the only borrow.
        Ok(unsafe { std::slice::from_raw_parts_mut(view.as_ptr(), view.len()) })
    }

    /// Read bytes from the mapping into the provided buffer starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    /// Returns `MmapFileError::OutOfBounds` if range exceeds file bounds.
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let (start, end) = slice_range(offset, buf.len() as u64, self.len)?;
        buf.copy_from_slice(&self.as_slice()?[start..end]);
        Ok(())
    }

    /// Copy the provided bytes into the mapped file at the given offset.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::InvalidMode` for read-only mappings.
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    /// Returns `MmapFileError::OutOfBounds` if range exceeds file bounds.
    pub fn update_region(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let (start, end) = slice_range(offset, data.len() as u64, self.len)?;
        self.as_mut_slice()?[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Flush changes to disk. For read-only mappings, this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    /// Returns `MmapFileError::FlushFailed` if flush operation fails.
    pub fn flush(&self) -> Result<()> {
        self.flush_range(0, self.len)
    }

    /// Flush a specific byte range to disk.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::Closed` if the mapping was torn down.
    /// Returns `MmapFileError::OutOfBounds` if range exceeds file bounds.
    /// Returns `MmapFileError::FlushFailed` if flush operation fails.
    pub fn flush_range(&self, offset: u64, len: u64) -> Result<()> {
        let view = self.view()?;
        let (start, end) = slice_range(offset, len, self.len)?;
        if !self.writable || start == end {
            return Ok(());
        }
        let file = self.file.as_ref().ok_or(MmapFileError::Closed)?;
        view.flush(file, start, end - start)
            .map_err(MmapFileError::FlushFailed)
    }

    /// Tear the mapping down: unpin, unmap, close the mapping object, close
    /// the file. Calling it again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `MmapFileError::Unlock` if pinned pages cannot be released. In
    /// that case nothing is released and the mapping stays open, so the call
    /// can be retried; dropping the value releases everything regardless.
    pub fn close(&mut self) -> Result<()> {
        if self.pinned {
            if let Some(view) = &self.view {
                view.unlock().map_err(|source| MmapFileError::Unlock { source })?;
            }
            self.pinned = false;
        }
        self.release();
        Ok(())
    }

    pub(crate) fn view(&self) -> Result<&View> {
        self.view.as_ref().ok_or(MmapFileError::Closed)
    }

    fn release(&mut self) {
        let was_open = self.view.is_some();
        drop(self.view.take());
        drop(self.mapping.take());
        drop(self.file.take());
        if was_open {
            debug!("released mapping of {}", self.path.display());
        }
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            // Unmapping drops the pin along with the pages.
            error!("{e}; unmapping {} while pinned", self.path.display());
            self.pinned = false;
            self.release();
        }
    }
}

fn validate_size(size: u64) -> Result<()> {
    if size == 0 {
        return Err(MmapFileError::InvalidSize { size, reason: ERR_ZERO_SIZE });
    }
    if size > MAX_MAP_LEN {
        return Err(MmapFileError::InvalidSize { size, reason: ERR_TOO_LARGE });
    }
    Ok(())
}

/// Current on-disk length, after stretching to `requested` in write mode.
fn size_file(file: &mut File, path: &Path, writing: bool, requested: u64) -> Result<u64> {
    let current = file
        .metadata()
        .map_err(|source| MmapFileError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if !writing || current >= requested {
        return Ok(current);
    }

    let extend = |source| MmapFileError::Extend {
        path: path.to_path_buf(),
        size: requested,
        source,
    };
    // Sparse stretch: only the final byte is written.
    file.seek(SeekFrom::Start(requested - 1)).map_err(extend)?;
    file.write_all(&[0]).map_err(extend)?;
    Ok(file.metadata().map_err(extend)?.len())
}

fn view_len(len: u64) -> io::Result<usize> {
    if len == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, ERR_ZERO_LENGTH_FILE));
    }
    if len > MAX_MAP_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, ERR_TOO_LARGE));
    }
    usize::try_from(len).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, ERR_TOO_LARGE))
}
