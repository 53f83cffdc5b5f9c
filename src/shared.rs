//! Cloneable, lock-protected handle to a [`MappedFile`].

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::errors::Result;
use crate::mmap::MappedFile;

/// A [`MappedFile`] that several threads can hold.
///
/// Cloning is cheap; it clones an Arc to the inner state. Reads share a
/// read lock and writes take the write lock, which orders access through
/// this handle only. Other mappings of the same file, in this process or
/// another, are not synchronised with it.
///
/// The mapping is released when the last clone drops, or earlier through
/// [`SharedMappedFile::close`].
#[derive(Clone, Debug)]
pub struct SharedMappedFile {
    inner: Arc<RwLock<MappedFile>>,
}

impl SharedMappedFile {
    /// Wrap an open mapping.
    #[must_use]
    pub fn new(file: MappedFile) -> Self {
        Self {
            inner: Arc::new(RwLock::new(file)),
        }
    }

    /// Shared access to the mapping.
    pub fn read(&self) -> RwLockReadGuard<'_, MappedFile> {
        self.inner.read()
    }

    /// Exclusive access to the mapping.
    pub fn write(&self) -> RwLockWriteGuard<'_, MappedFile> {
        self.inner.write()
    }

    /// See [`MappedFile::is_open`].
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.read().is_open()
    }

    /// See [`MappedFile::size`].
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.read().size()
    }

    /// See [`MappedFile::read_into`].
    ///
    /// # Errors
    ///
    /// Returns errors from `MappedFile::read_into`.
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.inner.read().read_into(offset, buf)
    }

    /// See [`MappedFile::update_region`].
    ///
    /// # Errors
    ///
    /// Returns errors from `MappedFile::update_region`.
    pub fn update_region(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.inner.write().update_region(offset, data)
    }

    /// See [`MappedFile::flush`].
    ///
    /// # Errors
    ///
    /// Returns errors from `MappedFile::flush`.
    pub fn flush(&self) -> Result<()> {
        self.inner.read().flush()
    }

    /// Close the mapping for every clone of this handle.
    ///
    /// # Errors
    ///
    /// Returns errors from `MappedFile::close`.
    pub fn close(&self) -> Result<()> {
        self.inner.write().close()
    }

    /// Take the mapping back if this is the only handle left.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when other clones are still alive.
    pub fn try_unwrap(self) -> std::result::Result<MappedFile, Self> {
        Arc::try_unwrap(self.inner)
            .map(|lock| lock.into_inner())
            .map_err(|inner| Self { inner })
    }
}

impl From<MappedFile> for SharedMappedFile {
    fn from(file: MappedFile) -> Self {
        Self::new(file)
    }
}
