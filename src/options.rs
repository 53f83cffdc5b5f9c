//! Construction options for [`MappedFile`].

use std::path::{Path, PathBuf};

use crate::advise::AccessPattern;
use crate::errors::Result;
use crate::mmap::MappedFile;

/// How much effort to spend on page residency when mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidencyMode {
    /// Map and return; no hints.
    #[default]
    Quick,
    /// Hint the configured [`AccessPattern`] for the whole range; if the OS
    /// refuses the hint, pin the range in physical memory instead.
    Advised,
}

/// Builder for opening a [`MappedFile`].
///
/// # Examples
///
/// ```no_run
/// use mmap_file::{AccessPattern, MappedFile, ResidencyMode};
///
/// let mmap = MappedFile::options("data.bin")
///     .size(64 * 1024)
///     .write(true)
///     .residency(ResidencyMode::Advised)
///     .access_pattern(AccessPattern::Sequential)
///     .open()?;
/// assert!(mmap.size() >= 64 * 1024);
/// # Ok::<(), mmap_file::MmapFileError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MappedFileOptions {
    path: PathBuf,
    size: u64,
    write: bool,
    residency: ResidencyMode,
    pattern: AccessPattern,
}

impl MappedFileOptions {
    /// Start from the defaults: read-only, size 0, [`ResidencyMode::Quick`],
    /// [`AccessPattern::Random`].
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            size: 0,
            write: false,
            residency: ResidencyMode::default(),
            pattern: AccessPattern::default(),
        }
    }

    /// Minimum length of the file in write mode. Ignored for read-only maps,
    /// which always cover the file's current length.
    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Open read-write, creating the file if it does not exist.
    #[must_use]
    pub fn write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// Residency behaviour after mapping.
    #[must_use]
    pub fn residency(mut self, mode: ResidencyMode) -> Self {
        self.residency = mode;
        self
    }

    /// Pattern hinted in [`ResidencyMode::Advised`].
    #[must_use]
    pub fn access_pattern(mut self, pattern: AccessPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Open and map the file.
    ///
    /// # Errors
    ///
    /// See [`MappedFile::open`].
    pub fn open(&self) -> Result<MappedFile> {
        MappedFile::from_options(self)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn requested_size(&self) -> u64 {
        self.size
    }

    pub(crate) fn is_write(&self) -> bool {
        self.write
    }

    pub(crate) fn residency_mode(&self) -> ResidencyMode {
        self.residency
    }

    pub(crate) fn pattern(&self) -> AccessPattern {
        self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = MappedFileOptions::new("x.bin");
        assert_eq!(opts.path(), Path::new("x.bin"));
        assert_eq!(opts.requested_size(), 0);
        assert!(!opts.is_write());
        assert_eq!(opts.residency_mode(), ResidencyMode::Quick);
        assert_eq!(opts.pattern(), AccessPattern::Random);
    }

    #[test]
    fn setters_chain() {
        let opts = MappedFileOptions::new("y.bin")
            .size(512)
            .write(true)
            .residency(ResidencyMode::Advised)
            .access_pattern(AccessPattern::WillNeed);
        assert_eq!(opts.requested_size(), 512);
        assert!(opts.is_write());
        assert_eq!(opts.residency_mode(), ResidencyMode::Advised);
        assert_eq!(opts.pattern(), AccessPattern::WillNeed);
    }
}
