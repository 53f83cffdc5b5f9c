//! # mmap-file: leak-free memory-mapped file regions
//!
//! A [`MappedFile`] owns the three OS objects behind a file mapping (the file
//! handle, the mapping object and the mapped view) as one value. They are
//! acquired in order when it opens and released in reverse order when it
//! closes or drops. If construction fails part way, whatever was already
//! acquired is released before the error is returned.
//!
//! ## Features
//!
//! - **One lifecycle, two OS models**: descriptor-based `mmap` on Unix,
//!   handle-based `CreateFileMappingW`/`MapViewOfFile` on Windows
//! - **Sparse stretch**: write-mode opens grow the file by writing its last byte
//! - **Residency hints**: optional access-pattern advice, with page pinning as
//!   the fallback when the OS refuses the hint
//! - **Typed errors**: every failure is a [`MmapFileError`]; nothing exits the process
//!
//! ## Quick Start
//!
//! ```no_run
//! use mmap_file::{MappedFile, ResidencyMode};
//!
//! // Map 1KB, creating the file if needed
//! let mut mmap = MappedFile::open("data.bin", 1024, true, ResidencyMode::Quick)?;
//!
//! // Write data at offset 100
//! mmap.update_region(100, b"Hello, mmap!")?;
//!
//! // Ensure data is persisted
//! mmap.flush()?;
//! # Ok::<(), mmap_file::MmapFileError>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: Error types for all mapping operations
//! - [`utils`]: Utility functions for alignment and bounds checking
//! - [`mmap`]: Core `MappedFile` implementation
//! - [`options`]: Construction options and residency modes
//! - [`advise`]: Access-pattern hints
//! - [`shared`]: Lock-protected handle for multi-threaded callers
//! - [`manager`]: High-level convenience functions
//!
//! ## Feature Flags
//!
//! - `advise` (default): sub-range access hints via [`MappedFile::advise`]
//! - `async`: Tokio helpers that open mappings on the blocking pool

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

mod sys;

pub mod advise;
pub mod errors;
pub mod manager;
pub mod mmap;
pub mod options;
pub mod shared;
pub mod utils;

pub use advise::AccessPattern;
pub use errors::MmapFileError;
pub use manager::{create_mapped, load_mapped, read_mapped, write_mapped};
pub use mmap::MappedFile;
pub use options::{MappedFileOptions, ResidencyMode};
pub use shared::SharedMappedFile;
