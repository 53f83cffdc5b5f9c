//! Utility helpers for page size, alignment, and safe range calculations.

use crate::errors::{MmapFileError, Result};

/// Get the system page size in bytes.
#[must_use]
pub fn page_size() -> usize {
    crate::sys::page_size()
}

/// Align a value down to the nearest multiple of `alignment`.
#[must_use]
pub fn align_down(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return value;
    }
    // Fast path for power-of-2 alignments (common case for page sizes)
    if alignment.is_power_of_two() {
        value & !(alignment - 1)
    } else {
        value - value % alignment
    }
}

/// Ensure the requested [offset, offset+len) range is within [0, total).
/// Returns `Ok(())` if valid; otherwise an `OutOfBounds` error.
///
/// # Errors
///
/// Returns `MmapFileError::OutOfBounds` if the range exceeds bounds.
pub fn ensure_in_bounds(offset: u64, len: u64, total: u64) -> Result<()> {
    if offset > total {
        return Err(MmapFileError::OutOfBounds { offset, len, total });
    }
    let end = offset.saturating_add(len);
    if end > total {
        return Err(MmapFileError::OutOfBounds { offset, len, total });
    }
    Ok(())
}

/// Compute a safe byte slice range for a given total length, returning start..end as usize tuple.
///
/// # Errors
///
/// Returns `MmapFileError::OutOfBounds` if the requested range exceeds the total length.
#[allow(clippy::cast_possible_truncation)]
pub fn slice_range(offset: u64, len: u64, total: u64) -> Result<(usize, usize)> {
    ensure_in_bounds(offset, len, total)?;
    // total is the length of a live mapping, so it fits in usize
    let start = offset as usize;
    let end = (offset + len) as usize;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_down_powers_and_odd() {
        assert_eq!(align_down(0, 4096), 0);
        assert_eq!(align_down(4095, 4096), 0);
        assert_eq!(align_down(4096, 4096), 4096);
        assert_eq!(align_down(10_000, 4096), 8192);
        assert_eq!(align_down(10, 3), 9);
        assert_eq!(align_down(10, 0), 10);
    }

    #[test]
    fn bounds_checks() {
        assert!(ensure_in_bounds(0, 10, 10).is_ok());
        assert!(ensure_in_bounds(10, 0, 10).is_ok());
        assert!(ensure_in_bounds(11, 0, 10).is_err());
        assert!(ensure_in_bounds(5, 6, 10).is_err());
        assert!(ensure_in_bounds(1, u64::MAX, 10).is_err());
        assert_eq!(slice_range(2, 3, 10).expect("range"), (2, 5));
    }
}
