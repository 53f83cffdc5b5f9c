//! Platform parity tests for visibility across mappings.
//!
//! Contract: bytes written through one mapping are seen by a second mapping
//! of the same file, and after flush() or flush_range() by plain file reads
//! and by an independent mapping implementation.

use mmap_file::{AccessPattern, MappedFile, ResidencyMode};
use std::fs;
use std::path::PathBuf;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "mmap_file_platform_parity_{}_{}",
        name,
        std::process::id()
    ));
    p
}

#[test]
fn parity_live_mappings_share_bytes() {
    let path = tmp_path("parity_live_mappings_share_bytes");
    let _ = fs::remove_file(&path);

    let mut writer = MappedFile::create_rw(&path, 4096).expect("create_rw");
    let reader = MappedFile::open_ro(&path).expect("open_ro");
    assert_eq!(reader.size(), 4096);

    writer.update_region(0, b"ABCDEFGHIJ").expect("write");
    // Shared mappings of one file see each other without a flush.
    assert_eq!(&reader.as_slice().expect("slice")[..10], b"ABCDEFGHIJ");

    drop(reader);
    drop(writer);
    let _ = fs::remove_file(&path);
}

#[test]
fn parity_flush_visibility_full_file() {
    let path = tmp_path("parity_flush_visibility_full_file");
    let _ = fs::remove_file(&path);

    let mut mmap = MappedFile::create_rw(&path, 4096).expect("create_rw");
    mmap.update_region(0, b"ABCDEFGHIJ").expect("write-1");
    mmap.update_region(100, b"klmnop").expect("write-2");
    mmap.flush().expect("flush");

    let bytes = fs::read(&path).expect("read file");
    assert_eq!(&bytes[0..10], b"ABCDEFGHIJ");
    assert_eq!(&bytes[100..106], b"klmnop");

    drop(mmap);
    let _ = fs::remove_file(&path);
}

#[test]
fn parity_flush_visibility_range() {
    let path = tmp_path("parity_flush_visibility_range");
    let _ = fs::remove_file(&path);

    let mut mmap = MappedFile::create_rw(&path, 8192).expect("create_rw");
    mmap.update_region(10, b"XXXXYYYYZZZZ").expect("write-xyz");
    mmap.update_region(5000, b"RANGE-ONLY").expect("write-range");

    // Unaligned start inside the second page.
    mmap.flush_range(5000, "RANGE-ONLY".len() as u64)
        .expect("flush_range");
    let bytes = fs::read(&path).expect("read file");
    assert_eq!(&bytes[5000..5010], b"RANGE-ONLY");

    mmap.flush().expect("flush all");
    let bytes = fs::read(&path).expect("read file again");
    assert_eq!(&bytes[10..22], b"XXXXYYYYZZZZ");

    drop(mmap);
    let _ = fs::remove_file(&path);
}

#[test]
fn parity_independent_mapping_sees_writes() {
    let path = tmp_path("parity_independent_mapping_sees_writes");
    let _ = fs::remove_file(&path);

    let mut mmap = MappedFile::options(&path)
        .size(2048)
        .write(true)
        .residency(ResidencyMode::Advised)
        .access_pattern(AccessPattern::Sequential)
        .open()
        .expect("open");
    mmap.update_region(2040, b"lastbyte").expect("write tail");
    mmap.flush().expect("flush");

    let file = fs::File::open(&path).expect("open file");
    // SAFETY: the file is not truncated while this map is alive.
    let other = unsafe { memmap2::Mmap::map(&file).expect("memmap2 map") };
    assert_eq!(other.len(), 2048);
    assert_eq!(&other[2040..], b"lastbyte");

    drop(other);
    drop(file);
    drop(mmap);
    let _ = fs::remove_file(&path);
}
