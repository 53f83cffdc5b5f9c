#![cfg(feature = "async")]
//! Async open helpers run construction on the blocking pool.

use mmap_file::manager::r#async::{create_mapped_async, load_mapped_async, open_async};
use mmap_file::{MappedFile, MmapFileError, ResidencyMode};
use std::fs;
use std::path::PathBuf;

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "mmap_file_async_test_{}_{}",
        name,
        std::process::id()
    ));
    p
}

#[tokio::test(flavor = "multi_thread")]
async fn async_create_write_load() {
    let path = tmp_path("async_create_write_load");
    let _ = fs::remove_file(&path);

    let mut mmap = create_mapped_async(&path, 4096).await.expect("create async");
    assert_eq!(mmap.size(), 4096);
    mmap.update_region(128, b"ASYNC-OPEN").expect("write");
    mmap.flush().expect("flush");
    drop(mmap);

    let ro = load_mapped_async(&path).await.expect("load async");
    let mut buf = [0u8; 10];
    ro.read_into(128, &mut buf).expect("read");
    assert_eq!(&buf, b"ASYNC-OPEN");

    drop(ro);
    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn async_open_reports_construction_errors() {
    let path = tmp_path("async_open_reports_construction_errors");
    let _ = fs::remove_file(&path);

    let opts = MappedFile::options(&path).residency(ResidencyMode::Advised);
    let err = open_async(opts).await.expect_err("missing file");
    assert!(matches!(err, MmapFileError::Open { .. }));
}
