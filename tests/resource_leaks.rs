//! Failure unwinding and teardown must not leak descriptors.
//!
//! Kept to a single test so no other test in this binary opens files
//! while descriptors are being counted.
#![cfg(target_os = "linux")]

use mmap_file::{MappedFile, MmapFileError, ResidencyMode};
use std::fs;
use std::path::{Path, PathBuf};

fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_file_leak_test_{}_{}", name, std::process::id()));
    p
}

fn open_fds() -> usize {
    fs::read_dir("/proc/self/fd").expect("list fds").count()
}

#[test]
fn no_descriptor_leaks_on_any_path() {
    let missing = tmp_path("missing");
    let empty = tmp_path("empty");
    let good = tmp_path("good");
    let _ = fs::remove_file(&missing);
    let _ = fs::remove_file(&good);
    fs::write(&empty, b"").expect("seed empty");

    let baseline = open_fds();

    // Fails at open: nothing acquired.
    let err = MappedFile::open(&missing, 1024, false, ResidencyMode::Quick).expect_err("missing");
    assert!(matches!(err, MmapFileError::Open { .. }));
    assert_eq!(open_fds(), baseline, "open failure leaked");

    // Fails at mapping creation: the file handle must be closed again.
    let err = MappedFile::open(&empty, 1024, false, ResidencyMode::Quick).expect_err("empty");
    assert!(matches!(err, MmapFileError::MapCreate { .. }));
    assert_eq!(open_fds(), baseline, "map-create failure leaked");

    // Fails while stretching: /dev/full accepts the seek but not the write.
    let dev_full = Path::new("/dev/full");
    if fs::OpenOptions::new().write(true).open(dev_full).is_ok() {
        let err = MappedFile::open(dev_full, 4096, true, ResidencyMode::Quick)
            .expect_err("dev/full");
        assert!(matches!(err, MmapFileError::Extend { size: 4096, .. }), "{err:?}");
        assert_eq!(open_fds(), baseline, "extend failure leaked");
    }

    // Success, then implicit and explicit teardown.
    {
        let mmap = MappedFile::open(&good, 4096, true, ResidencyMode::Advised).expect("open");
        assert!(mmap.is_open());
        assert_eq!(open_fds(), baseline + 1);
    }
    assert_eq!(open_fds(), baseline, "drop leaked");

    let mut mmap = MappedFile::open(&good, 4096, true, ResidencyMode::Quick).expect("reopen");
    mmap.close().expect("close");
    assert_eq!(open_fds(), baseline, "close leaked");
    mmap.close().expect("close again");
    drop(mmap);
    assert_eq!(open_fds(), baseline, "double teardown misbehaved");

    let _ = fs::remove_file(&empty);
    let _ = fs::remove_file(&good);
}
