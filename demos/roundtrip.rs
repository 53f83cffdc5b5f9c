//! Map a small log file, write a greeting, and map it again to read it back.
//!
//! Run with `cargo run --example roundtrip -- [--advised] [path]` (defaults to
//! `mmap.log` in quick mode). Set `RUST_LOG=debug` to see the mapping lifecycle.

use anyhow::Context;
use mmap_file::{MappedFile, ResidencyMode};

const SIZE: u64 = 1024;
const GREETING: &[u8] = b"hello world!!!!";

fn describe(label: &str, mmap: &MappedFile) -> anyhow::Result<()> {
    let bytes = mmap.as_slice()?;
    let text_end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    println!("{label}: is_open()={} size()={}", mmap.is_open(), mmap.size());
    println!("{label}: data()={:?}", String::from_utf8_lossy(&bytes[..text_end]));
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut mode = ResidencyMode::Quick;
    let mut path = "mmap.log".to_string();
    for arg in std::env::args().skip(1) {
        if arg == "--advised" {
            mode = ResidencyMode::Advised;
        } else {
            path = arg;
        }
    }
    println!("path: {path} ({mode:?})");

    let mut first = MappedFile::open(&path, SIZE, true, mode)
        .with_context(|| format!("mapping {path}"))?;
    describe("first", &first)?;

    first.update_region(0, GREETING)?;
    first.flush()?;

    println!("open path again: {path}");
    let second = MappedFile::open(&path, SIZE, true, mode)
        .with_context(|| format!("re-mapping {path}"))?;
    describe("second", &second)?;

    first.close().context("closing first mapping")?;
    Ok(())
}
