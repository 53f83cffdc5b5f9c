use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use mmap_file::{MappedFile, ResidencyMode};
use std::fs;
use std::path::PathBuf;

// Simple helper to build a unique temp path per bench
fn tmp_path(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("mmap_file_bench_{}_{}", name, std::process::id()));
    p
}

fn bench_open_modes(b: &mut Criterion) {
    let mut group = b.benchmark_group("open");
    for &size in &[4_usize * 1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        for (label, mode) in [("quick", ResidencyMode::Quick), ("advised", ResidencyMode::Advised)] {
            group.bench_with_input(BenchmarkId::new(label, size), &size, |ben, &sz| {
                let path = tmp_path(&format!("open_{label}_{sz}"));
                let _ = fs::remove_file(&path);
                ben.iter(|| {
                    let m = MappedFile::open(&path, sz as u64, true, mode).expect("open");
                    criterion::black_box(m.size());
                });
                let _ = fs::remove_file(&path);
            });
        }
    }
    group.finish();
}

fn bench_create_fresh(b: &mut Criterion) {
    let mut group = b.benchmark_group("create_fresh");
    for &size in &[4_usize * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |ben, &sz| {
            ben.iter_batched(
                || {
                    let path = tmp_path(&format!("create_fresh_{}", sz));
                    let _ = fs::remove_file(&path);
                    path
                },
                |path| {
                    let m = MappedFile::create_rw(&path, sz as u64).expect("create_rw");
                    drop(m);
                    let _ = fs::remove_file(&path);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_update_region_flush(b: &mut Criterion) {
    let mut group = b.benchmark_group("update_region_flush");
    for &size in &[4_usize * 1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("update_only", size), &size, |ben, &sz| {
            let path = tmp_path(&format!("update_only_{}", sz));
            let _ = fs::remove_file(&path);
            let mut mmap = MappedFile::create_rw(&path, sz as u64).expect("create_rw");

            let payload = vec![0xAB_u8; sz];
            ben.iter(|| {
                mmap.update_region(0, &payload).expect("update");
                criterion::black_box(&payload);
            });

            drop(mmap);
            let _ = fs::remove_file(&path);
        });

        group.bench_with_input(
            BenchmarkId::new("update_plus_flush", size),
            &size,
            |ben, &sz| {
                let path = tmp_path(&format!("update_flush_{}", sz));
                let _ = fs::remove_file(&path);
                let mut mmap = MappedFile::create_rw(&path, sz as u64).expect("create_rw");

                let payload = vec![0xAC_u8; sz];
                ben.iter(|| {
                    mmap.update_region(0, &payload).expect("update");
                    mmap.flush().expect("flush");
                });

                drop(mmap);
                let _ = fs::remove_file(&path);
            },
        );
    }
    group.finish();
}

fn bench_read_slice(b: &mut Criterion) {
    let mut group = b.benchmark_group("read_slice");
    for &size in &[4_usize * 1024, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |ben, &sz| {
            let path = tmp_path(&format!("read_slice_{}", sz));
            let _ = fs::remove_file(&path);
            {
                let mut mmap = MappedFile::create_rw(&path, sz as u64).expect("create_rw");
                mmap.update_region(0, &vec![2u8; sz]).expect("seed");
                mmap.flush().expect("flush");
            }
            let ro = MappedFile::open_ro(&path).expect("open_ro");

            ben.iter(|| {
                let sum: u64 = ro.as_slice().expect("slice").iter().map(|&b| u64::from(b)).sum();
                criterion::black_box(sum);
            });

            drop(ro);
            let _ = fs::remove_file(&path);
        });
    }
    group.finish();
}

fn criterion_config() -> Criterion {
    Criterion::default()
        .sample_size(30)
        .warm_up_time(std::time::Duration::from_millis(300))
        .measurement_time(std::time::Duration::from_secs(3))
}

criterion_group! {
    name = mmap_benches;
    config = criterion_config();
    targets =
        bench_open_modes,
        bench_create_fresh,
        bench_update_region_flush,
        bench_read_slice
}

criterion_main!(mmap_benches);
