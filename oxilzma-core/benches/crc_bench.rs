//! CRC-32 benchmarks: throughput by size and pattern, incremental updates,
//! and the slicing-by-8 threshold.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxilzma_core::crc::{Crc32, crc32};
use std::hint::black_box;

type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    pub fn zeros(size: usize) -> Vec<u8> {
        vec![0; size]
    }

    /// LCG output, reproducible across runs.
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. ";
        text.iter().copied().cycle().take(size).collect()
    }
}

mod data_sizes {
    pub const TINY: usize = 16;
    pub const SMALL: usize = 256;
    pub const MEDIUM: usize = 4 * 1024;
    pub const LARGE: usize = 64 * 1024;
    pub const XLARGE: usize = 1024 * 1024;
}

fn bench_crc32_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_sizes");

    let sizes = [
        ("16B", data_sizes::TINY),
        ("256B", data_sizes::SMALL),
        ("4KB", data_sizes::MEDIUM),
        ("64KB", data_sizes::LARGE),
        ("1MB", data_sizes::XLARGE),
    ];

    for (size_name, size) in sizes {
        let data = test_data::text_like(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size_name), &data, |b, data| {
            b.iter(|| black_box(Crc32::compute(black_box(data))));
        });
    }

    group.finish();
}

fn bench_crc32_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_patterns");

    let patterns: [(&str, PatternGenerator); 3] = [
        ("zeros", test_data::zeros),
        ("random", test_data::random),
        ("text", test_data::text_like),
    ];

    let size = data_sizes::LARGE;

    for (pattern_name, generator) in patterns {
        let data = generator(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(pattern_name),
            &data,
            |b, data| {
                b.iter(|| black_box(Crc32::compute(black_box(data))));
            },
        );
    }

    group.finish();
}

fn bench_crc32_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32_incremental");

    let size = data_sizes::LARGE;
    let data = test_data::text_like(size);
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_with_input(BenchmarkId::from_parameter("byte_at_a_time"), &data, |b, data| {
        b.iter(|| {
            let mut crc = Crc32::new();
            for &byte in data.iter() {
                crc.update_byte(byte);
            }
            black_box(crc.finalize())
        });
    });

    for chunk_size in [256, 4096, 16384] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunks_{}", chunk_size)),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut crc = Crc32::new();
                    for chunk in data.chunks(chunk_size) {
                        crc.update(black_box(chunk));
                    }
                    black_box(crc.finalize())
                });
            },
        );
    }

    group.bench_with_input(BenchmarkId::from_parameter("offset_range"), &data, |b, data| {
        b.iter(|| black_box(crc32(black_box(data), 17, data.len() - 17)));
    });

    group.finish();
}

fn bench_slicing_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("slicing_threshold");

    for size in [8, 12, 16, 20, 32, 64, 128] {
        let data = test_data::text_like(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("crc32", size), &data, |b, data| {
            b.iter(|| black_box(Crc32::compute(black_box(data))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_crc32_sizes,
    bench_crc32_patterns,
    bench_crc32_incremental,
    bench_slicing_threshold,
);
criterion_main!(benches);
