//! Performance benchmarks for oxilzma-codec
//!
//! Covers:
//! - Compression speed per level and per match strategy
//! - Decompression speed across data patterns
//! - Decoder reuse versus a fresh decoder per stream
//! - Compression against a trained dictionary

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxilzma_codec::{
    EncoderConfig, LzmaDecoder, LzmaEncoder, LzmaLevel, MatchStrategy, compress, decompress,
};
use std::hint::black_box;
use std::io::Cursor;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<u8>;

mod test_data {
    /// Uniform data - all bytes are the same
    pub fn uniform(size: usize) -> Vec<u8> {
        vec![0xAA; size]
    }

    /// Random data - no patterns
    pub fn random(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut seed: u64 = 0x123456789ABCDEF0;
        for _ in 0..size {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            data.push((seed >> 32) as u8);
        }
        data
    }

    /// Text-like data
    pub fn text_like(size: usize) -> Vec<u8> {
        let text = b"The quick brown fox jumps over the lazy dog. \
                     Pack my box with five dozen liquor jugs. \
                     How vexingly quick daft zebras jump! \
                     Lorem ipsum dolor sit amet, consectetur adipiscing elit. ";
        text.iter().copied().cycle().take(size).collect()
    }

    /// Records sharing a layout with varying fields
    pub fn records(size: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(size);
        let mut id = 0u32;
        while data.len() < size {
            data.extend_from_slice(format!("{{\"id\":{id},\"score\":{}}}\n", id * 37 % 1000).as_bytes());
            id += 1;
        }
        data.truncate(size);
        data
    }
}

const SIZE: usize = 100 * 1024;

fn config(level: LzmaLevel) -> EncoderConfig {
    EncoderConfig::from_level(level).with_dictionary_size(1 << 20)
}

fn bench_compression_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("compression_levels");
    let data = test_data::text_like(SIZE);

    for level in [0, 1, 3, 6, 9] {
        let config = config(LzmaLevel::new(level));
        group.throughput(Throughput::Bytes(SIZE as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("level_{level}")),
            &data,
            |b, data| {
                b.iter(|| black_box(compress(&config, black_box(data)).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");
    let data = test_data::records(SIZE);

    for strategy in [MatchStrategy::Literal, MatchStrategy::Greedy, MatchStrategy::Lazy] {
        let config = config(LzmaLevel::DEFAULT).with_strategy(strategy);
        group.throughput(Throughput::Bytes(SIZE as u64));
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &data, |b, data| {
            b.iter(|| black_box(compress(&config, black_box(data)).unwrap()));
        });
    }

    group.finish();
}

fn bench_decompression(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompression");

    let patterns: [(&str, PatternGenerator); 4] = [
        ("uniform", test_data::uniform),
        ("random", test_data::random),
        ("text", test_data::text_like),
        ("records", test_data::records),
    ];

    let config = config(LzmaLevel::DEFAULT);
    for (name, generator) in patterns {
        let original = generator(SIZE);
        let compressed = compress(&config, &original).unwrap();

        group.throughput(Throughput::Bytes(SIZE as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &compressed, |b, compressed| {
            b.iter(|| {
                black_box(
                    decompress(&config.properties, black_box(compressed), Some(SIZE as u64))
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_decoder_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder_reuse");

    let config = config(LzmaLevel::new(3));
    let chunks: Vec<Vec<u8>> = (0..16)
        .map(|i| test_data::records(4096 + i * 128))
        .collect();
    let streams: Vec<Vec<u8>> = chunks
        .iter()
        .map(|chunk| compress(&config, chunk).unwrap())
        .collect();

    group.bench_function("fresh", |b| {
        b.iter(|| {
            for (chunk, stream) in chunks.iter().zip(&streams) {
                let out =
                    decompress(&config.properties, stream, Some(chunk.len() as u64)).unwrap();
                black_box(out);
            }
        });
    });

    group.bench_function("reused", |b| {
        let mut decoder = LzmaDecoder::new(config.properties).unwrap();
        let mut out = Vec::with_capacity(8192);
        b.iter(|| {
            for (chunk, stream) in chunks.iter().zip(&streams) {
                out.clear();
                decoder
                    .decode(Cursor::new(stream), &mut out, Some(chunk.len() as u64))
                    .unwrap();
                black_box(&out);
            }
        });
    });

    group.finish();
}

fn bench_trained(c: &mut Criterion) {
    let mut group = c.benchmark_group("trained");
    group.sample_size(20);

    let dictionary = test_data::records(32 * 1024);
    let data = test_data::records(2048);
    let config = config(LzmaLevel::DEFAULT);

    group.bench_function("untrained", |b| {
        b.iter(|| black_box(compress(&config, black_box(&data)).unwrap()));
    });
    group.bench_function("trained", |b| {
        b.iter(|| {
            let mut encoder = LzmaEncoder::new(config).unwrap();
            encoder.train(&dictionary);
            let mut out = Vec::new();
            encoder.encode(black_box(&data), &mut out).unwrap();
            black_box(out);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compression_levels,
    bench_strategies,
    bench_decompression,
    bench_decoder_reuse,
    bench_trained,
);
criterion_main!(benches);
