use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use plyshrink_cli::Compression;
use plyshrink_core::{decimate, PlyHeader, PlyHeaderExt};

/// Облако x/y/z float + rgb uchar, 15 байт на точку.
fn cloud(points: u64) -> Vec<u8> {
    let mut raw = format!(
        "ply\nformat binary_little_endian 1.0\nelement vertex {points}\n\
         property float x\nproperty float y\nproperty float z\n\
         property uchar red\nproperty uchar green\nproperty uchar blue\nend_header\n"
    )
    .into_bytes();

    for i in 0..points {
        let t = i as f32 * 0.001;
        raw.extend_from_slice(&t.sin().to_le_bytes());
        raw.extend_from_slice(&t.cos().to_le_bytes());
        raw.extend_from_slice(&t.to_le_bytes());
        raw.extend_from_slice(&[(i % 256) as u8, 128, 64]);
    }

    raw
}

fn bench_parse_header(c: &mut Criterion) {
    let raw = cloud(16);

    c.bench_function("parse_header", |b| {
        b.iter(|| PlyHeader::parse_bytes(black_box(&raw)))
    });
}

fn bench_decimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("decimate");

    for points in [10_000u64, 100_000, 1_000_000] {
        let raw = cloud(points);
        group.throughput(Throughput::Bytes(raw.len() as u64));

        for resolution in [0.1, 0.5, 1.0] {
            group.bench_with_input(
                BenchmarkId::new(format!("r{resolution}"), points),
                &raw,
                |b, raw| {
                    b.iter(|| {
                        let mut out = Vec::with_capacity(raw.len());
                        let report = decimate(Cursor::new(raw), resolution, &mut out);
                        black_box((report, out))
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    let raw = cloud(100_000);
    group.throughput(Throughput::Bytes(raw.len() as u64));

    for compression in [Compression::Gzip, Compression::Lz4] {
        group.bench_function(compression.to_string(), |b| {
            b.iter(|| {
                let mut out = Vec::new();
                black_box(compression.write_to(&raw, &mut out))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_header, bench_decimate, bench_compress);
criterion_main!(benches);
