use std::{
    fs,
    io::{Cursor, Read},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use plyshrink_cli::{
    parse_quality_level, shrink_to_path, BatchConfig, BatchPipeline, Compression, QualityLevel,
};
use plyshrink_core::{PlyHeader, PlyHeaderExt};
use tempfile::tempdir;

/// x/y/z float + nx/ny/nz float, 24 байта на точку; `present` из `declared`.
fn write_cloud(
    path: &Path,
    declared: u64,
    present: u64,
) {
    let mut raw = format!(
        "ply\nformat binary_little_endian 1.0\nelement vertex {declared}\n\
         property float x\nproperty float y\nproperty float z\n\
         property float nx\nproperty float ny\nproperty float nz\nend_header\n"
    )
    .into_bytes();

    for i in 0..present {
        for k in 0..6 {
            raw.write_f32::<LittleEndian>(i as f32 + k as f32 * 0.1)
                .unwrap();
        }
    }

    fs::write(path, raw).unwrap();
}

#[test]
fn test_integration_batch_lz4_levels() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    write_cloud(&input.path().join("room.ply"), 1_000, 1_000);

    let config = BatchConfig {
        inputs: vec![input.path().to_path_buf()],
        output_dir: output.path().join("lod"),
        levels: vec![
            parse_quality_level("ultra_low").unwrap(),
            parse_quality_level("preview=0.02").unwrap(),
        ],
        compression: Compression::Lz4,
        jobs: 4,
        overwrite: false,
    };

    let (pipeline, metrics) = BatchPipeline::new(config);
    let report = pipeline.run(None).unwrap();
    assert!(!report.has_failures());
    assert_eq!(metrics.jobs_done(), 2);

    // --- ultra_low: step 10 ---
    let packed = fs::read(output.path().join("lod/room_ultra_low.ply.lz4")).unwrap();
    let mut ply = Vec::new();
    lz4_flex::frame::FrameDecoder::new(&packed[..])
        .read_to_end(&mut ply)
        .unwrap();

    let (header, offset) = PlyHeader::parse_bytes(&ply).unwrap();
    assert_eq!(header.record_count, 100);
    assert!(header.has_normals());
    assert_eq!(ply.len() - offset, 100 * 24);

    let mut c = Cursor::new(&ply[offset..]);
    for i in 0..100u64 {
        let x = c.read_f32::<LittleEndian>().unwrap();
        assert_eq!(x, (i * 10) as f32);
        for _ in 0..5 {
            c.read_f32::<LittleEndian>().unwrap();
        }
    }

    // --- preview: step 50 ---
    assert!(output.path().join("lod/room_preview.ply.lz4").exists());
}

#[test]
fn test_integration_truncated_input_single_file() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("partial.ply");
    let dst = dir.path().join("partial_half.ply");
    write_cloud(&src, 100, 31);

    let stats = shrink_to_path(&src, &dst, 0.5, Compression::None).unwrap();

    assert_eq!(stats.records_in, 100);
    assert_eq!(stats.declared_count, 50);
    // индексы 0, 2, ..., 30
    assert_eq!(stats.records_written, 16);

    let out = fs::read(&dst).unwrap();
    let (header, offset) = PlyHeader::parse_bytes(&out).unwrap();
    assert_eq!(header.record_count, 50);
    assert_eq!(out.len() - offset, 16 * 24);
    assert_eq!(stats.output_bytes, out.len() as u64);
}

#[test]
fn test_integration_explicit_files_and_unnamed_level() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();
    let a = input.path().join("a.ply");
    let b = input.path().join("b.bin");
    write_cloud(&a, 40, 40);
    write_cloud(&b, 40, 40);

    let config = BatchConfig {
        // явно указанный файл берётся независимо от расширения
        inputs: vec![a.clone(), b.clone(), a],
        output_dir: output.path().to_path_buf(),
        levels: vec![QualityLevel::unnamed(0.25)],
        compression: Compression::Gzip,
        jobs: 1,
        overwrite: false,
    };

    let (pipeline, _) = BatchPipeline::new(config);
    let report = pipeline.run(None).unwrap();

    assert_eq!(report.jobs.len(), 2);
    assert!(output.path().join("a.ply.gz").exists());
    assert!(output.path().join("b.ply.gz").exists());
    assert_eq!(report.summary.records_out, 20);
}
