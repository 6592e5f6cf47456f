//! Пример: синтетическое облако точек и его прореживание
//!
//! Демонстрирует:
//! - сборку бинарного PLY вручную
//! - прореживание через `decimate`
//! - анализ результата через `analyze_file`

use std::{
    fs::File,
    io::{BufWriter, Write},
};

use plyshrink_core::{analyze_file, decimate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input_path = "plyshrink-core/test_input.ply";
    let output_path = "plyshrink-core/test_output.ply";
    let points: u32 = 100_000;

    // --- Исходный файл: спираль x/y/z ---
    {
        let mut w = BufWriter::new(File::create(input_path)?);
        write!(
            w,
            "ply\nformat binary_little_endian 1.0\ncomment synthetic helix\n\
             element vertex {points}\nproperty float x\nproperty float y\nproperty float z\n\
             end_header\n"
        )?;

        for i in 0..points {
            let t = i as f32 * 0.01;
            w.write_all(&t.cos().to_le_bytes())?;
            w.write_all(&t.sin().to_le_bytes())?;
            w.write_all(&(t * 0.1).to_le_bytes())?;
        }
        w.flush()?;
    }

    // --- Прореживание до 25% ---
    let report = decimate(File::open(input_path)?, 0.25, File::create(output_path)?)?;

    println!("✓ Записано: {output_path}");
    println!("  Points   : {} of {points}", report.records_written);
    println!("  Bytes    : {}", report.bytes_written);

    let info = analyze_file(output_path)?;
    println!("\n{info}");

    Ok(())
}
