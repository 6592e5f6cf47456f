//! Пример: анализ PLY файла и оценка результата прореживания

use plyshrink_core::analyze_file;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "plyshrink-core/test_input.ply".to_string());

    let info = analyze_file(&path)?;
    println!("{path}\n{info}");

    for resolution in [0.1, 0.25, 0.5, 1.0] {
        println!("\nResolution {resolution:.2}:");
        println!("{}", info.estimate(resolution)?);
    }

    Ok(())
}
