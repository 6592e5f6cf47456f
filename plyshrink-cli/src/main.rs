use std::{
    path::PathBuf,
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use plyshrink_cli::{
    discover_inputs, parse_quality_level, parse_resolution, shrink_to_path, BatchConfig,
    BatchEvent, BatchPipeline, Compression, QualityLevel, ShrinkConfig, DEFAULT_RESOLUTION,
};
use plyshrink_core::analyze_files;

#[derive(Parser, Debug)]
#[command(
    name = "plyshrink",
    version = env!("CARGO_PKG_VERSION"),
    about = "Decimate binary PLY point clouds by fixed-stride sampling",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Тихий режим (только ошибки)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Подробный вывод (debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Прореживает один файл
    Shrink {
        /// Входной .ply файл
        input: PathBuf,
        /// Выходной файл
        #[arg(short, long)]
        output: PathBuf,
        /// Доля сохраняемых точек: 0.25 или 25%
        #[arg(short, long, default_value = "0.5", value_parser = parse_resolution)]
        resolution: f64,
        /// Упаковка: none, gzip, lz4
        #[arg(long, default_value = "none")]
        compress: Compression,
    },
    /// Пакетная обработка файлов и каталогов
    Batch {
        /// Файлы .ply или каталоги с ними
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Каталог для результатов
        #[arg(short, long)]
        output: PathBuf,
        /// Доля сохраняемых точек: 0.25 или 25%
        #[arg(short, long, value_parser = parse_resolution, conflicts_with = "levels")]
        resolution: Option<f64>,
        /// Уровни качества: ultra_low, low, medium, high или name=ratio
        #[arg(short, long = "level", value_parser = parse_quality_level)]
        levels: Vec<QualityLevel>,
        /// Упаковка: none, gzip, lz4
        #[arg(long, default_value = "none")]
        compress: Compression,
        /// Число рабочих потоков (по умолчанию: число ядер)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Перезаписывать существующие результаты
        #[arg(long)]
        force: bool,
        /// Записать JSON-отчёт в файл
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Показывает сведения о файлах и оценку результата
    Info {
        /// Файлы .ply или каталоги с ними
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Доля для оценки: 0.25 или 25%
        #[arg(short, long, default_value = "0.5", value_parser = parse_resolution)]
        resolution: f64,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        LevelFilter::Error
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let code = match cli.command {
        Command::Shrink {
            input,
            output,
            resolution,
            compress,
        } => run_shrink(ShrinkConfig {
            input,
            output,
            resolution,
            compression: compress,
        }),
        Command::Batch {
            inputs,
            output,
            resolution,
            levels,
            compress,
            jobs,
            force,
            report,
        } => {
            let defaults = BatchConfig::default();
            let levels = if levels.is_empty() {
                vec![QualityLevel::unnamed(
                    resolution.unwrap_or(DEFAULT_RESOLUTION),
                )]
            } else {
                levels
            };

            run_batch(
                BatchConfig {
                    inputs,
                    output_dir: output,
                    levels,
                    compression: compress,
                    jobs: jobs.unwrap_or(defaults.jobs),
                    overwrite: force,
                },
                report,
            )
        }
        Command::Info { inputs, resolution } => run_info(&inputs, resolution),
    };

    process::exit(code);
}

fn run_shrink(config: ShrinkConfig) -> i32 {
    info!(
        "Shrinking {:?} -> {:?} (resolution={}, compression={})",
        config.input, config.output, config.resolution, config.compression
    );

    let start = Instant::now();

    match shrink_to_path(
        &config.input,
        &config.output,
        config.resolution,
        config.compression,
    ) {
        Ok(stats) => {
            if stats.records_written < stats.declared_count {
                warn!(
                    "⚠ header declares {} points, only {} present in input",
                    stats.declared_count, stats.records_written
                );
            }

            info!(
                "✓ {} -> {} points, {:.1} KB -> {:.1} KB ({:.1}% smaller) in {:.2}s",
                stats.records_in,
                stats.records_written,
                stats.input_bytes as f64 / 1024.0,
                stats.output_bytes as f64 / 1024.0,
                stats.reduction_pct(),
                start.elapsed().as_secs_f64()
            );
            0
        }
        Err(e) => {
            error!("Shrink failed: {e}");
            1
        }
    }
}

fn run_batch(
    config: BatchConfig,
    report_path: Option<PathBuf>,
) -> i32 {
    if let Err(e) = config.validate() {
        error!("{e}");
        return 1;
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Inputs        : {}", config.inputs.len());
    info!(
        "  Levels        : {}",
        config
            .levels
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!("  Compression   : {}", config.compression);
    info!("  Workers       : {}", config.jobs);
    info!("  Output        : {:?}", config.output_dir);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let (pipeline, metrics) = BatchPipeline::new(config);
    let stop_flag: Arc<AtomicBool> = pipeline.stop_flag();

    let stop_ctrlc = stop_flag.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        if stop_ctrlc.swap(true, Ordering::SeqCst) {
            // Второй Ctrl+C: принудительный выход
            warn!("Force exit");
            process::exit(130);
        }
        warn!("Ctrl+C received, finishing files in progress...");
    }) {
        warn!("Failed to set Ctrl+C handler: {e}");
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let handle = std::thread::spawn(move || pipeline.run(Some(tx)));

    for event in rx {
        let done = metrics.jobs_done();
        let total = metrics.jobs_total.load(Ordering::Relaxed);

        match event {
            BatchEvent::Started { index, job } => {
                info!(
                    "[{}/{total}] {} @ {}",
                    index + 1,
                    job.input.display(),
                    job.level
                );
            }
            BatchEvent::Finished { job, stats, .. } => {
                info!(
                    "[{done}/{total}] ✓ {} ({} points, {:.1}% smaller)",
                    job.output.display(),
                    stats.records_written,
                    stats.reduction_pct()
                );
            }
            BatchEvent::Skipped { job, reason, .. } => {
                info!("[{done}/{total}] skip {}: {reason}", job.output.display());
            }
            BatchEvent::Failed { error, .. } => {
                error!("[{done}/{total}] ✗ {error}");
            }
        }
    }

    let report = match handle.join() {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            error!("Batch failed: {e}");
            return 1;
        }
        Err(_) => {
            error!("Batch thread panicked");
            return 1;
        }
    };

    info!("\n{}", report.summary);

    if let Some(path) = report_path {
        match report.write_json(&path) {
            Ok(()) => info!("Report written: {:?}", path),
            Err(e) => {
                error!("Failed to write report: {e}");
                return 1;
            }
        }
    }

    if report.has_failures() {
        warn!(
            "⚠ {} file(s) failed",
            report.summary.files_failed
        );
        return 1;
    }

    0
}

fn run_info(
    inputs: &[PathBuf],
    resolution: f64,
) -> i32 {
    let files = match discover_inputs(inputs) {
        Ok(f) => f,
        Err(e) => {
            error!("{e}");
            return 1;
        }
    };

    let batch = analyze_files(&files);

    for (path, info) in &batch.files {
        println!("{}", path.display());
        println!("{info}");

        match info.estimate(resolution) {
            Ok(estimate) => println!("{estimate}\n"),
            Err(e) => error!("{e}"),
        }
    }

    if batch.files.len() > 1 {
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("  Files         : {}", batch.files.len());
        println!("  Total points  : {}", batch.total_points());
        println!(
            "  Total size    : {:.2} MB",
            batch.total_size() as f64 / (1024.0 * 1024.0)
        );

        if let Ok(estimate) = batch.estimate(resolution) {
            println!("{estimate}");
        }
    }

    if batch.failed.is_empty() {
        0
    } else {
        1
    }
}
