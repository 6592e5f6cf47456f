use std::{
    fs::{self, File},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use plyshrink_core::decimate;
use serde::Serialize;

use crate::{
    metrics::{BatchMetrics, BatchSummary},
    BatchConfig, Compression, QualityLevel, ShrinkError, ShrinkResult,
};

/// Расширение входных файлов (сравнивается без учёта регистра)
pub const PLY_EXTENSION: &str = "ply";

/// Одна единица работы: входной файл + уровень качества.
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub level: QualityLevel,
}

/// Итог успешно обработанного файла.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct JobStats {
    pub input_bytes: u64,
    /// Размер прореженного PLY до упаковки
    pub shrunk_bytes: u64,
    /// Размер файла на диске
    pub output_bytes: u64,
    pub records_in: u64,
    pub records_written: u64,
    pub declared_count: u64,
}

/// События пакетной обработки для front-end.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        index: usize,
        job: ShrinkJob,
    },
    Finished {
        index: usize,
        job: ShrinkJob,
        stats: JobStats,
    },
    Skipped {
        index: usize,
        job: ShrinkJob,
        reason: String,
    },
    Failed {
        index: usize,
        job: ShrinkJob,
        kind: &'static str,
        error: String,
    },
}

/// Строка отчёта по одному заданию.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub index: usize,
    pub input: PathBuf,
    pub output: PathBuf,
    pub level: String,
    pub resolution: f64,
    /// `ok`, `skipped` или `failed`
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<JobStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Итоговый отчёт пакетной обработки.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub jobs: Vec<JobOutcome>,
}

/// Оркестрирует пакетное прореживание.
pub struct BatchPipeline {
    config: BatchConfig,
    metrics: Arc<BatchMetrics>,
    stop_flag: Arc<AtomicBool>,
}

impl BatchPipeline {
    /// Создаёт пайплайн. Возвращает также shared-ссылку на метрики.
    pub fn new(config: BatchConfig) -> (Self, Arc<BatchMetrics>) {
        let metrics = BatchMetrics::new();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let p = Self {
            config,
            metrics: metrics.clone(),
            stop_flag,
        };

        (p, metrics)
    }

    /// Флаг остановки. `true` = не брать новые задания.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Список заданий: входные файлы × уровни, в детерминированном порядке.
    pub fn plan(&self) -> ShrinkResult<Vec<ShrinkJob>> {
        let files = discover_inputs(&self.config.inputs)?;
        let mut jobs = Vec::with_capacity(files.len() * self.config.levels.len());

        for input in &files {
            for level in &self.config.levels {
                jobs.push(ShrinkJob {
                    input: input.clone(),
                    output: self.config.output_path(input, level),
                    level: level.clone(),
                });
            }
        }

        Ok(jobs)
    }

    /// Запускает обработку. Блокируется до завершения всех рабочих потоков.
    ///
    /// Ошибка отдельного файла не прерывает пакет: она попадает в отчёт и
    /// в `files_failed`.
    pub fn run(
        self,
        events: Option<Sender<BatchEvent>>,
    ) -> ShrinkResult<BatchReport> {
        self.config.validate().map_err(ShrinkError::Config)?;

        let jobs = self.plan()?;
        let total = jobs.len();
        self.metrics
            .jobs_total
            .store(total as u64, Ordering::Relaxed);

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| ShrinkError::file(&self.config.output_dir, e))?;

        let workers = self.config.jobs.min(total).max(1);
        info!(
            "Batch: {total} job(s), {workers} worker(s), compression={}, output={:?}",
            self.config.compression, self.config.output_dir
        );

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, ShrinkJob)>();
        for item in jobs.into_iter().enumerate() {
            job_tx
                .send(item)
                .map_err(|e| ShrinkError::Pipeline(format!("job queue closed: {e}")))?;
        }
        drop(job_tx);

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<BatchEvent>();
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(total);
        let this = &self;

        std::thread::scope(|s| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let event_tx = event_tx.clone();
                s.spawn(move || this.worker_loop(worker, job_rx, event_tx));
            }
            drop(event_tx);

            // Канал закрывается, когда последний рабочий поток завершился
            for event in event_rx.iter() {
                if let Some(outcome) = JobOutcome::from_event(&event) {
                    outcomes.push(outcome);
                }

                if let Some(tx) = &events {
                    if tx.send(event).is_err() {
                        debug!("Event receiver dropped");
                    }
                }
            }
        });

        if self.stop_flag.load(Ordering::Relaxed) && outcomes.len() < total {
            warn!(
                "Stopped early: {} of {total} job(s) not started",
                total - outcomes.len()
            );
        }

        outcomes.sort_by_key(|o| o.index);

        Ok(BatchReport {
            summary: self.metrics.summary(&start),
            jobs: outcomes,
        })
    }

    fn worker_loop(
        &self,
        worker: usize,
        jobs: Receiver<(usize, ShrinkJob)>,
        events: Sender<BatchEvent>,
    ) {
        let metrics = &self.metrics;

        for (index, job) in jobs.iter() {
            if self.stop_flag.load(Ordering::Relaxed) {
                debug!("worker {worker}: stop signal received");
                break;
            }

            if !self.config.overwrite && job.output.exists() {
                metrics.files_skipped.fetch_add(1, Ordering::Relaxed);
                send_event(
                    &events,
                    BatchEvent::Skipped {
                        index,
                        job,
                        reason: "output exists".into(),
                    },
                );
                continue;
            }

            send_event(
                &events,
                BatchEvent::Started {
                    index,
                    job: job.clone(),
                },
            );

            match shrink_to_path(
                &job.input,
                &job.output,
                job.level.resolution,
                self.config.compression,
            ) {
                Ok(stats) => {
                    metrics.files_processed.fetch_add(1, Ordering::Relaxed);
                    metrics
                        .records_in
                        .fetch_add(stats.records_in, Ordering::Relaxed);
                    metrics
                        .records_out
                        .fetch_add(stats.records_written, Ordering::Relaxed);
                    metrics
                        .bytes_in
                        .fetch_add(stats.input_bytes, Ordering::Relaxed);
                    metrics
                        .bytes_shrunk
                        .fetch_add(stats.shrunk_bytes, Ordering::Relaxed);
                    metrics
                        .bytes_out
                        .fetch_add(stats.output_bytes, Ordering::Relaxed);

                    send_event(&events, BatchEvent::Finished { index, job, stats });
                }
                Err(e) => {
                    metrics.files_failed.fetch_add(1, Ordering::Relaxed);
                    send_event(
                        &events,
                        BatchEvent::Failed {
                            index,
                            job,
                            kind: e.kind(),
                            error: e.to_string(),
                        },
                    );
                }
            }
        }
    }
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.summary.files_failed > 0
    }

    /// Пишет отчёт в JSON.
    pub fn write_json<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> ShrinkResult<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ShrinkError::file(path, e))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| ShrinkError::Pipeline(format!("report {}: {e}", path.display())))
    }
}

impl JobOutcome {
    fn from_event(event: &BatchEvent) -> Option<Self> {
        let (index, job, status) = match event {
            BatchEvent::Started { .. } => return None,
            BatchEvent::Finished { index, job, .. } => (*index, job, "ok"),
            BatchEvent::Skipped { index, job, .. } => (*index, job, "skipped"),
            BatchEvent::Failed { index, job, .. } => (*index, job, "failed"),
        };

        let mut outcome = Self {
            index,
            input: job.input.clone(),
            output: job.output.clone(),
            level: job.level.to_string(),
            resolution: job.level.resolution,
            status,
            stats: None,
            error_kind: None,
            error: None,
        };

        match event {
            BatchEvent::Finished { stats, .. } => outcome.stats = Some(*stats),
            BatchEvent::Skipped { reason, .. } => outcome.error = Some(reason.clone()),
            BatchEvent::Failed { kind, error, .. } => {
                outcome.error_kind = Some(*kind);
                outcome.error = Some(error.clone());
            }
            BatchEvent::Started { .. } => {}
        }

        Some(outcome)
    }
}

impl JobStats {
    /// Сокращение размера на диске, %.
    pub fn reduction_pct(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            (1.0 - self.output_bytes as f64 / self.input_bytes as f64) * 100.0
        }
    }
}

fn send_event(
    events: &Sender<BatchEvent>,
    event: BatchEvent,
) {
    if events.send(event).is_err() {
        debug!("Event channel closed");
    }
}

/// Раскрывает входные пути: каталоги (без рекурсии) дают свои `*.ply`
/// файлы, файлы берутся как есть. Результат отсортирован, без дублей.
pub fn discover_inputs(inputs: &[PathBuf]) -> ShrinkResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let entries = fs::read_dir(input).map_err(|e| ShrinkError::file(input, e))?;

            for entry in entries {
                let path = entry.map_err(|e| ShrinkError::file(input, e))?.path();

                if path.is_file() && has_ply_extension(&path) {
                    files.push(path);
                }
            }
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(ShrinkError::Config(format!(
                "input not found: {}",
                input.display()
            )));
        }
    }

    files.sort();
    files.dedup();

    Ok(files)
}

pub fn has_ply_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PLY_EXTENSION))
}

/// Прореживает `input` в `output` с упаковкой `compression`.
///
/// Результат сначала пишется во временный файл рядом с `output`, затем
/// атомарно переименовывается. При ошибке `output` не трогается.
pub fn shrink_to_path(
    input: &Path,
    output: &Path,
    resolution: f64,
    compression: Compression,
) -> ShrinkResult<JobStats> {
    if same_file(input, output) {
        return Err(ShrinkError::Config(format!(
            "output would overwrite input: {}",
            input.display()
        )));
    }

    let file = File::open(input).map_err(|e| ShrinkError::file(input, e))?;
    let input_bytes = file
        .metadata()
        .map_err(|e| ShrinkError::file(input, e))?
        .len();

    let mut shrunk = Vec::new();
    let report = decimate(file, resolution, &mut shrunk).map_err(|e| ShrinkError::file(input, e))?;

    if report.is_short() {
        warn!(
            "{}: payload shorter than declared, {} of {} records written",
            input.display(),
            report.records_written,
            report.declared_count
        );
    }

    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".plyshrink-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| ShrinkError::file(output, e))?;

    let output_bytes = compression
        .write_to(&shrunk, tmp.as_file_mut())
        .map_err(|e| match e {
            ShrinkError::Io(io) => ShrinkError::file(output, io),
            other => other,
        })?;

    tmp.persist(output)
        .map_err(|e| ShrinkError::file(output, e.error))?;

    debug!(
        "{} -> {}: {} -> {} records, {} -> {} bytes",
        input.display(),
        output.display(),
        report.source_count,
        report.records_written,
        input_bytes,
        output_bytes
    );

    Ok(JobStats {
        input_bytes,
        shrunk_bytes: report.bytes_written,
        output_bytes,
        records_in: report.source_count,
        records_written: report.records_written,
        declared_count: report.declared_count,
    })
}

fn same_file(
    a: &Path,
    b: &Path,
) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}
