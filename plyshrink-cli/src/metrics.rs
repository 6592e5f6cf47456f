use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Instant,
};

use serde::Serialize;

/// Счётчики пакетной обработки, обновляемые lock-free из рабочих потоков.
#[derive(Debug, Default)]
pub struct BatchMetrics {
    pub jobs_total: AtomicU64,
    pub files_processed: AtomicU64,
    pub files_skipped: AtomicU64,
    pub files_failed: AtomicU64,
    /// Записей, объявленных во входных файлах
    pub records_in: AtomicU64,
    /// Записей фактически записано
    pub records_out: AtomicU64,
    /// Размер входных файлов
    pub bytes_in: AtomicU64,
    /// Размер прореженных файлов до упаковки
    pub bytes_shrunk: AtomicU64,
    /// Размер итоговых файлов на диске
    pub bytes_out: AtomicU64,
}

/// Snapshot метрик для отображения и JSON-отчёта.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub duration_secs: f64,
    pub jobs_total: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub records_in: u64,
    pub records_out: u64,
    pub bytes_in: u64,
    pub bytes_shrunk: u64,
    pub bytes_out: u64,
    pub reduction_pct: f64,
    pub read_speed_mbps: f64,
}

impl BatchMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Сокращение размера на диске, % (0.0 при пустом входе).
    pub fn reduction_pct(&self) -> f64 {
        let bytes_in = self.bytes_in.load(Ordering::Relaxed);
        let bytes_out = self.bytes_out.load(Ordering::Relaxed);

        if bytes_in == 0 {
            0.0
        } else {
            (1.0 - bytes_out as f64 / bytes_in as f64) * 100.0
        }
    }

    /// Скорость чтения входных данных в МБ/с.
    pub fn read_speed_mbps(
        &self,
        elapsed: &Instant,
    ) -> f64 {
        let secs = elapsed.elapsed().as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        self.bytes_in.load(Ordering::Relaxed) as f64 / secs / 1_000_000.0
    }

    /// Сколько заданий уже завершено любым исходом.
    pub fn jobs_done(&self) -> u64 {
        self.files_processed.load(Ordering::Relaxed)
            + self.files_skipped.load(Ordering::Relaxed)
            + self.files_failed.load(Ordering::Relaxed)
    }

    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> BatchSummary {
        BatchSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            jobs_total: self.jobs_total.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            records_in: self.records_in.load(Ordering::Relaxed),
            records_out: self.records_out.load(Ordering::Relaxed),
            bytes_in: self.bytes_in.load(Ordering::Relaxed),
            bytes_shrunk: self.bytes_shrunk.load(Ordering::Relaxed),
            bytes_out: self.bytes_out.load(Ordering::Relaxed),
            reduction_pct: self.reduction_pct(),
            read_speed_mbps: self.read_speed_mbps(elapsed),
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.1}s", self.duration_secs)?;
        writeln!(
            f,
            "  Files         : {} ok, {} skipped, {} failed (of {})",
            self.files_processed, self.files_skipped, self.files_failed, self.jobs_total
        )?;
        writeln!(
            f,
            "  Points        : {} -> {}",
            self.records_in, self.records_out
        )?;
        writeln!(f, "  Input size    : {:.1} MB", self.bytes_in as f64 / 1e6)?;
        writeln!(
            f,
            "  Shrunk size   : {:.1} MB",
            self.bytes_shrunk as f64 / 1e6
        )?;
        writeln!(
            f,
            "  Output size   : {:.1} MB ({:.1}% smaller)",
            self.bytes_out as f64 / 1e6,
            self.reduction_pct
        )?;
        writeln!(f, "  Read speed    : {:.1} MB/s", self.read_speed_mbps)?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}
