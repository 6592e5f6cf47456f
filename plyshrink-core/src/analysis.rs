use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use log::warn;
use plyshrink_types::{PlyHeader, PlyResult, SampleSpec};

use crate::format::PlyHeaderExt;

/// Сведения о PLY файле, полученные только из заголовка.
#[derive(Debug, Clone)]
pub struct PlyInfo {
    pub header: PlyHeader,
    /// Длина заголовка в байтах (смещение начала данных)
    pub header_bytes: u64,
    /// Полный размер файла
    pub file_size: u64,
}

/// Ожидаемый результат прореживания.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShrinkEstimate {
    pub sample_step: u64,
    pub expected_points: u64,
    pub expected_bytes: u64,
    /// Уменьшение размера, % (0.0-100.0)
    pub reduction_pct: f64,
}

impl PlyInfo {
    pub fn vertex_count(&self) -> u64 {
        self.header.record_count
    }

    /// Сколько байт данных ожидается по заголовку (насыщается на `u64::MAX`).
    pub fn expected_payload_bytes(&self) -> u64 {
        self.vertex_count()
            .saturating_mul(self.header.bytes_per_record() as u64)
    }

    /// Оценка для данного коэффициента. Число точек и длина заголовка точные,
    /// размер данных считается по заголовку. Суммы насыщаются на `u64::MAX`.
    pub fn estimate(
        &self,
        resolution: f64,
    ) -> PlyResult<ShrinkEstimate> {
        let spec = SampleSpec::new(resolution, self.vertex_count())?;
        let header_bytes = self.header.serialize(spec.sample_step).len() as u64;
        let payload_bytes = spec
            .sampled_count
            .saturating_mul(self.header.bytes_per_record() as u64);
        let expected_bytes = header_bytes.saturating_add(payload_bytes);

        Ok(ShrinkEstimate {
            sample_step: spec.sample_step,
            expected_points: spec.sampled_count,
            expected_bytes,
            reduction_pct: reduction_pct(expected_bytes, self.file_size),
        })
    }
}

/// Сводка по набору файлов.
#[derive(Debug, Clone, Default)]
pub struct BatchInfo {
    /// Успешно разобранные файлы
    pub files: Vec<(PathBuf, PlyInfo)>,
    /// Файлы, которые не удалось разобрать
    pub failed: Vec<PathBuf>,
}

impl BatchInfo {
    pub fn total_points(&self) -> u64 {
        self.files
            .iter()
            .map(|(_, i)| i.vertex_count())
            .fold(0, u64::saturating_add)
    }

    pub fn total_size(&self) -> u64 {
        self.files
            .iter()
            .map(|(_, i)| i.file_size)
            .fold(0, u64::saturating_add)
    }

    pub fn has_colors(&self) -> bool {
        self.files.iter().any(|(_, i)| i.header.has_colors())
    }

    pub fn has_normals(&self) -> bool {
        self.files.iter().any(|(_, i)| i.header.has_normals())
    }

    /// Суммарная оценка по всем файлам.
    pub fn estimate(
        &self,
        resolution: f64,
    ) -> PlyResult<ShrinkEstimate> {
        let mut expected_points: u64 = 0;
        let mut expected_bytes: u64 = 0;
        let mut sample_step = plyshrink_types::sample_step(resolution)?;

        for (_, info) in &self.files {
            let e = info.estimate(resolution)?;
            expected_points = expected_points.saturating_add(e.expected_points);
            expected_bytes = expected_bytes.saturating_add(e.expected_bytes);
            sample_step = e.sample_step;
        }

        Ok(ShrinkEstimate {
            sample_step,
            expected_points,
            expected_bytes,
            reduction_pct: reduction_pct(expected_bytes, self.total_size()),
        })
    }
}

/// Читает заголовок из `reader`. Кодировка не проверяется.
pub fn analyze<R: BufRead>(
    reader: &mut R,
    file_size: u64,
) -> PlyResult<PlyInfo> {
    let (header, offset) = PlyHeader::read_from(reader)?;

    Ok(PlyInfo {
        header,
        header_bytes: offset as u64,
        file_size,
    })
}

/// [`analyze`] для файла на диске.
pub fn analyze_file<P: AsRef<Path>>(path: P) -> PlyResult<PlyInfo> {
    let file = File::open(path.as_ref())?;
    let file_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    analyze(&mut reader, file_size)
}

/// Анализирует набор файлов; неразборчивые пропускаются с предупреждением.
pub fn analyze_files<P: AsRef<Path>>(paths: &[P]) -> BatchInfo {
    let mut batch = BatchInfo::default();

    for path in paths {
        let path = path.as_ref();
        match analyze_file(path) {
            Ok(info) => batch.files.push((path.to_path_buf(), info)),
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                batch.failed.push(path.to_path_buf());
            }
        }
    }

    batch
}

fn reduction_pct(
    expected: u64,
    original: u64,
) -> f64 {
    if original == 0 {
        0.0
    } else {
        (1.0 - expected as f64 / original as f64) * 100.0
    }
}

impl std::fmt::Display for PlyInfo {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "  File size     : {:.2} MB", self.file_size as f64 / MB)?;
        writeln!(f, "  Points        : {}", self.vertex_count())?;
        writeln!(
            f,
            "  Encoding      : {}",
            if self.header.is_binary { "binary" } else { "ascii (unsupported)" }
        )?;
        writeln!(f, "  Bytes/point   : {}", self.header.bytes_per_record())?;
        writeln!(f, "  Colors        : {}", yes_no(self.header.has_colors()))?;
        write!(f, "  Normals       : {}", yes_no(self.header.has_normals()))
    }
}

impl std::fmt::Display for ShrinkEstimate {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        writeln!(f, "  Sample step   : {}", self.sample_step)?;
        writeln!(f, "  Output points : {}", self.expected_points)?;
        writeln!(f, "  Output size   : ~{:.2} MB", self.expected_bytes as f64 / MB)?;
        write!(f, "  Reduction     : {:.1}%", self.reduction_pct)
    }
}

const MB: f64 = 1024.0 * 1024.0;

fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}
