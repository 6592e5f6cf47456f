use std::path::{Path, PathBuf};

use plyshrink_types::validate_resolution;

use crate::Compression;

/// Предустановленные уровни качества: имя и доля точек.
pub const QUALITY_PRESETS: [(&str, f64); 4] = [
    ("ultra_low", 0.1),
    ("low", 0.25),
    ("medium", 0.5),
    ("high", 1.0),
];

/// Коэффициент по умолчанию.
pub const DEFAULT_RESOLUTION: f64 = 0.5;

/// Уровень качества: коэффициент прореживания и, возможно, имя.
///
/// Безымянный уровень даёт выходной файл без суффикса (`scan.ply`),
/// именованный даёт `scan_<name>.ply`.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityLevel {
    pub name: Option<String>,
    pub resolution: f64,
}

/// Настройки одиночного прореживания (`plyshrink shrink`).
#[derive(Debug, Clone)]
pub struct ShrinkConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub resolution: f64,
    pub compression: Compression,
}

/// Настройки пакетной обработки (`plyshrink batch`).
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Файлы `.ply` или каталоги с ними
    pub inputs: Vec<PathBuf>,
    /// Каталог для результатов
    pub output_dir: PathBuf,
    /// Уровни; каждый входной файл обрабатывается с каждым уровнем
    pub levels: Vec<QualityLevel>,
    pub compression: Compression,
    /// Число рабочих потоков
    pub jobs: usize,
    /// Перезаписывать уже существующие результаты
    pub overwrite: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl QualityLevel {
    /// Уровень без имени.
    pub fn unnamed(resolution: f64) -> Self {
        Self {
            name: None,
            resolution,
        }
    }

    pub fn named(
        name: impl Into<String>,
        resolution: f64,
    ) -> Self {
        Self {
            name: Some(name.into()),
            resolution,
        }
    }

    /// Ищет предустановку по имени (регистронезависимо, `-` == `_`).
    pub fn preset(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace('-', "_");

        QUALITY_PRESETS
            .iter()
            .find(|(n, _)| *n == key)
            .map(|(n, r)| Self::named(*n, *r))
    }

    /// Суффикс имени файла: `_medium` или пустая строка.
    pub fn file_suffix(&self) -> String {
        match &self.name {
            Some(name) => format!("_{name}"),
            None => String::new(),
        }
    }
}

impl BatchConfig {
    /// Путь результата для входа `input` и уровня `level`:
    /// `<output_dir>/<stem><suffix>.ply<ext>`.
    pub fn output_path(
        &self,
        input: &Path,
        level: &QualityLevel,
    ) -> PathBuf {
        output_file_name(&self.output_dir, input, level, self.compression)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.inputs.is_empty() {
            return Err("no input files".into());
        }

        if self.levels.is_empty() {
            return Err("at least one quality level required".into());
        }

        if self.jobs == 0 {
            return Err("jobs must be at least 1".into());
        }

        for level in &self.levels {
            validate_resolution(level.resolution).map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}

/// Собирает имя выходного файла в `dir`.
pub fn output_file_name(
    dir: &Path,
    input: &Path,
    level: &QualityLevel,
    compression: Compression,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    dir.join(format!(
        "{stem}{}.ply{}",
        level.file_suffix(),
        compression.extension()
    ))
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для QualityLevel, ShrinkConfig, BatchConfig
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for QualityLevel {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({:.0}%)", self.resolution * 100.0),
            None => write!(f, "{:.0}%", self.resolution * 100.0),
        }
    }
}

impl Default for ShrinkConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.ply"),
            output: PathBuf::from("output.ply"),
            resolution: DEFAULT_RESOLUTION,
            compression: Compression::None,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output_dir: PathBuf::from("."),
            levels: vec![QualityLevel::unnamed(DEFAULT_RESOLUTION)],
            compression: Compression::None,
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            overwrite: false,
        }
    }
}

/// Парсит коэффициент прореживания.
///
/// Допускается доля (`0.25`) или проценты (`25%`). Значение должно
/// лежать в `(0, 2]`.
///
/// # Примеры
/// ```
/// use plyshrink_cli::config::parse_resolution;
/// assert_eq!(parse_resolution("0.25").unwrap(), 0.25);
/// assert_eq!(parse_resolution("25%").unwrap(), 0.25);
/// assert!(parse_resolution("0").is_err());
/// ```
pub fn parse_resolution(s: &str) -> Result<f64, String> {
    let s = s.trim();

    let value = if let Some(pct) = s.strip_suffix('%') {
        let n: f64 = pct
            .trim()
            .parse()
            .map_err(|e| format!("Invalid percentage '{s}': {e}"))?;
        n / 100.0
    } else {
        s.parse::<f64>()
            .map_err(|e| format!("Invalid resolution '{s}': {e}"))?
    };

    validate_resolution(value).map_err(|e| e.to_string())?;

    Ok(value)
}

/// Парсит уровень качества: имя предустановки или `name=ratio`.
///
/// # Примеры
/// ```
/// use plyshrink_cli::config::parse_quality_level;
/// assert_eq!(parse_quality_level("low").unwrap().resolution, 0.25);
/// assert_eq!(parse_quality_level("preview=5%").unwrap().resolution, 0.05);
/// ```
pub fn parse_quality_level(s: &str) -> Result<QualityLevel, String> {
    if let Some((name, ratio)) = s.split_once('=') {
        let name = name.trim();

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("Invalid level name '{name}'"));
        }

        return Ok(QualityLevel::named(name, parse_resolution(ratio)?));
    }

    QualityLevel::preset(s).ok_or_else(|| {
        let names: Vec<&str> = QUALITY_PRESETS.iter().map(|(n, _)| *n).collect();
        format!(
            "Unknown quality level '{s}'. Use: {} or name=ratio",
            names.join(", ")
        )
    })
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
