use crate::{PlyError, PlyResult};

/// Верхняя граница коэффициента прореживания
pub const MAX_RESOLUTION: f64 = 2.0;

/// Параметры равномерного прореживания с фиксированным шагом.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSpec {
    /// Доля сохраняемых точек, (0, 2]
    pub resolution: f64,
    /// Шаг: `max(1, floor(1 / resolution))`
    pub sample_step: u64,
    /// Сколько записей объявляется в выходном заголовке
    pub sampled_count: u64,
}

impl SampleSpec {
    /// Считает шаг и итоговое количество для `record_count` записей.
    pub fn new(
        resolution: f64,
        record_count: u64,
    ) -> PlyResult<Self> {
        let sample_step = sample_step(resolution)?;

        Ok(Self {
            resolution,
            sample_step,
            sampled_count: record_count / sample_step,
        })
    }

    /// Индекс исходной записи для `i`-й выходной.
    pub fn source_index(
        &self,
        i: u64,
    ) -> u64 {
        i * self.sample_step
    }
}

/// Проверяет коэффициент и возвращает шаг выборки.
pub fn sample_step(resolution: f64) -> PlyResult<u64> {
    validate_resolution(resolution)?;

    // f64 -> u64 насыщается на огромных значениях
    Ok(((1.0 / resolution).floor() as u64).max(1))
}

pub fn validate_resolution(resolution: f64) -> PlyResult<()> {
    if !resolution.is_finite() || resolution <= 0.0 || resolution > MAX_RESOLUTION {
        return Err(PlyError::InvalidResolution(resolution));
    }

    Ok(())
}
