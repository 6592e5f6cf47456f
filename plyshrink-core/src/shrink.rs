use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use log::debug;
use plyshrink_types::{validate_resolution, PlyError, PlyHeader, PlyResult, SampleSpec, SizeReport};

use crate::{binary::write_header_lines, format::PlyHeaderExt};

/// Потоковый писатель прореженного PLY.
///
/// Заголовок пишется сразу в [`PlyShrinkWriter::new`] с уже поделёнными на
/// `sample_step` числами вершин, затем идут записи.
pub struct PlyShrinkWriter<W: Write> {
    writer: BufWriter<W>,
    spec: SampleSpec,
    bytes_per_record: usize,
    report: SizeReport,
}

impl<W: Write> PlyShrinkWriter<W> {
    /// Создаёт писатель, немедленно записывая заголовок в поток.
    pub fn new(
        inner: W,
        header: &PlyHeader,
        spec: SampleSpec,
    ) -> PlyResult<Self> {
        let mut writer = BufWriter::new(inner);
        let header_bytes = write_header_lines(&mut writer, &header.render_lines(spec.sample_step))?;

        Ok(Self {
            writer,
            spec,
            bytes_per_record: header.bytes_per_record(),
            report: SizeReport {
                source_count: header.record_count,
                declared_count: spec.sampled_count,
                header_bytes,
                bytes_written: header_bytes,
                ..SizeReport::default()
            },
        })
    }

    /// Записывает одну запись как есть.
    pub fn write_record(
        &mut self,
        record: &[u8],
    ) -> PlyResult<()> {
        self.writer.write_all(record)?;

        self.report.records_written += 1;
        self.report.payload_bytes += record.len() as u64;
        self.report.bytes_written += record.len() as u64;

        Ok(())
    }

    /// Выбирает из `payload` записи `0, step, 2*step, ...` и пишет их.
    ///
    /// Записи, чей диапазон байт выходит за конец `payload`, пропускаются
    /// молча: ни дополнения нулями, ни ошибки.
    ///
    /// Записи нулевой ширины не несут байт: при непустом `payload` считаются
    /// записанными все `sampled_count`, без перебора.
    pub fn write_sampled(
        &mut self,
        payload: &[u8],
    ) -> PlyResult<()> {
        let bpr = self.bytes_per_record as u64;
        let len = payload.len() as u64;

        if bpr == 0 {
            if len > 0 {
                self.report.records_written = self.report.records_written.saturating_add(self.spec.sampled_count);
            }

            debug!(
                "zero-width records: {} of {} counted",
                self.report.records_written, self.report.declared_count
            );
            return Ok(());
        }

        for i in 0..self.spec.sampled_count {
            let Some(start) = self.spec.source_index(i).checked_mul(bpr) else {
                break;
            };

            // start растёт с i: дальше записей тоже не будет
            if start >= len {
                break;
            }

            let end = start + bpr;
            if end > len {
                break;
            }

            self.write_record(&payload[start as usize..end as usize])?;
        }

        if self.report.is_short() {
            debug!(
                "payload truncated: {} of {} declared records written",
                self.report.records_written, self.report.declared_count
            );
        }

        Ok(())
    }

    /// Завершает запись: сбрасывает буфер и возвращает итог.
    pub fn finish(mut self) -> PlyResult<SizeReport> {
        self.writer.flush()?;
        Ok(self.report)
    }

    /// Текущий итог (до вызова [`PlyShrinkWriter::finish`]).
    pub fn report(&self) -> &SizeReport {
        &self.report
    }

    pub fn spec(&self) -> &SampleSpec {
        &self.spec
    }
}

/// Прореживает уже разобранный файл: пишет заголовок и выбранные записи.
pub fn shrink<W: Write>(
    header: &PlyHeader,
    resolution: f64,
    payload: &[u8],
    output: W,
) -> PlyResult<SizeReport> {
    if !header.is_binary {
        return Err(PlyError::unsupported_format(
            "only binary encoding supported",
        ));
    }

    let spec = header.sample_spec(resolution)?;

    debug!(
        "shrink: records={} step={} sampled={} bytes/record={}",
        header.record_count,
        spec.sample_step,
        spec.sampled_count,
        header.bytes_per_record()
    );

    let mut writer = PlyShrinkWriter::new(output, header, spec)?;
    writer.write_sampled(payload)?;
    writer.finish()
}

/// Полный цикл: заголовок из `input`, данные целиком в память, результат в
/// `output`.
///
/// При ошибке разбора заголовка в `output` не пишется ни одного байта.
pub fn decimate<R: Read, W: Write>(
    input: R,
    resolution: f64,
    output: W,
) -> PlyResult<SizeReport> {
    validate_resolution(resolution)?;

    let mut reader = BufReader::new(input);
    let (header, _offset) = PlyHeader::parse(&mut reader)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;

    shrink(&header, resolution, &payload, output)
}

/// [`decimate`] для путей на диске.
///
/// Выходной файл создаётся только после успешного разбора заголовка.
pub fn decimate_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    resolution: f64,
    output: Q,
) -> PlyResult<SizeReport> {
    validate_resolution(resolution)?;

    let mut reader = BufReader::new(File::open(input.as_ref())?);
    let (header, _offset) = PlyHeader::parse(&mut reader)?;

    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;

    let file = File::create(output.as_ref())?;
    shrink(&header, resolution, &payload, file)
}
