//! Упаковка готового PLY: gzip (RFC 1952) или кадровый LZ4.
//!
//! Сам прореживатель о сжатии ничего не знает: сюда приходит уже
//! сформированный файл целиком.

use std::io::Write;

use crc32fast::Hasher;
use miniz_oxide::deflate::{compress_to_vec, CompressionLevel};

use crate::{ShrinkError, ShrinkResult};

/// Заголовок gzip: ID1 ID2, CM = deflate
const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// OS = unknown
const GZIP_OS_UNKNOWN: u8 = 0xff;

/// Длина фиксированного заголовка gzip-члена
pub const GZIP_HEADER_LEN: usize = 10;

/// CRC32 + ISIZE
pub const GZIP_TRAILER_LEN: usize = 8;

/// Тип упаковки выходного файла
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Без сжатия
    #[default]
    None,
    /// gzip (.ply.gz)
    Gzip,
    /// LZ4 frame (.ply.lz4)
    Lz4,
}

impl Compression {
    /// Суффикс, добавляемый к `.ply`.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::Lz4 => ".lz4",
        }
    }

    /// Пишет `data` в `out` с данной упаковкой. Возвращает число байт.
    pub fn write_to<W: Write>(
        &self,
        data: &[u8],
        out: W,
    ) -> ShrinkResult<u64> {
        match self {
            Compression::None => write_plain(data, out),
            Compression::Gzip => write_gzip(data, out, CompressionLevel::DefaultLevel as u8),
            Compression::Lz4 => write_lz4(data, out),
        }
    }
}

/// Собирает gzip-член в памяти.
pub fn gzip_bytes(
    data: &[u8],
    level: u8,
) -> Vec<u8> {
    let deflated = compress_to_vec(data, level);

    let mut hasher = Hasher::new();
    hasher.update(data);
    let crc = hasher.finalize();

    // XFL: 2 = максимальное сжатие, 4 = самое быстрое
    let xfl = match level {
        0 | 1 => 4,
        9.. => 2,
        _ => 0,
    };

    let mut out = Vec::with_capacity(GZIP_HEADER_LEN + deflated.len() + GZIP_TRAILER_LEN);
    out.extend_from_slice(&GZIP_MAGIC);
    out.push(0); // FLG
    out.extend_from_slice(&[0; 4]); // MTIME не задан
    out.push(xfl);
    out.push(GZIP_OS_UNKNOWN);
    out.extend_from_slice(&deflated);
    // трейлер little-endian
    out.extend_from_slice(&crc.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out
}

fn write_plain<W: Write>(
    data: &[u8],
    mut out: W,
) -> ShrinkResult<u64> {
    out.write_all(data)?;
    out.flush()?;
    Ok(data.len() as u64)
}

fn write_gzip<W: Write>(
    data: &[u8],
    mut out: W,
    level: u8,
) -> ShrinkResult<u64> {
    let gz = gzip_bytes(data, level);
    out.write_all(&gz)?;
    out.flush()?;
    Ok(gz.len() as u64)
}

fn write_lz4<W: Write>(
    data: &[u8],
    out: W,
) -> ShrinkResult<u64> {
    let mut counter = CountingWriter { inner: out, count: 0 };
    {
        let mut encoder = lz4_flex::frame::FrameEncoder::new(&mut counter);
        encoder.write_all(data)?;
        encoder
            .finish()
            .map_err(|e| ShrinkError::Compression(format!("LZ4 frame: {e}")))?;
    }
    counter.flush()?;
    Ok(counter.count)
}

/// Считает записанные байты.
struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Compression
////////////////////////////////////////////////////////////////////////////////

impl std::fmt::Display for Compression {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Lz4 => write!(f, "lz4"),
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "no" | "off" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "lz4" => Ok(Compression::Lz4),
            _ => Err(format!("Unknown compression '{s}'. Use: none, gzip, lz4")),
        }
    }
}
