//! Формат PLY: текстовый заголовок и бинарные записи вершин.
//!
//! ```text
//! ply
//! format binary_little_endian 1.0
//! comment ...
//! element vertex <N>
//! property <type> <name>
//! end_header
//! <N * bytes_per_record байт>
//! ```
//!
//! Заголовок читается построчно до `end_header`. Все строки, кроме
//! `element vertex`, переносятся в выходной файл без изменений.

use std::io::{BufRead, Cursor};

use plyshrink_types::{FieldSpec, HeaderLine, PlyError, PlyHeader, PlyResult, SampleSpec, ScalarType};

use crate::binary::{decode_header_line, read_header_line};

/// Магическое слово в первой строке файла
pub const PLY_MAGIC: &str = "ply";

/// Строка-терминатор заголовка
pub const HEADER_TERMINATOR: &str = "end_header";

/// Префикс строки с количеством вершин
pub const VERTEX_ELEMENT_PREFIX: &str = "element vertex";

pub const FORMAT_PREFIX: &str = "format";

pub const PROPERTY_PREFIX: &str = "property";

/// Максимальная длина одной строки заголовка
pub const MAX_HEADER_LINE_LEN: usize = 64 * 1024;

/// Разбор и сериализация заголовка PLY.
pub trait PlyHeaderExt: Sized {
    /// Читает заголовок в любой кодировке. Проверяется только магическое
    /// слово и синтаксис строк.
    ///
    /// Возвращает заголовок и смещение начала данных (байт сразу после
    /// `end_header\n`).
    fn read_from<R: BufRead>(reader: &mut R) -> PlyResult<(Self, usize)>;

    /// Читает заголовок и требует бинарную кодировку.
    fn parse<R: BufRead>(reader: &mut R) -> PlyResult<(Self, usize)>;

    /// [`PlyHeaderExt::parse`] для байтового среза.
    fn parse_bytes(bytes: &[u8]) -> PlyResult<(Self, usize)> {
        Self::parse(&mut Cursor::new(bytes))
    }

    /// Сериализует заголовок; числа в строках `element vertex` делятся
    /// на `sample_step`.
    fn serialize(
        &self,
        sample_step: u64,
    ) -> Vec<u8>;

    /// Параметры прореживания для данного заголовка.
    fn sample_spec(
        &self,
        resolution: f64,
    ) -> PlyResult<SampleSpec>;
}

impl PlyHeaderExt for PlyHeader {
    fn read_from<R: BufRead>(reader: &mut R) -> PlyResult<(Self, usize)> {
        let mut buf = Vec::with_capacity(128);
        let mut offset = 0usize;
        let mut header = PlyHeader::default();

        // Первая строка: магическое слово
        let n = read_header_line(reader, &mut buf)?.unwrap_or(0);
        offset += n;

        let first = decode_header_line(&buf, 1)?;
        if first != PLY_MAGIC {
            return Err(PlyError::invalid_format(format!(
                "not a PLY file: first line is {first:?}, expected {PLY_MAGIC:?}"
            )));
        }
        header.lines.push(HeaderLine::Text(first.to_string()));

        let mut line_no = 1;

        loop {
            line_no += 1;

            let Some(n) = read_header_line(reader, &mut buf)? else {
                return Err(PlyError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("header ended at line {line_no} without {HEADER_TERMINATOR:?}"),
                )));
            };
            offset += n;

            let line = decode_header_line(&buf, line_no)?;

            if line.starts_with(FORMAT_PREFIX) {
                if line.contains("binary") {
                    header.is_binary = true;
                }
                header.lines.push(HeaderLine::Text(line.to_string()));
            } else if line.starts_with(VERTEX_ELEMENT_PREFIX) {
                header.record_count = parse_vertex_count(line, line_no)?;
                header.lines.push(HeaderLine::VertexCount(header.record_count));
            } else if line.starts_with(PROPERTY_PREFIX) {
                header.fields.push(parse_property(line, line_no)?);
                header.lines.push(HeaderLine::Text(line.to_string()));
            } else if line == HEADER_TERMINATOR {
                header.lines.push(HeaderLine::Text(line.to_string()));
                break;
            } else {
                header.lines.push(HeaderLine::Text(line.to_string()));
            }
        }

        Ok((header, offset))
    }

    fn parse<R: BufRead>(reader: &mut R) -> PlyResult<(Self, usize)> {
        let (header, offset) = Self::read_from(reader)?;

        if !header.is_binary {
            return Err(PlyError::unsupported_format(
                "only binary encoding supported",
            ));
        }

        Ok((header, offset))
    }

    fn serialize(
        &self,
        sample_step: u64,
    ) -> Vec<u8> {
        let mut out = Vec::new();

        for line in self.render_lines(sample_step) {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }

        out
    }

    fn sample_spec(
        &self,
        resolution: f64,
    ) -> PlyResult<SampleSpec> {
        SampleSpec::new(resolution, self.record_count)
    }
}

/// Разбирает заголовок бинарного PLY. То же, что [`PlyHeaderExt::parse`].
pub fn parse_header<R: BufRead>(reader: &mut R) -> PlyResult<(PlyHeader, usize)> {
    PlyHeader::parse(reader)
}

fn parse_vertex_count(
    line: &str,
    line_no: usize,
) -> PlyResult<u64> {
    let token = line.split_whitespace().last().unwrap_or_default();

    token.parse::<u64>().map_err(|e| {
        PlyError::invalid_format(format!(
            "line {line_no}: bad vertex count {token:?} in {line:?}: {e}"
        ))
    })
}

fn parse_property(
    line: &str,
    line_no: usize,
) -> PlyResult<FieldSpec> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if tokens.len() < 2 {
        return Err(PlyError::invalid_format(format!(
            "line {line_no}: property without type: {line:?}"
        )));
    }

    let scalar = ScalarType::from_token(tokens[1]);
    let name = tokens[tokens.len() - 1];

    Ok(FieldSpec::new(name, scalar))
}

#[cfg(test)]
mod tests {
    use super::*;

    const XYZ_HEADER: &str = "ply\n\
        format binary_little_endian 1.0\n\
        comment made by scanner\n\
        element vertex 100\n\
        property float x\n\
        property float y\n\
        property float z\n\
        end_header\n";

    #[test]
    fn test_parse_xyz_header() {
        let mut raw = XYZ_HEADER.as_bytes().to_vec();
        raw.extend_from_slice(&[0xAB; 12]);

        let (header, offset) = PlyHeader::parse_bytes(&raw).unwrap();

        assert_eq!(offset, XYZ_HEADER.len());
        assert_eq!(header.record_count, 100);
        assert!(header.is_binary);
        assert_eq!(header.fields.len(), 3);
        assert_eq!(header.fields[0], FieldSpec::new("x", ScalarType::Float32));
        assert_eq!(header.bytes_per_record(), 12);
        assert_eq!(header.lines.len(), 8);
        assert_eq!(header.lines[3], HeaderLine::VertexCount(100));
    }

    #[test]
    fn test_bad_magic_is_invalid_format() {
        let raw = b"plx\nformat binary_little_endian 1.0\nend_header\n";
        let err = PlyHeader::parse_bytes(raw).unwrap_err();
        assert!(matches!(err, PlyError::InvalidFormat(_)), "{err}");
    }

    #[test]
    fn test_empty_input_is_invalid_format() {
        let err = PlyHeader::parse_bytes(b"").unwrap_err();
        assert!(matches!(err, PlyError::InvalidFormat(_)));
    }

    #[test]
    fn test_ascii_is_unsupported() {
        let raw = b"ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nend_header\n1.0\n";
        let err = PlyHeader::parse_bytes(raw).unwrap_err();
        assert!(matches!(err, PlyError::UnsupportedFormat(_)));
        assert!(err.to_string().contains("only binary"));

        // read_from кодировку не проверяет
        let (header, _) = PlyHeader::read_from(&mut Cursor::new(&raw[..])).unwrap();
        assert!(!header.is_binary);
        assert_eq!(header.record_count, 1);
    }

    #[test]
    fn test_missing_terminator_is_io_error() {
        let raw = b"ply\nformat binary_little_endian 1.0\nelement vertex 3\n";
        let err = PlyHeader::parse_bytes(raw).unwrap_err();
        match err {
            PlyError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("ожидалась Io, получено {other:?}"),
        }
    }

    #[test]
    fn test_unknown_types_are_zero_width() {
        let raw = b"ply\n\
            format binary_big_endian 1.0\n\
            element vertex 2\n\
            property double x\n\
            property float y\n\
            property uchar red\n\
            element face 0\n\
            property list uchar int vertex_indices\n\
            end_header\n";
        let (header, _) = PlyHeader::parse_bytes(raw).unwrap();

        assert_eq!(header.fields.len(), 4);
        assert_eq!(header.fields[0].scalar, ScalarType::Other("double".into()));
        assert_eq!(header.fields[3].name, "vertex_indices");
        assert_eq!(header.fields[3].scalar, ScalarType::Other("list".into()));
        // double = 0, float = 4, uchar = 1, list = 0
        assert_eq!(header.bytes_per_record(), 5);
    }

    #[test]
    fn test_crlf_header() {
        let raw = b"ply\r\nformat binary_little_endian 1.0\r\nelement vertex 4\r\nproperty int i\r\nend_header\r\n";
        let (header, offset) = PlyHeader::parse_bytes(raw).unwrap();
        assert_eq!(offset, raw.len());
        assert_eq!(header.record_count, 4);
        assert_eq!(header.render_lines(1)[1], "format binary_little_endian 1.0");
    }

    #[test]
    fn test_bad_vertex_count() {
        let raw = b"ply\nformat binary_little_endian 1.0\nelement vertex lots\nend_header\n";
        assert!(matches!(
            PlyHeader::parse_bytes(raw),
            Err(PlyError::InvalidFormat(_))
        ));

        let raw = b"ply\nformat binary_little_endian 1.0\nelement vertex -3\nend_header\n";
        assert!(matches!(
            PlyHeader::parse_bytes(raw),
            Err(PlyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_property_without_type() {
        let raw = b"ply\nformat binary_little_endian 1.0\nproperty\nend_header\n";
        assert!(matches!(
            PlyHeader::parse_bytes(raw),
            Err(PlyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_serialize_rewrites_only_vertex_line() {
        let (header, _) = PlyHeader::parse_bytes(XYZ_HEADER.as_bytes()).unwrap();

        let same = header.serialize(1);
        assert_eq!(same, XYZ_HEADER.as_bytes());

        let shrunk = String::from_utf8(header.serialize(4)).unwrap();
        assert_eq!(shrunk, XYZ_HEADER.replace("element vertex 100", "element vertex 25"));
    }

    #[test]
    fn test_serialize_each_vertex_line_own_count() {
        let raw = b"ply\n\
            format binary_little_endian 1.0\n\
            element vertex 9\n\
            element vertex 40\n\
            property float x\n\
            end_header\n";

        let (header, _) = PlyHeader::parse_bytes(raw).unwrap();
        // record_count берётся из последней строки
        assert_eq!(header.record_count, 40);
        assert_eq!(header.lines[2], HeaderLine::VertexCount(9));
        assert_eq!(header.lines[3], HeaderLine::VertexCount(40));

        let text = String::from_utf8(header.serialize(4)).unwrap();
        assert_eq!(
            text,
            "ply\n\
             format binary_little_endian 1.0\n\
             element vertex 2\n\
             element vertex 10\n\
             property float x\n\
             end_header\n"
        );
    }

    #[test]
    fn test_sample_spec_from_header() {
        let (header, _) = PlyHeader::parse_bytes(XYZ_HEADER.as_bytes()).unwrap();
        let spec = header.sample_spec(0.25).unwrap();
        assert_eq!(spec.sample_step, 4);
        assert_eq!(spec.sampled_count, 25);
    }

    #[test]
    fn test_parse_header_free_fn() {
        let mut cursor = Cursor::new(XYZ_HEADER.as_bytes());
        let (header, offset) = parse_header(&mut cursor).unwrap();
        assert_eq!(header.record_count, 100);
        assert_eq!(offset as u64, cursor.position());
    }
}
