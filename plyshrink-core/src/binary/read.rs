use std::io::{BufRead, Read};

use plyshrink_types::{PlyError, PlyResult};

use crate::MAX_HEADER_LINE_LEN;

/// Читает одну строку заголовка (до `\n` включительно) в `buf`.
///
/// Возвращает количество потреблённых байт или `None` на EOF. Строка без
/// `\n` в конце допустима только как последняя в потоке.
pub fn read_header_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> PlyResult<Option<usize>> {
    buf.clear();

    let limit = MAX_HEADER_LINE_LEN as u64 + 1;
    let n = reader.by_ref().take(limit).read_until(b'\n', buf)?;

    if n == 0 {
        return Ok(None);
    }

    if n as u64 == limit && buf.last() != Some(&b'\n') {
        return Err(PlyError::invalid_format(format!(
            "header line longer than {MAX_HEADER_LINE_LEN} bytes"
        )));
    }

    Ok(Some(n))
}

/// Декодирует строку заголовка как ASCII и обрезает пробелы по краям
/// (включая `\r` от CRLF).
pub fn decode_header_line(
    raw: &[u8],
    line_no: usize,
) -> PlyResult<&str> {
    if !raw.is_ascii() {
        return Err(PlyError::invalid_format(format!(
            "header line {line_no} is not ASCII"
        )));
    }

    // ASCII всегда валидный UTF-8
    std::str::from_utf8(raw)
        .map(str::trim)
        .map_err(|e| PlyError::invalid_format(format!("header line {line_no}: {e}")))
}
