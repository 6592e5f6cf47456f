use std::io::Write;

/// Пишет строки заголовка, каждая завершается одним `\n`.
///
/// Возвращает число записанных байт.
pub fn write_header_lines<W: Write, S: AsRef<str>>(
    writer: &mut W,
    lines: &[S],
) -> std::io::Result<u64> {
    let mut written = 0u64;

    for line in lines {
        let line = line.as_ref().as_bytes();
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
        written += line.len() as u64 + 1;
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_newline_terminated() {
        let mut out = Vec::new();
        let n = write_header_lines(&mut out, &["ply", "end_header"]).unwrap();
        assert_eq!(out, b"ply\nend_header\n");
        assert_eq!(n, out.len() as u64);
    }
}
