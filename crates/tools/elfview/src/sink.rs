//! Terminal output sink for report text and diagnostics.

use std::io::{self, BufWriter, Write};

/// Where bytes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output (file descriptor 1).
    Stdout,
    /// Standard error (file descriptor 2).
    Stderr,
}

/// Write every byte of `bytes` to `stream` and flush it.
///
/// Returns once all bytes are accepted or on the first write error.
pub fn write_all(stream: OutputStream, bytes: &[u8]) -> io::Result<()> {
    match stream {
        OutputStream::Stdout => write_to(&mut BufWriter::new(io::stdout().lock()), bytes),
        OutputStream::Stderr => write_to(&mut io::stderr().lock(), bytes),
    }
}

/// Write and flush `bytes` into any writer.
pub fn write_to(out: &mut impl Write, bytes: &[u8]) -> io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_all_bytes() {
        let mut out = Vec::new();
        write_to(&mut out, b"400\n").unwrap();
        write_to(&mut out, &[0xff, 0x00]).unwrap();
        assert_eq!(out, b"400\n\xff\x00");
    }

    #[test]
    fn reports_write_errors() {
        let mut full = [0u8; 2];
        let mut cursor = io::Cursor::new(&mut full[..]);
        assert!(write_to(&mut cursor, b"abc").is_err());
    }
}
