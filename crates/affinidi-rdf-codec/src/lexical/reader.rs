use std::io::{BufRead, ErrorKind as IoErrorKind};

use crate::error::{Position, RdfError, Result};
use crate::options::CancellationSignal;

/// Read the next physical line (without its `\n` or `\r\n` terminator).
///
/// Returns `Ok(None)` at end of input. A line longer than `max` bytes fails
/// with [`RdfError::LineTooLong`] after the rest of that physical line has
/// been discarded, so the next call starts on the following line. The
/// terminator does not count toward `max`. A `max` of zero means unlimited.
pub fn read_line_with_limit<R: BufRead + ?Sized>(
    reader: &mut R,
    max: usize,
) -> Result<Option<Vec<u8>>> {
    read_line_counting(reader, max, &mut 0)
}

/// [`read_line_with_limit`], adding every byte taken from `reader` to
/// `consumed`: terminator and discarded overflow included.
fn read_line_counting<R: BufRead + ?Sized>(
    reader: &mut R,
    max: usize,
    consumed: &mut u64,
) -> Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    let mut seen_any = false;
    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if available.is_empty() {
            break;
        }
        seen_any = true;
        let newline = available.iter().position(|&b| b == b'\n');
        let chunk_len = newline.unwrap_or(available.len());
        let used = newline.map_or(chunk_len, |i| i + 1);

        // A trailing `\r` may be half of a CRLF terminator.
        let last = if chunk_len > 0 {
            available.get(chunk_len - 1)
        } else {
            line.last()
        };
        let carriage = usize::from(last == Some(&b'\r'));

        if max > 0 && line.len() + chunk_len - carriage > max {
            reader.consume(used);
            *consumed += used as u64;
            if newline.is_none() {
                *consumed += reader.skip_until(b'\n')? as u64;
            }
            return Err(RdfError::LineTooLong { limit: max });
        }

        line.extend_from_slice(&available[..chunk_len]);
        reader.consume(used);
        *consumed += used as u64;
        if newline.is_some() {
            break;
        }
    }
    if !seen_any {
        return Ok(None);
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Line-bounded reader that tracks line numbers and byte offsets and checks
/// for cancellation before each line.
pub struct LineReader<R> {
    reader: R,
    max_line_bytes: usize,
    cancel: Option<CancellationSignal>,
    line_number: u64,
    line_start: u64,
    offset: u64,
    format: &'static str,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R, max_line_bytes: usize, format: &'static str) -> Self {
        Self {
            reader,
            max_line_bytes,
            cancel: None,
            line_number: 0,
            line_start: 0,
            offset: 0,
            format,
        }
    }

    pub fn with_cancellation(mut self, cancel: Option<CancellationSignal>) -> Self {
        self.cancel = cancel;
        self
    }

    /// 1-based number of the line most recently returned.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Byte offset of the start of the line most recently returned.
    pub fn line_offset(&self) -> u64 {
        self.line_start
    }

    /// Return the next line as UTF-8 text.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        if let Some(cancel) = &self.cancel {
            cancel.check()?;
        }
        let mut consumed = 0;
        let read = read_line_counting(&mut self.reader, self.max_line_bytes, &mut consumed);
        let start = self.offset;
        self.offset += consumed;
        match read {
            Ok(Some(bytes)) => {
                self.line_number += 1;
                self.line_start = start;
                String::from_utf8(bytes).map(Some).map_err(|e| {
                    RdfError::parse(format!("invalid UTF-8: {e}")).with_position(
                        self.format,
                        Position::new(self.line_number, 0, start as i64),
                        "",
                    )
                })
            }
            Ok(None) => Ok(None),
            Err(e @ RdfError::LineTooLong { .. }) => {
                self.line_number += 1;
                Err(e.with_position(
                    self.format,
                    Position::new(self.line_number, 0, start as i64),
                    "",
                ))
            }
            Err(e) => Err(e),
        }
    }
}
