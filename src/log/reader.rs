use std::io::{self, BufRead};

/// Separator the history logging sink writes after every JSON record.
pub const RECORD_SEPARATOR: &str = "\n\u{1}";

/// One separator-delimited chunk of the history file, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    /// 1-based position among non-empty chunks.
    pub index: usize,
    pub text: String,
}

/// Lazy, single-pass splitter over a history stream.
///
/// Empty chunks (leading/trailing separators, blank padding) are skipped.
/// A chunk that is not valid UTF-8 surfaces as `io::ErrorKind::InvalidData`.
/// After the first error the iterator is exhausted.
pub struct RecordReader<R> {
    inner: R,
    separator: Vec<u8>,
    index: usize,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    /// `separator` must be non-empty.
    pub fn new(inner: R, separator: &str) -> Self {
        debug_assert!(!separator.is_empty());
        Self {
            inner,
            separator: separator.as_bytes().to_vec(),
            index: 0,
            done: false,
        }
    }

    /// Read up to and excluding the next separator. Returns true at EOF.
    fn read_chunk(&mut self, buf: &mut Vec<u8>) -> io::Result<bool> {
        let Some(&last) = self.separator.last() else {
            return self.inner.read_to_end(buf).map(|_| true);
        };
        loop {
            if self.inner.read_until(last, buf)? == 0 {
                return Ok(true);
            }
            if buf.ends_with(&self.separator) {
                buf.truncate(buf.len() - self.separator.len());
                return Ok(false);
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = io::Result<RawChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let mut buf = Vec::new();
            match self.read_chunk(&mut buf) {
                Ok(eof) => self.done = eof,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }

            let text = match String::from_utf8(buf) {
                Ok(t) => t,
                Err(e) => {
                    self.done = true;
                    return Some(Err(io::Error::new(io::ErrorKind::InvalidData, e)));
                }
            };

            let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c.is_control());
            if trimmed.is_empty() {
                continue;
            }

            self.index += 1;
            return Some(Ok(RawChunk {
                index: self.index,
                text: trimmed.to_string(),
            }));
        }
        None
    }
}
