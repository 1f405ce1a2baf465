//! JSON Lines input.
//!
//! Event logs hold one JSON document per line:
//! ```jsonl
//! {"user": {"id": 1}, "payload": {"app": "maps"}}
//! {"user": {"id": 2}, "payload": {"app": "mail"}}
//! ```
//! Lines are yielded as raw bytes; decoding and parsing happen later so they
//! can run in parallel and a malformed line only affects itself.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AffinityError, Result};

/// Iterator over the non-blank lines of a JSONL source.
pub struct JsonlLines<R> {
    reader: R,
    line_number: usize,
}

impl JsonlLines<BufReader<File>> {
    /// Open a JSONL file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AffinityError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open JSONL file {}: {e}", path.display()),
            ))
        })?;
        Ok(JsonlLines::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlLines<R> {
    /// Wrap any buffered reader.
    pub fn new(reader: R) -> Self {
        JsonlLines {
            reader,
            line_number: 0,
        }
    }

    /// Number of physical lines consumed so far, blank lines included.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for JsonlLines<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        loop {
            line.clear();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim_ascii();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(Ok(trimmed.to_vec()));
                }
                Err(e) => return Some(Err(AffinityError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_skips_blank_lines() {
        let input = "{\"a\": 1}\n\n   \n{\"a\": 2}\n";
        let mut lines = JsonlLines::new(Cursor::new(input));

        assert_eq!(lines.next().unwrap().unwrap(), br#"{"a": 1}"#);
        assert_eq!(lines.next().unwrap().unwrap(), br#"{"a": 2}"#);
        assert!(lines.next().is_none());
        assert_eq!(lines.line_number(), 4);
    }

    #[test]
    fn test_last_line_without_newline() {
        let lines: Vec<Vec<u8>> = JsonlLines::new(Cursor::new("x\r\ny"))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lines, vec![b"x".to_vec(), b"y".to_vec()]);
    }

    #[test]
    fn test_invalid_utf8_is_yielded_not_failed() {
        let input: &[u8] = b"{\"a\": 1}\n{\"a\": \"\xff\xfe\"}\n{\"a\": 2}\n";
        let lines: Vec<Vec<u8>> = JsonlLines::new(Cursor::new(input))
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], b"{\"a\": \"\xff\xfe\"}".to_vec());
    }

    #[test]
    fn test_open_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"user": 1, "app": "maps"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"user": 2, "app": "mail"}}"#).unwrap();
        file.flush().unwrap();

        let lines: Vec<_> = JsonlLines::open(file.path()).unwrap().collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            JsonlLines::open("/nonexistent/events.jsonl"),
            Err(AffinityError::Io(_))
        ));
    }
}
