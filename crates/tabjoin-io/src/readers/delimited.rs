//! Newline-delimited records split on a single separator.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tabjoin_core::row::{split_row, Row};

use crate::error::{Error, Result};

/// Yields one `Row` per input line. `\n` and `\r\n` endings are stripped;
/// a final line without a terminator is still a row. Bytes that are not
/// valid UTF-8 decode to U+FFFD instead of failing the line.
pub struct DelimitedReader<R: BufRead> {
    inner: R,
    separator: char,
    line: Vec<u8>,
    line_no: usize,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(inner: R, separator: char) -> Self {
        Self {
            inner,
            separator,
            line: Vec::new(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for DelimitedReader<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line.clear();
        match self.inner.read_until(b'\n', &mut self.line) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let mut bytes = self.line.as_slice();
                if let Some(stripped) = bytes.strip_suffix(b"\n") {
                    bytes = stripped.strip_suffix(b"\r").unwrap_or(stripped);
                }
                Some(Ok(split_row(&String::from_utf8_lossy(bytes), self.separator)))
            }
            Err(source) => Some(Err(Error::Read {
                line: self.line_no + 1,
                source,
            })),
        }
    }
}

/// Read the whole side table eagerly.
pub fn read_side_table<P: AsRef<Path>>(
    path: P,
    separator: char,
    buffer_bytes: usize,
) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })?;
    DelimitedReader::new(BufReader::with_capacity(buffer_bytes, file), separator).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn read_all(input: &str, sep: char) -> Vec<Vec<String>> {
        DelimitedReader::new(input.as_bytes(), sep)
            .map(|r| r.unwrap().fields)
            .collect()
    }

    #[test]
    fn splits_lines_and_strips_terminators() {
        assert_eq!(
            read_all("1,2\r\n3,4\n5,6", ','),
            vec![vec!["1", "2"], vec!["3", "4"], vec!["5", "6"]]
        );
    }

    #[test]
    fn no_phantom_row_after_final_newline() {
        assert_eq!(read_all("a\n", ',').len(), 1);
        assert!(read_all("", ',').is_empty());
    }

    #[test]
    fn blank_lines_become_single_empty_field() {
        assert_eq!(read_all("a\n\nb\n", ','), vec![vec!["a"], vec![""], vec!["b"]]);
    }

    #[test]
    fn invalid_utf8_line_is_decoded_lossily() {
        let input: &[u8] = b"1,2\n\xff,3\n4,5\n";
        let rows: Vec<_> = DelimitedReader::new(input, ',')
            .map(|r| r.unwrap().fields)
            .collect();
        assert_eq!(
            rows,
            vec![vec!["1", "2"], vec!["\u{FFFD}", "3"], vec!["4", "5"]]
        );
    }

    #[test]
    fn small_buffer_still_reads_long_lines() {
        let data = "a".repeat(100) + ",b\n";
        let reader = BufReader::with_capacity(8, data.as_bytes());
        let rows: Vec<_> = DelimitedReader::new(reader, ',').collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].as_ref().unwrap().get(0).map(str::len), Some(100));
    }

    #[test]
    fn custom_separator() {
        assert_eq!(read_all("a\tb\tc\n", '\t'), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn side_table_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "k1,X\nk2,Y\n").unwrap();
        let rows = read_side_table(file.path(), ',', 16).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].fields, vec!["k2", "Y"]);
    }

    #[test]
    fn missing_side_table_reports_path() {
        let err = read_side_table("/definitely/not/here.csv", ',', 16).unwrap_err();
        assert!(matches!(err, Error::Open { .. }));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}
