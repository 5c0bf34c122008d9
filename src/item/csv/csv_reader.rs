use csv::{Position, ReaderBuilder, StringRecord, Trim};
use log::debug;
use std::{cell::RefCell, collections::VecDeque};

use crate::{
    catalog::record::{RawRecord, normalize_header},
    core::item::{ItemReader, ItemReaderResult},
    error::BatchError,
};

/// A CSV item reader that yields one [`RawRecord`] per data row.
///
/// The first non-blank row is the header. Header names are normalized so
/// `Publication Year`, `publication_year` and ` PUBLICATION_YEAR ` all address
/// the same field.
///
/// # Implementation Details
///
/// - The whole text is parsed when the reader is built, so the number of data
///   rows is known before the first `read` and progress can be reported
/// - Quoted cells may contain the delimiter, doubled quotes and line breaks
/// - Every cell is trimmed, including quoted ones
/// - Blank rows are skipped, short rows are padded with empty strings and
///   cells beyond the header are dropped
/// - A row that cannot be decoded becomes a read error for that row only
///
/// # Examples
///
/// ```
/// use library_batch::item::csv::csv_reader::CsvRecordReaderBuilder;
/// use library_batch::core::item::ItemReader;
///
/// let data = "title,author\nDune,Frank Herbert\n\nEmma,Jane Austen";
///
/// let reader = CsvRecordReaderBuilder::new().from_text(data);
/// assert_eq!(reader.size_hint(), Some(2));
///
/// let record = reader.read().unwrap().unwrap();
/// assert_eq!(record.value("title"), Some("Dune"));
/// assert_eq!(record.index, 1);
/// ```
pub struct CsvRecordReader {
    headers: Vec<String>,
    total: usize,
    records: RefCell<VecDeque<Result<RawRecord, BatchError>>>,
}

impl CsvRecordReader {
    /// Normalized header names, in file order. Empty when the text had no
    /// header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows, including rows that failed to decode.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl ItemReader<RawRecord> for CsvRecordReader {
    fn read(&self) -> ItemReaderResult<RawRecord> {
        match self.records.borrow_mut().pop_front() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(error)) => Err(error),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// A builder for configuring CSV record reading.
///
/// # Default Configuration
///
/// - Delimiter: comma (,)
/// - Trimming: all fields trimmed
#[derive(Default)]
pub struct CsvRecordReaderBuilder {
    delimiter: u8,
}

impl CsvRecordReaderBuilder {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Sets the field delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parses `text` and returns a reader over its data rows.
    pub fn from_text(self, text: &str) -> CsvRecordReader {
        let rdr = ReaderBuilder::new()
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut headers: Option<Vec<String>> = None;
        let mut records = VecDeque::new();

        for result in rdr.into_records() {
            let row = match result {
                Ok(row) => row,
                Err(error) => {
                    // Rows before the header cannot be attributed to a record
                    if headers.is_some() {
                        let line = error
                            .position()
                            .map_or(0, |position| line_at(text, position));
                        records.push_back(Err(BatchError::ItemReader(format!(
                            "line {line}: {error}"
                        ))));
                    }
                    continue;
                }
            };

            if is_blank(&row) {
                continue;
            }

            match &headers {
                None => headers = Some(row.iter().map(normalize_header).collect()),
                Some(names) => {
                    let index = records.len() + 1;
                    records.push_back(Ok(to_record(text, index, names, &row)));
                }
            }
        }

        let headers = headers.unwrap_or_default();
        let total = records.len();
        debug!(
            "Parsed {} data rows with columns [{}]",
            total,
            headers.join(", ")
        );

        CsvRecordReader {
            headers,
            total,
            records: RefCell::new(records),
        }
    }
}

fn is_blank(row: &StringRecord) -> bool {
    row.iter().all(str::is_empty)
}

/// 1-based line where the record at `position` starts.
///
/// `Position::line` does not count the empty lines the parser skips, and the
/// position itself is taken before skipping them, so the line is derived from
/// the byte offset past any leading line breaks.
fn line_at(text: &str, position: &Position) -> u64 {
    let bytes = text.as_bytes();
    let offset = (position.byte() as usize).min(bytes.len());
    let start = offset
        + bytes[offset..]
            .iter()
            .take_while(|&&byte| byte == b'\n' || byte == b'\r')
            .count();

    bytes[..start].iter().filter(|&&byte| byte == b'\n').count() as u64 + 1
}

fn to_record(text: &str, index: usize, headers: &[String], row: &StringRecord) -> RawRecord {
    let line = row.position().map_or(0, |position| line_at(text, position));
    let fields = headers
        .iter()
        .enumerate()
        .map(|(position, name)| (name.clone(), row.get(position).unwrap_or("").to_string()))
        .collect();

    RawRecord::new(index, line, fields)
}
