//! CSV support for catalog import and export.
//!
//! # Module Architecture
//!
//! 1. **CsvRecordReader**: parses uploaded text into [`RawRecord`]s, one per
//!    non-blank data row, keyed by the normalized header names. It is the
//!    reader side of every import step.
//!
//! 2. **BookCsvWriter**: serializes books back into the export format with a
//!    fixed header, quoted text columns and bare numeric columns.
//!
//! Both components follow the builder pattern.
//!
//! # Round trip
//!
//! Export headers normalize to the import column names, so an exported file
//! can be imported again as is. Cells are trimmed on import, quoted or not,
//! so leading and trailing spaces of a stored value do not survive the trip:
//!
//! ```
//! use library_batch::catalog::{Book, Category};
//! use library_batch::core::item::{ItemReader, ItemWriter};
//! use library_batch::item::csv::csv_reader::CsvRecordReaderBuilder;
//! use library_batch::item::csv::csv_writer::BookCsvWriterBuilder;
//! use uuid::Uuid;
//!
//! let book = Book::new(Uuid::nil(), "Emma", "Jane Austen", "123", Category::Romance, 1815, "Murray");
//!
//! let writer = BookCsvWriterBuilder::new().from_writer(vec![]);
//! writer.open().unwrap();
//! writer.write(&book).unwrap();
//! writer.flush().unwrap();
//! let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
//!
//! let reader = CsvRecordReaderBuilder::new().from_text(&text);
//! let record = reader.read().unwrap().unwrap();
//! assert_eq!(record.value("publication_year"), Some("1815"));
//! assert_eq!(record.value("category"), Some("Romance"));
//! ```
//!
//! [`RawRecord`]: crate::catalog::RawRecord

/// A module providing facilities for reading CSV data records.
pub mod csv_reader;

/// A module providing facilities for writing CSV data records.
pub mod csv_writer;
