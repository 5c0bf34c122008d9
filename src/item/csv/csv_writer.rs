use std::{
    cell::RefCell,
    io::{self, Write},
    result,
};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};

use crate::{
    BatchError,
    catalog::{Book, record::normalize_header},
    core::item::{ItemWriter, ItemWriterResult},
};

/// Export header, in column order.
pub const EXPORT_HEADERS: [&str; 16] = [
    "Title",
    "Author",
    "ISBN",
    "Category",
    "Publication Year",
    "Publisher",
    "Description",
    "Price",
    "Status",
    "Stock",
    "Language",
    "Page Count",
    "Location",
    "Cover Image",
    "Tags",
    "Rating",
];

/// Import column that an export column maps back to.
///
/// ```
/// use library_batch::item::csv::csv_writer::export_column_to_import;
///
/// assert_eq!(export_column_to_import("Publication Year"), "publication_year");
/// assert_eq!(export_column_to_import("ISBN"), "isbn");
/// ```
pub fn export_column_to_import(column: &str) -> String {
    normalize_header(column)
}

/// Writes books as CSV for download.
///
/// Text columns are wrapped in double quotes with inner quotes doubled;
/// numeric columns are written bare. Tags are joined with `;` before quoting.
/// The header is written by `open`.
pub struct BookCsvWriter<T: Write> {
    wrapper: RefCell<Writer<T>>,
}

impl<T: Write> ItemWriter<Book> for BookCsvWriter<T> {
    fn write(&self, item: &Book) -> ItemWriterResult {
        let record = [
            quote(&item.title),
            quote(&item.author),
            quote(&item.isbn),
            quote(item.category.as_str()),
            item.publication_year.to_string(),
            quote(&item.publisher),
            quote(&item.description),
            item.price.to_string(),
            quote(item.status.as_str()),
            item.stock.to_string(),
            quote(&item.language),
            item.page_count.to_string(),
            quote(&item.location),
            quote(&item.cover_image),
            quote(&item.tags.join(";")),
            item.rating.to_string(),
        ];

        self.wrapper
            .borrow_mut()
            .write_record(&record)
            .map_err(|error| BatchError::ItemWriter(error.to_string()))
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    fn flush(&self) -> ItemWriterResult {
        self.wrapper
            .borrow_mut()
            .flush()
            .map_err(|error| BatchError::ItemWriter(error.to_string()))
    }

    fn open(&self) -> ItemWriterResult {
        self.wrapper
            .borrow_mut()
            .write_record(EXPORT_HEADERS)
            .map_err(|error| BatchError::ItemWriter(error.to_string()))
    }
}

impl<T: Write> BookCsvWriter<T> {
    pub fn into_inner(self) -> result::Result<T, BatchError> {
        self.wrapper
            .into_inner()
            .into_inner()
            .map_err(|error| BatchError::ItemWriter(error.to_string()))
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[derive(Default)]
pub struct BookCsvWriterBuilder {
    delimiter: u8,
}

impl BookCsvWriterBuilder {
    pub fn new() -> BookCsvWriterBuilder {
        BookCsvWriterBuilder { delimiter: b',' }
    }

    pub fn delimiter(mut self, delimiter: u8) -> BookCsvWriterBuilder {
        self.delimiter = delimiter;
        self
    }

    /// Quoting is done per column by the writer itself, so the underlying
    /// `csv` writer never adds quotes of its own.
    pub fn from_writer<W: io::Write>(self, wtr: W) -> BookCsvWriter<W> {
        let wtr = WriterBuilder::new()
            .flexible(false)
            .has_headers(false)
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(wtr);

        BookCsvWriter {
            wrapper: RefCell::new(wtr),
        }
    }
}
