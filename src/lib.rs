#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # Library Batch

 Bulk CSV import and export for a library catalog of books and members.

 ## Core Concepts

- **ImportJob:** Imports one CSV file of books or members. It rejects the file
  as a whole when it is not a `.csv` or holds no data rows, and otherwise
  reports every record as either saved or failed.
- **Step:** Reads, processes and writes records one at a time. A failing
  record never stops the step.
- **ItemReader:** Yields parsed rows. [`CsvRecordReader`](item::csv::csv_reader::CsvRecordReader)
  maps each data row to its normalized header names.
- **ItemProcessor:** Validates a row and turns it into a [`Book`](catalog::Book)
  or a [`Member`](catalog::Member).
- **ItemWriter:** Persists entities through a [`CatalogStore`](item::store::CatalogStore),
  or logs them on a dry run.
- **ExportJob:** Serializes books to CSV, either the whole catalog or a
  [`Selection`](catalog::Selection).

 ## Getting Started

```rust
use chrono::NaiveDate;
use library_batch::{
    catalog::EntityKind,
    core::job::{ExportJob, ExportScope, ImportJobBuilder},
    item::store::SqliteStore,
    BatchError,
};
use uuid::Uuid;

fn main() -> Result<(), BatchError> {
    let csv = "title,author,isbn,category,publication_year,publisher
    Dune,Frank Herbert,9780441013593,Science Fiction,1965,Ace
    Emma,Jane Austen,9780141439587,Romance,1815,Penguin
    Untitled,,,Fiction,,";

    let store = SqliteStore::in_memory()?.with_user(Some(Uuid::new_v4()));

    let job = ImportJobBuilder::new()
        .store(&store)
        .kind(EntityKind::Book)
        .build()?;
    let outcome = job.run("books.csv", csv)?;

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failed_count, 1);

    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let export = ExportJob::new(&store).run(&ExportScope::All, date)?;

    assert_eq!(export.file_name, "all_books_export_2024-05-01.csv");
    assert_eq!(export.count, 2);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Catalog domain: entities, enumerations, validation and transformation
pub mod catalog;

/// Core module for batch operations
pub mod core;

/// Error types for batch operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Item readers and writers: CSV, logger and catalog store
pub mod item;
