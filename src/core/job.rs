use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use chrono::{Local, NaiveDate};
use log::{error, info};
use uuid::Uuid;

use crate::{
    BatchError, FormatError,
    catalog::{BookProcessor, EntityKind, MemberProcessor, RawRecord, Selection},
    item::{
        csv::{
            csv_reader::{CsvRecordReader, CsvRecordReaderBuilder},
            csv_writer::BookCsvWriterBuilder,
        },
        logger::LoggerWriter,
        store::{BookFilter, CatalogStore, StoreItemWriter},
    },
};

use super::{
    item::{ItemProcessor, ItemWriter},
    step::{RecordFailure, StepBuilder, StepExecution, StepListener, StepStatus},
};

type JobResult<T> = Result<T, BatchError>;

/// Result of one import run.
#[derive(Debug)]
pub struct ImportOutcome {
    pub run_id: Uuid,
    pub kind: EntityKind,
    pub file_name: String,
    pub dry_run: bool,
    /// Data rows found in the file.
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub failures: Vec<RecordFailure>,
    pub status: StepStatus,
    pub duration: Duration,
}

impl ImportOutcome {
    fn from_execution(
        run_id: Uuid,
        kind: EntityKind,
        file_name: &str,
        dry_run: bool,
        total: usize,
        execution: StepExecution,
    ) -> Self {
        Self {
            run_id,
            kind,
            file_name: file_name.to_string(),
            dry_run,
            total,
            success_count: execution.write_count,
            failed_count: execution.failed_count,
            failures: execution.failures,
            status: execution.status,
            duration: execution.duration,
        }
    }

    /// One-line summary suitable for a notification.
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Validated" } else { "Imported" };
        if self.failed_count == 0 {
            format!("{} {} {}s", verb, self.success_count, self.kind)
        } else {
            format!(
                "{} {} {}s, {} failed",
                verb, self.success_count, self.kind, self.failed_count
            )
        }
    }
}

/// Clears the busy flag of a job when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Imports a CSV file of books or members into a [`CatalogStore`].
///
/// Records are handled one at a time and each one is persisted on its own,
/// so a failing record never blocks the others and never rolls back the ones
/// already saved. A job runs one import at a time.
pub struct ImportJob<'a> {
    name: String,
    store: &'a dyn CatalogStore,
    kind: EntityKind,
    listener: Option<&'a dyn StepListener>,
    dry_run: bool,
    delimiter: u8,
    running: AtomicBool,
}

impl ImportJob<'_> {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Imports the file at `path`.
    pub fn run_path(&self, path: &Path) -> JobResult<ImportOutcome> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        check_extension(&file_name)?;

        let text = fs::read_to_string(path)?;
        self.run(&file_name, &text)
    }

    /// Imports `text`, the content of a file named `file_name`.
    ///
    /// Fails without touching the store when another run is in progress,
    /// when the name does not end in `.csv` or when the file has no data rows.
    /// Everything else is reported per record in the outcome.
    pub fn run(&self, file_name: &str, text: &str) -> JobResult<ImportOutcome> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(BatchError::ImportInProgress);
        }
        let _guard = RunGuard(&self.running);

        check_extension(file_name)?;

        let reader = CsvRecordReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_text(text);
        if reader.is_empty() {
            return Err(FormatError::EmptyFile.into());
        }

        let owner_id = match self.store.current_user_id() {
            Some(owner_id) => Some(owner_id),
            None if self.dry_run => Some(Uuid::nil()),
            None => {
                error!(
                    "Import of {} rejected: {}",
                    file_name,
                    BatchError::Authentication
                );
                None
            }
        };

        let run_id = Uuid::new_v4();
        let total = reader.len();
        info!(
            "Start of {} import {} ({}): {} rows from {}",
            self.kind, self.name, run_id, total, file_name
        );

        let execution = match (self.kind, self.dry_run) {
            (EntityKind::Book, false) => self.execute(
                &reader,
                &BookProcessor::new(owner_id),
                &StoreItemWriter::new(self.store),
            ),
            (EntityKind::Book, true) => {
                self.execute(&reader, &BookProcessor::new(owner_id), &LoggerWriter::default())
            }
            (EntityKind::Member, false) => self.execute(
                &reader,
                &MemberProcessor::new(owner_id),
                &StoreItemWriter::new(self.store),
            ),
            (EntityKind::Member, true) => self.execute(
                &reader,
                &MemberProcessor::new(owner_id),
                &LoggerWriter::default(),
            ),
        }?;

        let outcome =
            ImportOutcome::from_execution(run_id, self.kind, file_name, self.dry_run, total, execution);
        info!("End of import {}: {}", run_id, outcome.summary());

        Ok(outcome)
    }

    fn execute<W>(
        &self,
        reader: &CsvRecordReader,
        processor: &dyn ItemProcessor<RawRecord, W>,
        writer: &dyn ItemWriter<W>,
    ) -> JobResult<StepExecution> {
        let mut builder = StepBuilder::new()
            .name(self.name.clone())
            .reader(reader)
            .processor(processor)
            .writer(writer);
        if let Some(listener) = self.listener {
            builder = builder.listener(listener);
        }

        builder.build()?.execute()
    }
}

fn check_extension(file_name: &str) -> Result<(), FormatError> {
    let is_csv = Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        Ok(())
    } else {
        Err(FormatError::Extension(file_name.to_string()))
    }
}

#[derive(Default)]
pub struct ImportJobBuilder<'a> {
    name: Option<String>,
    store: Option<&'a dyn CatalogStore>,
    kind: EntityKind,
    listener: Option<&'a dyn StepListener>,
    dry_run: bool,
    delimiter: Option<u8>,
}

impl<'a> ImportJobBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn store(mut self, store: &'a dyn CatalogStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn kind(mut self, kind: EntityKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn listener(mut self, listener: &'a dyn StepListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Validate and transform every record but persist nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn build(self) -> JobResult<ImportJob<'a>> {
        let store = self
            .store
            .ok_or_else(|| BatchError::Configuration("an import needs a store".to_string()))?;

        Ok(ImportJob {
            name: self.name.unwrap_or_else(super::build_name),
            store,
            kind: self.kind,
            listener: self.listener,
            dry_run: self.dry_run,
            delimiter: self.delimiter.unwrap_or(b','),
            running: AtomicBool::new(false),
        })
    }
}

/// Which books an export covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportScope {
    All,
    Selected(Vec<i64>),
}

impl ExportScope {
    fn prefix(&self) -> &'static str {
        match self {
            ExportScope::All => "all",
            ExportScope::Selected(_) => "selected",
        }
    }
}

impl From<&Selection> for ExportScope {
    fn from(selection: &Selection) -> Self {
        ExportScope::Selected(selection.ids().to_vec())
    }
}

/// A serialized export, ready to be saved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
    pub count: usize,
}

impl ExportFile {
    /// Writes the file under `dir` and returns its path.
    pub fn write_to_dir(&self, dir: &Path) -> JobResult<PathBuf> {
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.content)?;
        info!("Exported {} books to {}", self.count, path.display());
        Ok(path)
    }
}

/// Serializes books of the signed-in owner to CSV, ordered by title.
pub struct ExportJob<'a> {
    store: &'a dyn CatalogStore,
    delimiter: u8,
}

impl<'a> ExportJob<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self {
            store,
            delimiter: b',',
        }
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Exports `scope`, naming the file after `date`.
    ///
    /// Fails with [`BatchError::NothingToExport`] when the scope matches no
    /// book; no file is produced then.
    pub fn run(&self, scope: &ExportScope, date: NaiveDate) -> JobResult<ExportFile> {
        let mut filter = BookFilter::new();
        if let Some(owner_id) = self.store.current_user_id() {
            filter = filter.owner(owner_id);
        }
        if let ExportScope::Selected(ids) = scope {
            filter = filter.ids(ids);
        }

        let books = self.store.query_books(&filter)?;
        if books.is_empty() {
            info!("Export of {} books skipped: nothing to export", scope.prefix());
            return Err(BatchError::NothingToExport);
        }

        let writer = BookCsvWriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        writer.open()?;
        for book in &books {
            writer.write(book)?;
        }
        writer.flush()?;

        let content = String::from_utf8(writer.into_inner()?)
            .map_err(|err| BatchError::ItemWriter(err.to_string()))?;

        Ok(ExportFile {
            file_name: format!(
                "{}_books_export_{}.csv",
                scope.prefix(),
                date.format("%Y-%m-%d")
            ),
            content,
            count: books.len(),
        })
    }

    /// Same as [`ExportJob::run`], dated today in local time.
    pub fn run_today(&self, scope: &ExportScope) -> JobResult<ExportFile> {
        self.run(scope, Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::NaiveDate;
    use uuid::Uuid;

    use crate::{
        BatchError, FormatError,
        catalog::{Book, Category, EntityKind},
        item::store::{CatalogStore, SqliteStore},
    };

    use super::{ExportJob, ExportScope, ImportJobBuilder};

    const BOOKS: &str = "\
title,author,isbn,category,publication_year,publisher
Dune,Frank Herbert,9780441013593,Science Fiction,1965,Ace
Emma,Jane Austen,9780141439587,Romance,1815,Penguin
";

    fn store() -> SqliteStore {
        SqliteStore::in_memory()
            .unwrap()
            .with_user(Some(Uuid::new_v4()))
    }

    #[test]
    fn second_run_while_busy_is_rejected() {
        let store = store();
        let job = ImportJobBuilder::new().store(&store).build().unwrap();

        job.running.store(true, Ordering::SeqCst);
        let result = job.run("books.csv", BOOKS);

        assert!(matches!(result, Err(BatchError::ImportInProgress)));
        assert!(store.query_books(&Default::default()).unwrap().is_empty());
    }

    #[test]
    fn busy_flag_is_cleared_after_each_run() {
        let store = store();
        let job = ImportJobBuilder::new().store(&store).build().unwrap();

        assert!(job.run("books.txt", BOOKS).is_err());
        assert!(!job.is_running());

        let outcome = job.run("books.csv", BOOKS).unwrap();
        assert!(!job.is_running());
        assert_eq!(outcome.success_count, 2);
    }

    #[test]
    fn extension_check_ignores_case() {
        let store = store();
        let job = ImportJobBuilder::new().store(&store).build().unwrap();

        assert!(job.run("BOOKS.CSV", BOOKS).is_ok());
        assert!(matches!(
            job.run("books.xlsx", BOOKS),
            Err(BatchError::Format(FormatError::Extension(name))) if name == "books.xlsx"
        ));
    }

    #[test]
    fn dry_run_persists_nothing() {
        let store = store();
        let job = ImportJobBuilder::new()
            .store(&store)
            .kind(EntityKind::Book)
            .dry_run(true)
            .build()
            .unwrap();

        let outcome = job.run("books.csv", BOOKS).unwrap();

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.summary(), "Validated 2 books");
        assert!(store.query_books(&Default::default()).unwrap().is_empty());
    }

    #[test]
    fn builder_requires_a_store() {
        assert!(matches!(
            ImportJobBuilder::new().build(),
            Err(BatchError::Configuration(_))
        ));
    }

    #[test]
    fn export_file_is_named_after_scope_and_date() {
        let store = store();
        let owner = store.current_user_id().unwrap();
        let id = store
            .insert_book(&Book::new(
                owner,
                "Dune",
                "Frank Herbert",
                "9780441013593",
                Category::ScienceFiction,
                1965,
                "Ace",
            ))
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let export = ExportJob::new(&store);

        let all = export.run(&ExportScope::All, date).unwrap();
        let selected = export.run(&ExportScope::Selected(vec![id]), date).unwrap();

        assert_eq!(all.file_name, "all_books_export_2024-03-09.csv");
        assert_eq!(selected.file_name, "selected_books_export_2024-03-09.csv");
        assert_eq!(selected.count, 1);
        assert!(matches!(
            export.run(&ExportScope::Selected(vec![]), date),
            Err(BatchError::NothingToExport)
        ));
    }
}
