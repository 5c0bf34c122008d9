use std::{
    cell::{Cell, RefCell},
    time::{Duration, Instant},
};

use log::{Level, debug, error, info, log};

use crate::BatchError;

use super::{
    build_name,
    item::{ItemProcessor, ItemReader, ItemWriter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Every item was written.
    Success,
    /// At least one item failed. Items written before and after it stay
    /// written.
    CompletedWithFailures,
}

/// Progress after an item, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    /// `round(100 * processed / total)`.
    pub percent: u8,
}

impl Progress {
    fn new(processed: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100
        } else {
            (processed as f64 * 100.0 / total as f64).round() as u8
        };

        Self {
            processed,
            total,
            percent,
        }
    }
}

/// Why an item did not make it to the writer, or was refused by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Read(String),
    Validation(Vec<String>),
    Persistence(String),
    Authentication,
}

impl FailureReason {
    fn from_processing(err: BatchError) -> Self {
        match err {
            BatchError::Validation(errors) => FailureReason::Validation(errors),
            BatchError::Authentication => FailureReason::Authentication,
            other => FailureReason::Validation(vec![other.to_string()]),
        }
    }

    fn from_writing(err: BatchError) -> Self {
        match err {
            BatchError::Persistence(message) => FailureReason::Persistence(message),
            BatchError::Authentication => FailureReason::Authentication,
            other => FailureReason::Persistence(other.to_string()),
        }
    }

    /// Store and sign-in problems are already reported by the writer and the
    /// job, so the step only traces them.
    fn log_level(&self) -> Level {
        match self {
            FailureReason::Read(_) | FailureReason::Validation(_) => Level::Warn,
            FailureReason::Persistence(_) | FailureReason::Authentication => Level::Debug,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            FailureReason::Read(message) => format!("unreadable row: {message}"),
            FailureReason::Validation(errors) => errors.join("; "),
            FailureReason::Persistence(message) => format!("could not be saved: {message}"),
            FailureReason::Authentication => "no authenticated user".to_string(),
        }
    }
}

/// A failed item and its 1-based position in the reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: usize,
    pub reason: FailureReason,
}

/// Observer of a running step. Both callbacks default to no-ops.
pub trait StepListener {
    fn on_progress(&self, _progress: Progress) {}

    fn on_failure(&self, _failure: &RecordFailure) {}
}

/// Summary of one step execution.
#[derive(Debug)]
pub struct StepExecution {
    pub name: String,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    pub status: StepStatus,
    pub read_count: usize,
    pub write_count: usize,
    pub failed_count: usize,
    pub failures: Vec<RecordFailure>,
}

/// Reads, processes and writes items one at a time.
///
/// Each item ends up either written or failed; a failure never stops the
/// step. The writer is opened before the first item and flushed and closed
/// after the last one.
pub struct Step<'a, R, W> {
    name: String,
    reader: &'a dyn ItemReader<R>,
    processor: &'a dyn ItemProcessor<R, W>,
    writer: &'a dyn ItemWriter<W>,
    listener: Option<&'a dyn StepListener>,
    read_count: Cell<usize>,
    write_count: Cell<usize>,
    failures: RefCell<Vec<RecordFailure>>,
}

impl<R, W> Step<'_, R, W> {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Runs the step to completion.
    ///
    /// Only a writer that cannot be opened is an error; per-item problems
    /// end up in [`StepExecution::failures`].
    pub fn execute(&self) -> Result<StepExecution, BatchError> {
        let start = Instant::now();
        let total = self.reader.size_hint();

        debug!("Start of step: {}", self.name);

        self.writer.open()?;

        let mut position = 0;
        loop {
            let read_result = self.reader.read();
            let item = match read_result {
                Ok(Some(item)) => item,
                Ok(None) => break,
                Err(err) => {
                    position += 1;
                    self.fail(position, FailureReason::Read(err.to_string()));
                    self.report_progress(position, total);
                    continue;
                }
            };

            position += 1;
            self._inc_read_count();
            self.handle_item(position, &item);
            self.report_progress(position, total);
        }

        Self::_log_error(self.writer.flush());
        Self::_log_error(self.writer.close());

        let failures = self.failures.take();
        let status = if failures.is_empty() {
            StepStatus::Success
        } else {
            StepStatus::CompletedWithFailures
        };

        info!(
            "End of step: {}, {} written, {} failed",
            self.name,
            self.write_count.get(),
            failures.len()
        );

        Ok(StepExecution {
            name: self.name.clone(),
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            status,
            read_count: self.read_count.get(),
            write_count: self.write_count.get(),
            failed_count: failures.len(),
            failures,
        })
    }

    fn handle_item(&self, position: usize, item: &R) {
        let processed = match self.processor.process(item) {
            Ok(processed) => processed,
            Err(err) => {
                self.fail(position, FailureReason::from_processing(err));
                return;
            }
        };

        match self.writer.write(&processed) {
            Ok(()) => self._inc_write_count(),
            Err(err) => self.fail(position, FailureReason::from_writing(err)),
        }
    }

    fn fail(&self, index: usize, reason: FailureReason) {
        let failure = RecordFailure { index, reason };

        log!(
            failure.reason.log_level(),
            "Record {} failed: {}",
            index,
            failure.reason.describe()
        );

        if let Some(listener) = self.listener {
            listener.on_failure(&failure);
        }
        self.failures.borrow_mut().push(failure);
    }

    fn report_progress(&self, processed: usize, total: Option<usize>) {
        let Some(total) = total else {
            return;
        };
        if let Some(listener) = self.listener {
            listener.on_progress(Progress::new(processed, total));
        }
    }

    fn _inc_read_count(&self) {
        self.read_count.set(self.read_count.get() + 1);
    }

    fn _inc_write_count(&self) {
        self.write_count.set(self.write_count.get() + 1);
    }

    fn _log_error(result: Result<(), BatchError>) {
        if let Err(err) = result {
            error!("ItemWriter error: {}", err);
        }
    }
}

pub struct StepBuilder<'a, R, W> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<R>>,
    processor: Option<&'a dyn ItemProcessor<R, W>>,
    writer: Option<&'a dyn ItemWriter<W>>,
    listener: Option<&'a dyn StepListener>,
}

impl<R, W> Default for StepBuilder<'_, R, W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R, W> StepBuilder<'a, R, W> {
    pub fn new() -> StepBuilder<'a, R, W> {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            listener: None,
        }
    }

    pub fn name(mut self, name: String) -> StepBuilder<'a, R, W> {
        self.name = Some(name);
        self
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<R>) -> StepBuilder<'a, R, W> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a dyn ItemProcessor<R, W>) -> StepBuilder<'a, R, W> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<W>) -> StepBuilder<'a, R, W> {
        self.writer = Some(writer);
        self
    }

    pub fn listener(mut self, listener: &'a dyn StepListener) -> StepBuilder<'a, R, W> {
        self.listener = Some(listener);
        self
    }

    pub fn build(self) -> Result<Step<'a, R, W>, BatchError> {
        let (Some(reader), Some(processor), Some(writer)) =
            (self.reader, self.processor, self.writer)
        else {
            return Err(BatchError::Configuration(
                "a step needs a reader, a processor and a writer".to_string(),
            ));
        };

        Ok(Step {
            name: self.name.unwrap_or_else(build_name),
            reader,
            processor,
            writer,
            listener: self.listener,
            read_count: Cell::new(0),
            write_count: Cell::new(0),
            failures: RefCell::new(Vec::new()),
        })
    }
}
