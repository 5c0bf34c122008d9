use crate::error::BatchError;

/// Result of a single read: `Ok(Some(item))`, `Ok(None)` once the source is
/// exhausted, or the error that prevented this item from being read.
pub type ItemReaderResult<R> = Result<Option<R>, BatchError>;

/// Result of processing one item.
pub type ItemProcessorResult<W> = Result<W, BatchError>;

/// Result of writing one item.
pub type ItemWriterResult = Result<(), BatchError>;

/// Source of items for a step, one item at a time.
///
/// A failed read only concerns the current item: the step counts it as failed
/// and keeps reading.
pub trait ItemReader<R> {
    fn read(&self) -> ItemReaderResult<R>;

    /// Total number of items this reader will yield, when known up front.
    /// Steps use it to report progress.
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

/// Business logic applied between read and write.
///
/// Returning an error rejects the item: it is counted as failed and never
/// reaches the writer.
pub trait ItemProcessor<R, W> {
    fn process(&self, item: &R) -> ItemProcessorResult<W>;
}

/// Destination of processed items.
pub trait ItemWriter<W> {
    fn write(&self, item: &W) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}
