use std::fmt::Debug;

use log::info;

use crate::core::item::{ItemWriter, ItemWriterResult};

/// Writer that logs items instead of persisting them. Import dry runs use it
/// to validate a file without touching the store.
#[derive(Default)]
pub struct LoggerWriter {}

impl<T> ItemWriter<T> for LoggerWriter
where
    T: Debug,
{
    fn write(&self, item: &T) -> ItemWriterResult {
        info!("Record:{:?}", item);
        Ok(())
    }
}
