use log::error;

use crate::{
    catalog::{Book, Member},
    core::item::{ItemWriter, ItemWriterResult},
};

use super::CatalogStore;

/// Persists each item with one store call.
///
/// A failed insert is logged with the identifying fields of the item and
/// returned as is, so the step can attribute it to the right record.
pub struct StoreItemWriter<'a> {
    store: &'a dyn CatalogStore,
}

impl<'a> StoreItemWriter<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Self {
        Self { store }
    }
}

impl ItemWriter<Book> for StoreItemWriter<'_> {
    fn write(&self, item: &Book) -> ItemWriterResult {
        self.store.insert_book(item).map(|_| ()).inspect_err(|err| {
            error!(
                "Failed to save book '{}' (ISBN {}): {}",
                item.title, item.isbn, err
            )
        })
    }
}

impl ItemWriter<Member> for StoreItemWriter<'_> {
    fn write(&self, item: &Member) -> ItemWriterResult {
        self.store.insert_member(item).map(|_| ()).inspect_err(|err| {
            error!(
                "Failed to save member '{}' ({}): {}",
                item.name, item.email, err
            )
        })
    }
}
