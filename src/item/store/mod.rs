//! Persistence collaborator for the catalog.
//!
//! The pipeline only talks to [`CatalogStore`]. Every call stands alone: there
//! is no transaction spanning several calls, so a failed import leaves the
//! rows written before the failure in place.

use uuid::Uuid;

use crate::{
    BatchError,
    catalog::{Book, BookStatus, Category, Member, MemberStatus},
};

/// SQLite implementation of [`CatalogStore`].
pub mod sqlite;

/// [`ItemWriter`](crate::core::item::ItemWriter) adapter over a store.
pub mod writer;

pub use sqlite::SqliteStore;
pub use writer::StoreItemWriter;

/// Row store holding books and members.
pub trait CatalogStore {
    /// Owner of the current session, `None` when nobody is signed in.
    fn current_user_id(&self) -> Option<Uuid>;

    /// Persist a new book and return its id.
    fn insert_book(&self, book: &Book) -> Result<i64, BatchError>;

    fn get_book(&self, id: i64) -> Result<Option<Book>, BatchError>;

    /// Replace every field of book `id`. Fails with
    /// [`BatchError::NotFound`] when no such book exists.
    fn update_book(&self, id: i64, book: &Book) -> Result<(), BatchError>;

    fn delete_book(&self, id: i64) -> Result<(), BatchError>;

    /// Books matching `filter`, ordered by title.
    fn query_books(&self, filter: &BookFilter) -> Result<Vec<Book>, BatchError>;

    /// Persist a new member and return its id.
    fn insert_member(&self, member: &Member) -> Result<i64, BatchError>;

    fn update_member_status(&self, id: i64, status: MemberStatus) -> Result<(), BatchError>;

    fn delete_member(&self, id: i64) -> Result<(), BatchError>;

    /// Members matching `filter`, ordered by name.
    fn query_members(&self, filter: &MemberFilter) -> Result<Vec<Member>, BatchError>;
}

/// Book query criteria. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub owner_id: Option<Uuid>,
    /// Restrict to these ids. An empty list matches nothing.
    pub ids: Option<Vec<i64>>,
    /// Case-insensitive substring of title, author or ISBN.
    pub search: Option<String>,
    pub category: Option<Category>,
    pub status: Option<BookStatus>,
}

impl BookFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn ids(mut self, ids: &[i64]) -> Self {
        self.ids = Some(ids.to_vec());
        self
    }

    pub fn search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn status(mut self, status: BookStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Member query criteria. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberFilter {
    pub owner_id: Option<Uuid>,
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
    pub status: Option<MemberStatus>,
}

impl MemberFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn search(mut self, search: &str) -> Self {
        self.search = Some(search.to_string());
        self
    }

    pub fn status(mut self, status: MemberStatus) -> Self {
        self.status = Some(status);
        self
    }
}
