//! Mock version of the catalog store, for failure injection.
use mockall::mock;
use uuid::Uuid;

use library_batch::{
    BatchError,
    catalog::{Book, Member, MemberStatus},
    item::store::{BookFilter, CatalogStore, MemberFilter},
};

mock! {
    pub Store {}
    impl CatalogStore for Store {
        fn current_user_id(&self) -> Option<Uuid>;
        fn insert_book(&self, book: &Book) -> Result<i64, BatchError>;
        fn get_book(&self, id: i64) -> Result<Option<Book>, BatchError>;
        fn update_book(&self, id: i64, book: &Book) -> Result<(), BatchError>;
        fn delete_book(&self, id: i64) -> Result<(), BatchError>;
        fn query_books(&self, filter: &BookFilter) -> Result<Vec<Book>, BatchError>;
        fn insert_member(&self, member: &Member) -> Result<i64, BatchError>;
        fn update_member_status(&self, id: i64, status: MemberStatus) -> Result<(), BatchError>;
        fn delete_member(&self, id: i64) -> Result<(), BatchError>;
        fn query_members(&self, filter: &MemberFilter) -> Result<Vec<Member>, BatchError>;
    }
}
