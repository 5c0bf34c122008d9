use std::{future::Future, str::FromStr, time::Duration};

use log::{debug, info};
use sqlx::{
    QueryBuilder, Row, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};
use tokio::runtime::{Builder, Runtime};
use uuid::Uuid;

use crate::{
    BatchError,
    catalog::{Book, Member, MemberStatus},
};

use super::{BookFilter, CatalogStore, MemberFilter};

const BOOK_COLUMNS: &str = "id, owner_id, title, author, isbn, category, publication_year, \
     publisher, description, price, status, stock, language, page_count, location, \
     cover_image, tags, rating";

const MEMBER_COLUMNS: &str = "id, owner_id, name, email, phone, address, status";

/// A [`CatalogStore`] backed by SQLite through an SQLx pool.
///
/// # Design
///
/// - The store owns a current-thread tokio runtime and blocks on it for every
///   call, so callers stay synchronous. It must not be used from inside
///   another tokio runtime
/// - `isbn` is unique per owner for books and `email` unique per owner for
///   members; a duplicate insert is a persistence error
/// - Tags are stored as a JSON array, enums and ids as text
/// - `connect` creates the database file and tables when missing
pub struct SqliteStore {
    pool: SqlitePool,
    runtime: Runtime,
    user_id: Option<Uuid>,
}

impl SqliteStore {
    /// Open (or create) the database at `url`, e.g. `sqlite://library.db`.
    pub fn connect(url: &str) -> Result<Self, BatchError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(persistence)?
            .create_if_missing(true);

        info!("Opening catalog database {}", url);
        Self::open(options, 4)
    }

    /// A private in-memory database, mostly useful for tests.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// limited to one connection that is never recycled.
    pub fn in_memory() -> Result<Self, BatchError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(persistence)?;
        Self::open(options, 1)
    }

    /// Set the signed-in owner reported by [`CatalogStore::current_user_id`].
    pub fn with_user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    fn open(options: SqliteConnectOptions, max_connections: u32) -> Result<Self, BatchError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(1)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>)
                    .connect_with(options),
            )
            .map_err(persistence)?;

        let store = Self {
            pool,
            runtime,
            user_id: None,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn ensure_schema(&self) -> Result<(), BatchError> {
        self.block_on(
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS books (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    author TEXT NOT NULL,
                    isbn TEXT NOT NULL,
                    category TEXT NOT NULL,
                    publication_year INTEGER NOT NULL,
                    publisher TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    price REAL NOT NULL DEFAULT 0,
                    status TEXT NOT NULL DEFAULT 'Available',
                    stock INTEGER NOT NULL DEFAULT 0,
                    language TEXT NOT NULL DEFAULT '',
                    page_count INTEGER NOT NULL DEFAULT 0,
                    location TEXT NOT NULL DEFAULT '',
                    cover_image TEXT NOT NULL DEFAULT '',
                    tags TEXT NOT NULL DEFAULT '[]',
                    rating REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (owner_id, isbn)
                )",
            )
            .execute(&self.pool),
        )
        .map_err(persistence)?;

        self.block_on(
            sqlx::query(
                "CREATE TABLE IF NOT EXISTS members (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    owner_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL,
                    phone TEXT NOT NULL DEFAULT '',
                    address TEXT NOT NULL DEFAULT '',
                    status TEXT NOT NULL DEFAULT 'Active',
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    UNIQUE (owner_id, email)
                )",
            )
            .execute(&self.pool),
        )
        .map_err(persistence)?;

        Ok(())
    }
}

impl CatalogStore for SqliteStore {
    fn current_user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    fn insert_book(&self, book: &Book) -> Result<i64, BatchError> {
        let tags = serde_json::to_string(&book.tags).map_err(persistence)?;

        let result = self
            .block_on(
                sqlx::query(
                    "INSERT INTO books (owner_id, title, author, isbn, category, publication_year,
                        publisher, description, price, status, stock, language, page_count,
                        location, cover_image, tags, rating)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                )
                .bind(book.owner_id.to_string())
                .bind(&book.title)
                .bind(&book.author)
                .bind(&book.isbn)
                .bind(book.category.as_str())
                .bind(book.publication_year)
                .bind(&book.publisher)
                .bind(&book.description)
                .bind(book.price)
                .bind(book.status.as_str())
                .bind(book.stock)
                .bind(&book.language)
                .bind(book.page_count)
                .bind(&book.location)
                .bind(&book.cover_image)
                .bind(tags)
                .bind(book.rating)
                .execute(&self.pool),
            )
            .map_err(persistence)?;

        let id = result.last_insert_rowid();
        debug!("Inserted book {} as #{}", book.label(), id);
        Ok(id)
    }

    fn get_book(&self, id: i64) -> Result<Option<Book>, BatchError> {
        let row = self
            .block_on(
                sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"))
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .map_err(persistence)?;

        row.as_ref().map(book_from_row).transpose()
    }

    fn update_book(&self, id: i64, book: &Book) -> Result<(), BatchError> {
        let tags = serde_json::to_string(&book.tags).map_err(persistence)?;

        let result = self
            .block_on(
                sqlx::query(
                    "UPDATE books SET title = ?1, author = ?2, isbn = ?3, category = ?4,
                        publication_year = ?5, publisher = ?6, description = ?7, price = ?8,
                        status = ?9, stock = ?10, language = ?11, page_count = ?12,
                        location = ?13, cover_image = ?14, tags = ?15, rating = ?16
                     WHERE id = ?17",
                )
                .bind(&book.title)
                .bind(&book.author)
                .bind(&book.isbn)
                .bind(book.category.as_str())
                .bind(book.publication_year)
                .bind(&book.publisher)
                .bind(&book.description)
                .bind(book.price)
                .bind(book.status.as_str())
                .bind(book.stock)
                .bind(&book.language)
                .bind(book.page_count)
                .bind(&book.location)
                .bind(&book.cover_image)
                .bind(tags)
                .bind(book.rating)
                .bind(id)
                .execute(&self.pool),
            )
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            Err(BatchError::NotFound(format!("Book #{id}")))
        } else {
            Ok(())
        }
    }

    fn delete_book(&self, id: i64) -> Result<(), BatchError> {
        let result = self
            .block_on(
                sqlx::query("DELETE FROM books WHERE id = ?1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            Err(BatchError::NotFound(format!("Book #{id}")))
        } else {
            Ok(())
        }
    }

    fn query_books(&self, filter: &BookFilter) -> Result<Vec<Book>, BatchError> {
        let mut query_builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {BOOK_COLUMNS} FROM books WHERE 1 = 1"));

        if let Some(owner_id) = filter.owner_id {
            query_builder
                .push(" AND owner_id = ")
                .push_bind(owner_id.to_string());
        }

        if let Some(ids) = &filter.ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query_builder.push(" AND id IN (");
            let mut separated = query_builder.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");
        }

        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query_builder
                .push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(author) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(isbn) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(category) = filter.category {
            query_builder
                .push(" AND category = ")
                .push_bind(category.as_str());
        }

        if let Some(status) = filter.status {
            query_builder
                .push(" AND status = ")
                .push_bind(status.as_str());
        }

        query_builder.push(" ORDER BY title COLLATE NOCASE, id");

        let rows = self
            .block_on(query_builder.build().fetch_all(&self.pool))
            .map_err(persistence)?;

        rows.iter().map(book_from_row).collect()
    }

    fn insert_member(&self, member: &Member) -> Result<i64, BatchError> {
        let result = self
            .block_on(
                sqlx::query(
                    "INSERT INTO members (owner_id, name, email, phone, address, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .bind(member.owner_id.to_string())
                .bind(&member.name)
                .bind(&member.email)
                .bind(&member.phone)
                .bind(&member.address)
                .bind(member.status.as_str())
                .execute(&self.pool),
            )
            .map_err(persistence)?;

        let id = result.last_insert_rowid();
        debug!("Inserted member {} as #{}", member.label(), id);
        Ok(id)
    }

    fn update_member_status(&self, id: i64, status: MemberStatus) -> Result<(), BatchError> {
        let result = self
            .block_on(
                sqlx::query("UPDATE members SET status = ?1 WHERE id = ?2")
                    .bind(status.as_str())
                    .bind(id)
                    .execute(&self.pool),
            )
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            Err(BatchError::NotFound(format!("Member #{id}")))
        } else {
            Ok(())
        }
    }

    fn delete_member(&self, id: i64) -> Result<(), BatchError> {
        let result = self
            .block_on(
                sqlx::query("DELETE FROM members WHERE id = ?1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .map_err(persistence)?;

        if result.rows_affected() == 0 {
            Err(BatchError::NotFound(format!("Member #{id}")))
        } else {
            Ok(())
        }
    }

    fn query_members(&self, filter: &MemberFilter) -> Result<Vec<Member>, BatchError> {
        let mut query_builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE 1 = 1"
        ));

        if let Some(owner_id) = filter.owner_id {
            query_builder
                .push(" AND owner_id = ")
                .push_bind(owner_id.to_string());
        }

        if let Some(search) = &filter.search {
            let pattern = like_pattern(search);
            query_builder
                .push(" AND (LOWER(name) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(email) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(status) = filter.status {
            query_builder
                .push(" AND status = ")
                .push_bind(status.as_str());
        }

        query_builder.push(" ORDER BY name COLLATE NOCASE, id");

        let rows = self
            .block_on(query_builder.build().fetch_all(&self.pool))
            .map_err(persistence)?;

        rows.iter().map(member_from_row).collect()
    }
}

/// Case-insensitive substring pattern. `%`, `_` and `\` in the search are
/// matched literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::from("%");
    for c in search.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn persistence<E: std::fmt::Display>(error: E) -> BatchError {
    BatchError::Persistence(error.to_string())
}

fn book_from_row(row: &SqliteRow) -> Result<Book, BatchError> {
    let tags: String = row.try_get("tags").map_err(persistence)?;

    Ok(Book {
        id: Some(row.try_get("id").map_err(persistence)?),
        owner_id: parse_uuid(row)?,
        title: row.try_get("title").map_err(persistence)?,
        author: row.try_get("author").map_err(persistence)?,
        isbn: row.try_get("isbn").map_err(persistence)?,
        category: parse_label(row, "category")?,
        publication_year: row.try_get("publication_year").map_err(persistence)?,
        publisher: row.try_get("publisher").map_err(persistence)?,
        description: row.try_get("description").map_err(persistence)?,
        price: row.try_get("price").map_err(persistence)?,
        status: parse_label(row, "status")?,
        stock: row.try_get("stock").map_err(persistence)?,
        language: row.try_get("language").map_err(persistence)?,
        page_count: row.try_get("page_count").map_err(persistence)?,
        location: row.try_get("location").map_err(persistence)?,
        cover_image: row.try_get("cover_image").map_err(persistence)?,
        tags: serde_json::from_str(&tags).map_err(persistence)?,
        rating: row.try_get("rating").map_err(persistence)?,
    })
}

fn member_from_row(row: &SqliteRow) -> Result<Member, BatchError> {
    Ok(Member {
        id: Some(row.try_get("id").map_err(persistence)?),
        owner_id: parse_uuid(row)?,
        name: row.try_get("name").map_err(persistence)?,
        email: row.try_get("email").map_err(persistence)?,
        phone: row.try_get("phone").map_err(persistence)?,
        address: row.try_get("address").map_err(persistence)?,
        status: parse_label(row, "status")?,
    })
}

fn parse_uuid(row: &SqliteRow) -> Result<Uuid, BatchError> {
    let owner_id: String = row.try_get("owner_id").map_err(persistence)?;
    Uuid::parse_str(&owner_id).map_err(persistence)
}

fn parse_label<T>(row: &SqliteRow, column: &str) -> Result<T, BatchError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let value: String = row.try_get(column).map_err(persistence)?;
    value.parse().map_err(persistence)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::{
        BatchError,
        catalog::{Book, BookStatus, Category, Member, MemberStatus},
        item::store::{BookFilter, CatalogStore, MemberFilter},
    };

    use super::SqliteStore;

    fn book(owner: Uuid, title: &str, isbn: &str, category: Category) -> Book {
        let mut book = Book::new(owner, title, "Someone", isbn, category, 2001, "Pub");
        book.tags = vec!["a".to_string(), "b c".to_string()];
        book.price = 4.25;
        book
    }

    #[test]
    fn insert_then_get_returns_the_same_book() {
        let owner = Uuid::new_v4();
        let store = SqliteStore::in_memory().unwrap().with_user(Some(owner));
        let original = book(owner, "Dune", "1", Category::ScienceFiction);

        let id = store.insert_book(&original).unwrap();
        let loaded = store.get_book(id).unwrap().unwrap();

        assert_eq!(loaded.id, Some(id));
        assert_eq!(Book { id: None, ..loaded }, original);
        assert_eq!(store.current_user_id(), Some(owner));
    }

    #[test]
    fn duplicate_isbn_for_the_same_owner_is_rejected() {
        let owner = Uuid::new_v4();
        let store = SqliteStore::in_memory().unwrap();

        store
            .insert_book(&book(owner, "Dune", "1", Category::Fiction))
            .unwrap();
        let result = store.insert_book(&book(owner, "Dune again", "1", Category::Fiction));

        assert!(matches!(result, Err(BatchError::Persistence(_))));

        // Another owner may catalog the same ISBN
        assert!(
            store
                .insert_book(&book(Uuid::new_v4(), "Dune", "1", Category::Fiction))
                .is_ok()
        );
    }

    #[test]
    fn search_wildcards_are_matched_literally() {
        let owner = Uuid::new_v4();
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_book(&book(owner, "100% Plant Based", "1", Category::Cooking))
            .unwrap();
        store
            .insert_book(&book(owner, "1000 Recipes", "2", Category::Cooking))
            .unwrap();
        store
            .insert_book(&book(owner, "snake_case style", "3", Category::Technology))
            .unwrap();
        store
            .insert_book(&book(owner, "Snakes and Ladders", "4", Category::Children))
            .unwrap();
        store
            .insert_member(&Member::new(owner, "Per Cent", "100%@example.org"))
            .unwrap();
        store
            .insert_member(&Member::new(owner, "Thousand", "1000@example.org"))
            .unwrap();

        let titles = |search: &str| -> Vec<String> {
            store
                .query_books(&BookFilter::new().search(search))
                .unwrap()
                .into_iter()
                .map(|book| book.title)
                .collect()
        };

        assert_eq!(titles("100%"), vec!["100% Plant Based"]);
        assert_eq!(titles("snake_"), vec!["snake_case style"]);
        assert_eq!(titles("100").len(), 2);

        let members = store
            .query_members(&MemberFilter::new().search("100%"))
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Per Cent");
    }

    #[test]
    fn query_books_filters_and_orders_by_title() {
        let owner = Uuid::new_v4();
        let store = SqliteStore::in_memory().unwrap();
        let zebra = store
            .insert_book(&book(owner, "zebra tales", "1", Category::Children))
            .unwrap();
        let apple = store
            .insert_book(&book(owner, "Apple Pie", "2", Category::Cooking))
            .unwrap();
        store
            .insert_book(&book(owner, "Middle", "3", Category::Cooking))
            .unwrap();
        store
            .insert_book(&book(Uuid::new_v4(), "Other owner", "4", Category::Cooking))
            .unwrap();

        let titles = |filter: BookFilter| -> Vec<String> {
            store
                .query_books(&filter)
                .unwrap()
                .into_iter()
                .map(|book| book.title)
                .collect()
        };

        assert_eq!(
            titles(BookFilter::new().owner(owner)),
            vec!["Apple Pie", "Middle", "zebra tales"]
        );
        assert_eq!(
            titles(BookFilter::new().ids(&[zebra, apple])),
            vec!["Apple Pie", "zebra tales"]
        );
        assert_eq!(
            titles(BookFilter::new().owner(owner).category(Category::Cooking)),
            vec!["Apple Pie", "Middle"]
        );
        assert_eq!(titles(BookFilter::new().search("PIE")), vec!["Apple Pie"]);
        assert!(titles(BookFilter::new().ids(&[])).is_empty());
        assert!(titles(BookFilter::new().status(BookStatus::Lost)).is_empty());
    }

    #[test]
    fn update_and_delete_book() {
        let owner = Uuid::new_v4();
        let store = SqliteStore::in_memory().unwrap();
        let id = store
            .insert_book(&book(owner, "Dune", "1", Category::Fiction))
            .unwrap();

        let mut changed = book(owner, "Dune Messiah", "1", Category::ScienceFiction);
        changed.status = BookStatus::CheckedOut;
        store.update_book(id, &changed).unwrap();

        let loaded = store.get_book(id).unwrap().unwrap();
        assert_eq!(loaded.title, "Dune Messiah");
        assert_eq!(loaded.status, BookStatus::CheckedOut);

        store.delete_book(id).unwrap();
        assert!(store.get_book(id).unwrap().is_none());
        assert!(matches!(
            store.delete_book(id),
            Err(BatchError::NotFound(_))
        ));
        assert!(matches!(
            store.update_book(id, &changed),
            Err(BatchError::NotFound(_))
        ));
    }

    #[test]
    fn members_round_trip_and_status_changes() {
        let owner = Uuid::new_v4();
        let store = SqliteStore::in_memory().unwrap();
        let mut ada = Member::new(owner, "Ada Lovelace", "ada@example.org");
        ada.phone = "555-0100".to_string();
        let ada_id = store.insert_member(&ada).unwrap();
        store
            .insert_member(&Member::new(owner, "Charles Babbage", "charles@example.org"))
            .unwrap();

        assert!(matches!(
            store.insert_member(&Member::new(owner, "Ada again", "ada@example.org")),
            Err(BatchError::Persistence(_))
        ));

        store
            .update_member_status(ada_id, MemberStatus::Suspended)
            .unwrap();

        let suspended = store
            .query_members(&MemberFilter::new().status(MemberStatus::Suspended))
            .unwrap();
        assert_eq!(suspended.len(), 1);
        assert_eq!(suspended[0].phone, "555-0100");

        let all = store
            .query_members(&MemberFilter::new().owner(owner))
            .unwrap();
        assert_eq!(all[0].name, "Ada Lovelace");
        assert_eq!(all[1].name, "Charles Babbage");

        store.delete_member(ada_id).unwrap();
        assert!(matches!(
            store.update_member_status(ada_id, MemberStatus::Active),
            Err(BatchError::NotFound(_))
        ));
        assert_eq!(
            store
                .query_members(&MemberFilter::new().search("ADA"))
                .unwrap()
                .len(),
            0
        );
    }
}
