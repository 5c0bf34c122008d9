//! Turns validated records into canonical entities.
//!
//! The conversions assume the record already passed validation. They never
//! fail: a number that cannot be read becomes `0`, a missing optional field
//! becomes its default.

use log::debug;
use uuid::Uuid;

use crate::{
    core::item::{ItemProcessor, ItemProcessorResult},
    error::BatchError,
};

use super::{
    enums::{BookStatus, Category, MemberStatus},
    model::{Book, Member},
    record::{EntityKind, RawRecord},
    validator::validate,
};

/// Separator inside the `tags` column.
pub const TAG_DELIMITER: char = ';';

pub fn to_book(record: &RawRecord, owner_id: Uuid) -> Book {
    Book {
        id: None,
        owner_id,
        title: text(record, "title"),
        author: text(record, "author"),
        isbn: text(record, "isbn"),
        category: record
            .value("category")
            .and_then(|value| value.parse().ok())
            .unwrap_or(Category::Other),
        publication_year: integer(record, "publication_year"),
        publisher: text(record, "publisher"),
        description: text(record, "description"),
        price: decimal(record, "price"),
        status: record
            .value("status")
            .and_then(|value| value.parse().ok())
            .unwrap_or(BookStatus::Available),
        stock: integer(record, "stock"),
        language: text(record, "language"),
        page_count: integer(record, "page_count"),
        location: text(record, "location"),
        cover_image: text(record, "cover_image"),
        tags: record.value("tags").map(split_tags).unwrap_or_default(),
        rating: 0.0,
    }
}

pub fn to_member(record: &RawRecord, owner_id: Uuid) -> Member {
    Member {
        id: None,
        owner_id,
        name: text(record, "name"),
        email: text(record, "email"),
        phone: text(record, "phone"),
        address: text(record, "address"),
        status: record
            .value("status")
            .and_then(|value| value.parse().ok())
            .unwrap_or(MemberStatus::Active),
    }
}

/// Split a `;`-separated list, dropping empty entries.
pub fn split_tags(value: &str) -> Vec<String> {
    value
        .split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn text(record: &RawRecord, name: &str) -> String {
    record.value(name).unwrap_or_default().to_string()
}

/// Base-10 integer; a decimal value keeps its integer part.
fn integer(record: &RawRecord, name: &str) -> i32 {
    let Some(value) = record.value(name) else {
        return 0;
    };

    value.parse::<i32>().unwrap_or_else(|_| {
        value
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .map(|number| number.trunc() as i32)
            .unwrap_or(0)
    })
}

fn decimal(record: &RawRecord, name: &str) -> f64 {
    record
        .value(name)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|number| number.is_finite())
        .unwrap_or(0.0)
}

/// Validates then transforms book rows for the signed-in owner.
///
/// Without an owner every record is rejected with
/// [`BatchError::Authentication`] so nothing reaches the writer.
pub struct BookProcessor {
    owner_id: Option<Uuid>,
}

impl BookProcessor {
    pub fn new(owner_id: Option<Uuid>) -> Self {
        Self { owner_id }
    }
}

impl ItemProcessor<RawRecord, Book> for BookProcessor {
    fn process(&self, item: &RawRecord) -> ItemProcessorResult<Book> {
        let owner_id = self.owner_id.ok_or(BatchError::Authentication)?;

        let result = validate(item, EntityKind::Book);
        if !result.valid {
            return Err(BatchError::Validation(result.errors));
        }

        let book = to_book(item, owner_id);
        debug!("Record {} transformed into {}", item.index, book.label());
        Ok(book)
    }
}

/// Member counterpart of [`BookProcessor`].
pub struct MemberProcessor {
    owner_id: Option<Uuid>,
}

impl MemberProcessor {
    pub fn new(owner_id: Option<Uuid>) -> Self {
        Self { owner_id }
    }
}

impl ItemProcessor<RawRecord, Member> for MemberProcessor {
    fn process(&self, item: &RawRecord) -> ItemProcessorResult<Member> {
        let owner_id = self.owner_id.ok_or(BatchError::Authentication)?;

        let result = validate(item, EntityKind::Member);
        if !result.valid {
            return Err(BatchError::Validation(result.errors));
        }

        let member = to_member(item, owner_id);
        debug!("Record {} transformed into {}", item.index, member.label());
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord::new(
            3,
            4,
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn book_record(extra: &[(&'static str, &'static str)]) -> RawRecord {
        let mut pairs = vec![
            ("title", "Dune"),
            ("author", "Frank Herbert"),
            ("isbn", "9780441013593"),
            ("category", "Science Fiction"),
            ("publication_year", "1965"),
            ("publisher", "Chilton"),
        ];
        pairs.extend_from_slice(extra);
        record(&pairs)
    }

    #[test]
    fn optional_fields_get_defaults() {
        let owner = Uuid::new_v4();
        let book = to_book(&book_record(&[]), owner);

        assert_eq!(book.owner_id, owner);
        assert_eq!(book.category, Category::ScienceFiction);
        assert_eq!(book.publication_year, 1965);
        assert_eq!(book.status, BookStatus::Available);
        assert_eq!(book.price, 0.0);
        assert_eq!(book.stock, 0);
        assert_eq!(book.description, "");
        assert!(book.tags.is_empty());
        assert_eq!(book.id, None);
    }

    #[test]
    fn numbers_and_tags_are_coerced() {
        let book = to_book(
            &book_record(&[
                ("price", "12.50"),
                ("stock", "7"),
                ("page_count", "412.9"),
                ("status", "On Hold"),
                ("tags", " classic ; desert;;spice "),
            ]),
            Uuid::nil(),
        );

        assert_eq!(book.price, 12.5);
        assert_eq!(book.stock, 7);
        assert_eq!(book.page_count, 412);
        assert_eq!(book.status, BookStatus::OnHold);
        assert_eq!(book.tags, vec!["classic", "desert", "spice"]);
    }

    #[test]
    fn malformed_numbers_become_zero() {
        let book = to_book(&book_record(&[("stock", "many"), ("price", "n/a")]), Uuid::nil());

        assert_eq!(book.stock, 0);
        assert_eq!(book.price, 0.0);
    }

    #[test]
    fn member_status_defaults_to_active() {
        let member = to_member(
            &record(&[("name", "Ada Lovelace"), ("email", "ada@example.org")]),
            Uuid::nil(),
        );

        assert_eq!(member.status, MemberStatus::Active);
        assert_eq!(member.phone, "");
    }

    #[test]
    fn processor_rejects_invalid_records() {
        let processor = BookProcessor::new(Some(Uuid::new_v4()));
        let invalid = record(&[("title", "Dune")]);

        match processor.process(&invalid) {
            Err(BatchError::Validation(errors)) => assert_eq!(errors.len(), 5),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn processor_without_owner_rejects_everything() {
        let processor = MemberProcessor::new(None);
        let valid = record(&[("name", "Ada"), ("email", "ada@example.org")]);

        assert!(matches!(
            processor.process(&valid),
            Err(BatchError::Authentication)
        ));
    }
}
