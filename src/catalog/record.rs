use std::{fmt, str::FromStr};

/// One parsed data row, keyed by normalized header name.
///
/// Fields keep the header order. A column missing from a short row is stored
/// as an empty string, so `get` only returns `None` for columns the file does
/// not have at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based position among the data rows of the file.
    pub index: usize,
    /// Line of the file the row starts on.
    pub line: u64,
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(index: usize, line: u64, fields: Vec<(String, String)>) -> Self {
        Self {
            index,
            line,
            fields,
        }
    }

    /// Raw cell for `name`, including empty cells.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed cell for `name`, `None` when the column is absent or blank.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Header cell to field name: trimmed, lower-cased, inner spaces as `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// What a CSV file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityKind {
    #[default]
    Book,
    Member,
}

impl EntityKind {
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            EntityKind::Book => BOOK_FIELDS,
            EntityKind::Member => MEMBER_FIELDS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Book => "book",
            EntityKind::Member => "member",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "book" | "books" => Ok(EntityKind::Book),
            "member" | "members" => Ok(EntityKind::Member),
            other => Err(format!(
                "unsupported entity kind '{other}', expected books or members"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// How a raw cell is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Category,
    BookStatus,
    MemberStatus,
    /// `;`-separated list.
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub presence: Presence,
    pub kind: FieldKind,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        presence: Presence::Required,
        kind,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        presence: Presence::Optional,
        kind,
    }
}

pub const BOOK_FIELDS: &[FieldSpec] = &[
    required("title", FieldKind::Text),
    required("author", FieldKind::Text),
    required("isbn", FieldKind::Text),
    required("category", FieldKind::Category),
    required("publication_year", FieldKind::Integer),
    required("publisher", FieldKind::Text),
    optional("description", FieldKind::Text),
    optional("price", FieldKind::Decimal),
    optional("status", FieldKind::BookStatus),
    optional("stock", FieldKind::Integer),
    optional("language", FieldKind::Text),
    optional("page_count", FieldKind::Integer),
    optional("location", FieldKind::Text),
    optional("cover_image", FieldKind::Text),
    optional("tags", FieldKind::Tags),
];

pub const MEMBER_FIELDS: &[FieldSpec] = &[
    required("name", FieldKind::Text),
    required("email", FieldKind::Text),
    optional("phone", FieldKind::Text),
    optional("address", FieldKind::Text),
    optional("status", FieldKind::MemberStatus),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RawRecord {
        RawRecord::new(
            1,
            2,
            vec![
                ("title".to_string(), "  Dune ".to_string()),
                ("stock".to_string(), "   ".to_string()),
            ],
        )
    }

    #[test]
    fn value_trims_and_hides_blank_cells() {
        let record = record();

        assert_eq!(record.value("title"), Some("Dune"));
        assert_eq!(record.get("stock"), Some("   "));
        assert_eq!(record.value("stock"), None);
        assert_eq!(record.get("price"), None);
    }

    #[test]
    fn headers_are_normalized() {
        assert_eq!(normalize_header(" Title "), "title");
        assert_eq!(normalize_header("Publication Year"), "publication_year");
        assert_eq!(normalize_header("page_count"), "page_count");
    }

    #[test]
    fn entity_kind_parses_singular_and_plural() {
        assert_eq!("books".parse::<EntityKind>(), Ok(EntityKind::Book));
        assert_eq!("Member".parse::<EntityKind>(), Ok(EntityKind::Member));
        assert!("authors".parse::<EntityKind>().is_err());
    }

    #[test]
    fn book_fields_mark_the_required_columns() {
        let required: Vec<&str> = BOOK_FIELDS
            .iter()
            .filter(|field| field.presence == Presence::Required)
            .map(|field| field.name)
            .collect();

        assert_eq!(
            required,
            vec![
                "title",
                "author",
                "isbn",
                "category",
                "publication_year",
                "publisher"
            ]
        );
    }
}
