//! Closed-set enumerations used by books and members.
//!
//! Every enum parses from its display label with an exact, case-sensitive
//! match. Anything outside the set is an error, never a silent coercion.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Error returned when a label is not part of a closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub value: String,
    pub allowed: &'static [&'static str],
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not one of: {}",
            self.value,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for UnknownVariant {}

fn parse_label<T: Copy>(
    value: &str,
    variants: &[T],
    labels: &'static [&'static str],
) -> Result<T, UnknownVariant> {
    labels
        .iter()
        .position(|label| *label == value)
        .map(|index| variants[index])
        .ok_or_else(|| UnknownVariant {
            value: value.to_string(),
            allowed: labels,
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Mystery,
    Romance,
    Biography,
    History,
    #[serde(rename = "Self-Help")]
    SelfHelp,
    Business,
    Children,
    #[serde(rename = "Young Adult")]
    YoungAdult,
    Poetry,
    Reference,
    Art,
    Travel,
    Religion,
    Cooking,
    Science,
    Technology,
    Other,
}

impl Category {
    pub const ALL: [Category; 20] = [
        Category::Fiction,
        Category::NonFiction,
        Category::ScienceFiction,
        Category::Mystery,
        Category::Romance,
        Category::Biography,
        Category::History,
        Category::SelfHelp,
        Category::Business,
        Category::Children,
        Category::YoungAdult,
        Category::Poetry,
        Category::Reference,
        Category::Art,
        Category::Travel,
        Category::Religion,
        Category::Cooking,
        Category::Science,
        Category::Technology,
        Category::Other,
    ];

    /// Display labels, in the same order as [`Category::ALL`].
    pub const LABELS: [&'static str; 20] = [
        "Fiction",
        "Non-Fiction",
        "Science Fiction",
        "Mystery",
        "Romance",
        "Biography",
        "History",
        "Self-Help",
        "Business",
        "Children",
        "Young Adult",
        "Poetry",
        "Reference",
        "Art",
        "Travel",
        "Religion",
        "Cooking",
        "Science",
        "Technology",
        "Other",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::NonFiction => "Non-Fiction",
            Category::ScienceFiction => "Science Fiction",
            Category::Mystery => "Mystery",
            Category::Romance => "Romance",
            Category::Biography => "Biography",
            Category::History => "History",
            Category::SelfHelp => "Self-Help",
            Category::Business => "Business",
            Category::Children => "Children",
            Category::YoungAdult => "Young Adult",
            Category::Poetry => "Poetry",
            Category::Reference => "Reference",
            Category::Art => "Art",
            Category::Travel => "Travel",
            Category::Religion => "Religion",
            Category::Cooking => "Cooking",
            Category::Science => "Science",
            Category::Technology => "Technology",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s, &Category::ALL, &Category::LABELS)
    }
}

/// Circulation status of a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    #[default]
    Available,
    #[serde(rename = "Checked Out")]
    CheckedOut,
    #[serde(rename = "On Hold")]
    OnHold,
    Processing,
    Lost,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl BookStatus {
    pub const ALL: [BookStatus; 6] = [
        BookStatus::Available,
        BookStatus::CheckedOut,
        BookStatus::OnHold,
        BookStatus::Processing,
        BookStatus::Lost,
        BookStatus::OutOfStock,
    ];

    pub const LABELS: [&'static str; 6] = [
        "Available",
        "Checked Out",
        "On Hold",
        "Processing",
        "Lost",
        "Out of Stock",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::CheckedOut => "Checked Out",
            BookStatus::OnHold => "On Hold",
            BookStatus::Processing => "Processing",
            BookStatus::Lost => "Lost",
            BookStatus::OutOfStock => "Out of Stock",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s, &BookStatus::ALL, &BookStatus::LABELS)
    }
}

/// Standing of a library member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Banned,
}

impl MemberStatus {
    pub const ALL: [MemberStatus; 4] = [
        MemberStatus::Active,
        MemberStatus::Inactive,
        MemberStatus::Suspended,
        MemberStatus::Banned,
    ];

    pub const LABELS: [&'static str; 4] = ["Active", "Inactive", "Suspended", "Banned"];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "Active",
            MemberStatus::Inactive => "Inactive",
            MemberStatus::Suspended => "Suspended",
            MemberStatus::Banned => "Banned",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s, &MemberStatus::ALL, &MemberStatus::LABELS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
        for status in BookStatus::ALL {
            assert_eq!(status.as_str().parse::<BookStatus>(), Ok(status));
        }
        for status in MemberStatus::ALL {
            assert_eq!(status.as_str().parse::<MemberStatus>(), Ok(status));
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("fiction".parse::<Category>().is_err());
        assert!("checked out".parse::<BookStatus>().is_err());
    }

    #[test]
    fn unknown_value_names_the_allowed_set() {
        let err = "Borrowed".parse::<BookStatus>().unwrap_err();

        assert_eq!(err.value, "Borrowed");
        assert_eq!(
            err.to_string(),
            "'Borrowed' is not one of: Available, Checked Out, On Hold, Processing, Lost, Out of Stock"
        );
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&Category::ScienceFiction).unwrap();
        assert_eq!(json, "\"Science Fiction\"");

        let status: BookStatus = serde_json::from_str("\"Out of Stock\"").unwrap();
        assert_eq!(status, BookStatus::OutOfStock);
    }
}
