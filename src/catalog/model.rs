//! Canonical, persistence-ready entities.
//!
//! Both types are plain data holders. `id` is `None` until the store assigns
//! one, and `owner_id` attributes the row to the signed-in user that created
//! it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{BookStatus, Category, MemberStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub owner_id: Uuid,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Category,
    pub publication_year: i32,
    pub publisher: String,
    pub description: String,
    pub price: f64,
    pub status: BookStatus,
    pub stock: i32,
    pub language: String,
    pub page_count: i32,
    pub location: String,
    pub cover_image: String,
    pub tags: Vec<String>,
    /// Average reader rating. Never imported, only exported.
    pub rating: f64,
}

impl Book {
    /// A book with the required fields set and every optional field at its
    /// default.
    pub fn new(
        owner_id: Uuid,
        title: &str,
        author: &str,
        isbn: &str,
        category: Category,
        publication_year: i32,
        publisher: &str,
    ) -> Self {
        Self {
            id: None,
            owner_id,
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            category,
            publication_year,
            publisher: publisher.to_string(),
            description: String::new(),
            price: 0.0,
            status: BookStatus::default(),
            stock: 0,
            language: String::new(),
            page_count: 0,
            location: String::new(),
            cover_image: String::new(),
            tags: Vec::new(),
            rating: 0.0,
        }
    }

    /// `Title by Author (ISBN)`, used in logs and listings.
    pub fn label(&self) -> String {
        format!("{} by {} ({})", self.title, self.author, self.isbn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub owner_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: MemberStatus,
}

impl Member {
    pub fn new(owner_id: Uuid, name: &str, email: &str) -> Self {
        Self {
            id: None,
            owner_id,
            name: name.to_string(),
            email: email.to_string(),
            phone: String::new(),
            address: String::new(),
            status: MemberStatus::default(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}
