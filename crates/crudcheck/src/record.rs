//! The book record exercised by the CRUD sequence

use serde::{Deserialize, Serialize};

/// Field values of a book, without the server-assigned identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: i64,
}

impl BookFields {
    pub fn new(title: impl Into<String>, author: impl Into<String>, year: i64) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year,
        }
    }

    /// Replacement values submitted by the update stage
    pub fn replacement() -> Self {
        Self::new("Updated Test Book", "New Author", 2025)
    }
}

impl Default for BookFields {
    fn default() -> Self {
        Self::new("Test Book", "Emmanuel Hop", 2024)
    }
}

/// A book as created on the server.
///
/// `id` stays `None` until the create stage stores the `_id` returned by the
/// service; update and delete read it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(flatten)]
    pub fields: BookFields,

    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl BookRecord {
    pub fn new(fields: BookFields) -> Self {
        Self { fields, id: None }
    }

    /// Identifier, if the record has been created and it is non-empty
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Whether the stored fields equal `other` exactly
    pub fn matches(&self, other: &BookFields) -> bool {
        &self.fields == other
    }
}

impl Default for BookRecord {
    fn default() -> Self {
        Self::new(BookFields::default())
    }
}
