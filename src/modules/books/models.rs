use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn is_true(flag: &bool) -> bool {
    *flag
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// A book owned by one user. Stored as JSON under `book:<id>`.
///
/// `isActive` is only written when false, matching records written by
/// clients that never set the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier for the book
    pub id: String,
    /// Owning user
    pub user_id: String,
    pub title: String,
    pub description: String,
    /// Cover image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub is_active: bool,
}

/// A chapter of a book. Stored as JSON under `chapter:<id>`.
/// `isDeleted` is only written when true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub book_id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    /// ISO-8601 text, kept as-is
    pub edited_date: String,
    /// Position within the book; neither contiguous nor unique
    pub order_index: i32,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deleted: bool,
}
