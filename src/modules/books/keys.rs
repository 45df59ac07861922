//! Key layout in the store's flat namespace.

/// Every book id.
pub const BOOKS_ALL: &str = "books:all";
/// Ids of books with `is_active`.
pub const BOOKS_ACTIVE: &str = "books:active";
/// Every chapter id.
pub const CHAPTERS_ALL: &str = "chapters:all";
/// Ids of chapters without `is_deleted`.
pub const CHAPTERS_ACTIVE: &str = "chapters:active";

pub fn book(id: &str) -> String {
    format!("book:{id}")
}

pub fn chapter(id: &str) -> String {
    format!("chapter:{id}")
}

pub fn user_books(user_id: &str) -> String {
    format!("user:{user_id}:books")
}

pub fn user_chapters(user_id: &str) -> String {
    format!("user:{user_id}:chapters")
}

pub fn book_chapters(book_id: &str) -> String {
    format!("book:{book_id}:chapters")
}
