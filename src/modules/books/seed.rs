//! Sample dataset written by the populate endpoint and `shelf-cli populate`.
//!
//! Writes are sequential and independent. The first failure aborts the run,
//! and whatever was written before it stays in the store.

use shelf_store::{KeyValueStore, StoreError};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::keys;
use super::models::{Book, Chapter};
use crate::utils::millis_ago;

/// Namespace for deterministic sample ids.
const SEED_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2b8e_94d3_4a57_b0e2_5c8d_1f3a_7e90);

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to encode {entity}: {source}")]
    Encode {
        entity: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How sample entity ids are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Fresh v4 ids on every run.
    Random,
    /// v5 ids derived from fixed names, identical across runs.
    Deterministic,
}

impl IdStrategy {
    fn id(self, name: &str) -> String {
        match self {
            IdStrategy::Random => Uuid::new_v4().to_string(),
            IdStrategy::Deterministic => Uuid::new_v5(&SEED_NAMESPACE, name.as_bytes()).to_string(),
        }
    }
}

/// Counts reported after a complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub books_created: usize,
    pub chapters_created: usize,
}

struct ChapterTemplate {
    book: usize,
    title: &'static str,
    content: &'static str,
    edited_date: &'static str,
    order_index: i32,
    created_minutes_ago: i64,
    updated_minutes_ago: i64,
    is_deleted: bool,
}

const CHAPTERS: &[ChapterTemplate] = &[
    ChapterTemplate {
        book: 0,
        title: "Getting Started with Rust",
        content: "Rust is a systems language that pairs low-level control with memory safety enforced at compile time...",
        edited_date: "2024-01-15T10:30:00Z",
        order_index: 1,
        created_minutes_ago: 1440,
        updated_minutes_ago: 1440,
        is_deleted: false,
    },
    ChapterTemplate {
        book: 0,
        title: "Ownership and Borrowing",
        content: "Every value has a single owner. References borrow a value without taking ownership, and the borrow checker keeps them valid...",
        edited_date: "2024-01-16T14:20:00Z",
        order_index: 2,
        created_minutes_ago: 1200,
        updated_minutes_ago: 600,
        is_deleted: false,
    },
    ChapterTemplate {
        book: 0,
        title: "Traits and Generics",
        content: "Traits describe shared behaviour. Generic functions accept any type that implements the traits they name...",
        edited_date: "2024-01-17T09:15:00Z",
        order_index: 3,
        created_minutes_ago: 1000,
        updated_minutes_ago: 300,
        is_deleted: false,
    },
    ChapterTemplate {
        book: 1,
        title: "What is Axum?",
        content: "Axum is a web framework built on tokio, tower and hyper. Handlers are plain async functions...",
        edited_date: "2024-01-18T11:00:00Z",
        order_index: 1,
        created_minutes_ago: 800,
        updated_minutes_ago: 400,
        is_deleted: false,
    },
    ChapterTemplate {
        book: 1,
        title: "Setting Up the Project",
        content: "Start by adding axum and tokio to Cargo.toml and writing a main function that binds a listener...",
        edited_date: "2024-01-18T15:30:00Z",
        order_index: 2,
        created_minutes_ago: 600,
        updated_minutes_ago: 200,
        is_deleted: false,
    },
    ChapterTemplate {
        book: 1,
        title: "Deleted Draft Chapter",
        content: "This content was deleted...",
        edited_date: "2024-01-17T08:00:00Z",
        order_index: 3,
        created_minutes_ago: 1600,
        updated_minutes_ago: 100,
        is_deleted: true,
    },
    ChapterTemplate {
        book: 2,
        title: "Introduction to Redis",
        content: "Redis is an open-source in-memory data store used as a database, cache and message broker...",
        edited_date: "2024-01-10T16:45:00Z",
        order_index: 1,
        created_minutes_ago: 2400,
        updated_minutes_ago: 1200,
        is_deleted: false,
    },
];

/// Two users, three books (the last inactive) and seven chapters (one deleted).
#[derive(Debug, Clone)]
pub struct SampleData {
    pub books: Vec<Book>,
    pub chapters: Vec<Chapter>,
}

impl SampleData {
    pub fn generate(ids: IdStrategy, now: OffsetDateTime) -> Self {
        let first_user = ids.id("user:1");
        let second_user = ids.id("user:2");

        let books = vec![
            Book {
                id: ids.id("book:1"),
                user_id: first_user.clone(),
                title: "The Art of Programming in Rust".to_string(),
                description: "A complete guide to mastering Rust and its most advanced features"
                    .to_string(),
                cover_image: Some("https://example.com/rust-book-cover.jpg".to_string()),
                created_at: millis_ago(now, 0),
                updated_at: millis_ago(now, 0),
                is_active: true,
            },
            Book {
                id: ids.id("book:2"),
                user_id: first_user,
                title: "Microservices with Axum".to_string(),
                description: "Learn to build scalable, efficient microservices with Axum"
                    .to_string(),
                cover_image: None,
                created_at: millis_ago(now, 1440),
                updated_at: millis_ago(now, 720),
                is_active: true,
            },
            Book {
                id: ids.id("book:3"),
                user_id: second_user,
                title: "Redis: The In-Memory Database".to_string(),
                description: "Everything you need to know about Redis and using it in modern applications"
                    .to_string(),
                cover_image: Some("https://example.com/redis-book-cover.jpg".to_string()),
                created_at: millis_ago(now, 2880),
                updated_at: millis_ago(now, 60),
                is_active: false,
            },
        ];

        let chapters = CHAPTERS
            .iter()
            .enumerate()
            .map(|(position, template)| {
                let book = &books[template.book];
                Chapter {
                    id: ids.id(&format!("chapter:{}", position + 1)),
                    book_id: book.id.clone(),
                    user_id: book.user_id.clone(),
                    title: template.title.to_string(),
                    content: template.content.to_string(),
                    edited_date: template.edited_date.to_string(),
                    order_index: template.order_index,
                    created_at: millis_ago(now, template.created_minutes_ago),
                    updated_at: millis_ago(now, template.updated_minutes_ago),
                    is_deleted: template.is_deleted,
                }
            })
            .collect();

        Self { books, chapters }
    }
}

/// Write `data` and its index sets to `store`.
///
/// Order: each book with its user index, each chapter with its book and user
/// indexes, then the `books:*` and `chapters:*` sets.
pub async fn write(store: &dyn KeyValueStore, data: &SampleData) -> Result<SeedReport, SeedError> {
    let mut books_created = 0;
    for book in &data.books {
        let value = encode(book, &book.id)?;
        store.set(&keys::book(&book.id), &value).await?;
        store.sadd(&keys::user_books(&book.user_id), &book.id).await?;
        books_created += 1;
    }

    let mut chapters_created = 0;
    for chapter in &data.chapters {
        let value = encode(chapter, &chapter.id)?;
        store.set(&keys::chapter(&chapter.id), &value).await?;
        store
            .sadd(&keys::book_chapters(&chapter.book_id), &chapter.id)
            .await?;
        store
            .sadd(&keys::user_chapters(&chapter.user_id), &chapter.id)
            .await?;
        chapters_created += 1;
    }

    for book in &data.books {
        store.sadd(keys::BOOKS_ALL, &book.id).await?;
        if book.is_active {
            store.sadd(keys::BOOKS_ACTIVE, &book.id).await?;
        }
    }

    for chapter in &data.chapters {
        store.sadd(keys::CHAPTERS_ALL, &chapter.id).await?;
        if !chapter.is_deleted {
            store.sadd(keys::CHAPTERS_ACTIVE, &chapter.id).await?;
        }
    }

    tracing::info!(books_created, chapters_created, "sample data written");

    Ok(SeedReport {
        books_created,
        chapters_created,
    })
}

fn encode<T: serde::Serialize>(entity: &T, id: &str) -> Result<String, SeedError> {
    serde_json::to_string_pretty(entity).map_err(|source| SeedError::Encode {
        entity: id.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_store::MemoryStore;
    use time::macros::datetime;

    fn sample(ids: IdStrategy) -> SampleData {
        SampleData::generate(ids, datetime!(2024-02-01 12:00:00 UTC))
    }

    #[test]
    fn dataset_shape() {
        let data = sample(IdStrategy::Random);
        assert_eq!(data.books.len(), 3);
        assert_eq!(data.chapters.len(), 7);
        assert_eq!(data.books.iter().filter(|b| b.is_active).count(), 2);
        assert_eq!(data.chapters.iter().filter(|c| c.is_deleted).count(), 1);

        let users: std::collections::BTreeSet<_> =
            data.books.iter().map(|b| b.user_id.as_str()).collect();
        assert_eq!(users.len(), 2);

        for chapter in &data.chapters {
            let book = data.books.iter().find(|b| b.id == chapter.book_id).unwrap();
            assert_eq!(chapter.user_id, book.user_id);
        }
    }

    #[test]
    fn deterministic_ids_repeat_and_random_ids_do_not() {
        let first = sample(IdStrategy::Deterministic);
        let second = sample(IdStrategy::Deterministic);
        assert_eq!(first.books[0].id, second.books[0].id);
        assert_eq!(first.chapters[6].id, second.chapters[6].id);

        let first = sample(IdStrategy::Random);
        let second = sample(IdStrategy::Random);
        assert_ne!(first.books[0].id, second.books[0].id);
    }

    #[tokio::test]
    async fn write_populates_records_and_indexes() {
        let store = MemoryStore::new();
        let data = sample(IdStrategy::Random);

        let report = write(&store, &data).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                books_created: 3,
                chapters_created: 7
            }
        );

        assert_eq!(store.members(keys::BOOKS_ALL).len(), 3);
        assert_eq!(store.members(keys::BOOKS_ACTIVE).len(), 2);
        assert_eq!(store.members(keys::CHAPTERS_ALL).len(), 7);
        assert_eq!(store.members(keys::CHAPTERS_ACTIVE).len(), 6);

        let first_book = &data.books[0];
        assert_eq!(store.members(&keys::book_chapters(&first_book.id)).len(), 3);
        assert_eq!(store.members(&keys::user_books(&first_book.user_id)).len(), 2);
        assert_eq!(store.members(&keys::user_chapters(&first_book.user_id)).len(), 6);

        let stored = store.get(&keys::book(&first_book.id)).await.unwrap().unwrap();
        let decoded: Book = serde_json::from_str(&stored).unwrap();
        assert_eq!(&decoded, first_book);
    }

    #[tokio::test]
    async fn deterministic_rerun_does_not_grow_the_store() {
        let store = MemoryStore::new();
        let at = datetime!(2024-02-01 12:00:00 UTC);

        write(&store, &SampleData::generate(IdStrategy::Deterministic, at))
            .await
            .unwrap();
        write(&store, &SampleData::generate(IdStrategy::Deterministic, at))
            .await
            .unwrap();

        assert_eq!(store.len(), 10);
        assert_eq!(store.members(keys::BOOKS_ALL).len(), 3);
        assert_eq!(store.members(keys::CHAPTERS_ALL).len(), 7);
    }

    #[tokio::test]
    async fn failure_aborts_remaining_writes() {
        let store = MemoryStore::new();
        store.fail_after_writes(3, "connection reset by peer");

        let err = write(&store, &sample(IdStrategy::Random)).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset by peer");

        // First book and its user index, then the second book record.
        assert_eq!(store.len(), 2);
        assert!(store.members(keys::BOOKS_ALL).is_empty());
    }
}
