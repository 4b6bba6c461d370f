// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book and page records backed by SQLite.
//
// Page state is spread over plain columns (status, text, counts, error) with
// the structured parts (bounding boxes, readability) held as JSON. A state
// write always sets every one of those columns, so stale results from a
// previous attempt cannot leak into the next status.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::{
    Book, BookId, BoundingBox, ExternalLink, ImageRef, Page, PageId, PageResult, PageState,
    PageStatus, ReadabilityMetrics,
};

use crate::traits::DocumentStore;

/// SQLite schema for books and pages.
const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT,
        total_pages INTEGER,
        external_id TEXT,
        external_user_id TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS books_by_external_id ON books (external_id);

    CREATE TABLE IF NOT EXISTS pages (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL,
        page_number INTEGER NOT NULL,
        image_ref TEXT NOT NULL,
        status TEXT NOT NULL,
        extracted_text TEXT,
        word_count INTEGER,
        error_message TEXT,
        bounding_boxes TEXT,
        readability TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS pages_by_book ON pages (book_id);
    CREATE INDEX IF NOT EXISTS pages_by_image ON pages (image_ref);
"#;

const BOOK_COLUMNS: &str =
    "id, title, author, total_pages, external_id, external_user_id, created_at";

const PAGE_COLUMNS: &str = "id, book_id, page_number, image_ref, status, extracted_text, \
     word_count, error_message, bounding_boxes, readability, created_at";

/// Convert a `rusqlite::Error` into a `LeafcountError::Database`.
fn db_err(e: rusqlite::Error) -> LeafcountError {
    LeafcountError::Database(e.to_string())
}

/// Document store backed by a single SQLite connection.
///
/// The connection sits behind a mutex so one store can be shared by every
/// page pipeline in the process.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    ///
    /// Applies WAL journal mode and creates the tables if they do not exist.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| LeafcountError::Database(format!("open: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| LeafcountError::Database(format!("WAL pragma: {e}")))?;

        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| LeafcountError::Database(format!("create tables: {e}")))?;

        info!("document store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LeafcountError::Database(format!("open in-memory: {e}")))?;

        conn.execute_batch(CREATE_TABLES_SQL)
            .map_err(|e| LeafcountError::Database(format!("create tables: {e}")))?;

        debug!("in-memory document store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LeafcountError::Database("connection lock poisoned".into()))
    }
}

impl DocumentStore for SqliteStore {
    #[instrument(skip(self, book), fields(book_id = %book.id))]
    fn insert_book(&self, book: &Book) -> Result<()> {
        let (external_id, external_user_id) = match &book.external {
            Some(link) => (
                Some(link.external_id.as_str()),
                Some(link.external_user_id.as_str()),
            ),
            None => (None, None),
        };

        self.conn()?
            .execute(
                &format!("INSERT INTO books ({BOOK_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                params![
                    book.id.to_string(),
                    book.title,
                    book.author,
                    book.total_pages,
                    external_id,
                    external_user_id,
                    timestamp(&book.created_at),
                ],
            )
            .map_err(|e| LeafcountError::Database(format!("insert book: {e}")))?;

        info!(book_id = %book.id, title = %book.title, "book inserted");
        Ok(())
    }

    fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        self.conn()?
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
                params![id.to_string()],
                row_to_book,
            )
            .optional()
            .map_err(db_err)
    }

    fn list_books(&self) -> Result<Vec<Book>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC"
            ))
            .map_err(|e| LeafcountError::Database(format!("prepare list_books: {e}")))?;

        let books = stmt
            .query_map([], row_to_book)
            .map_err(|e| LeafcountError::Database(format!("query list_books: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LeafcountError::Database(format!("collect rows: {e}")))?;

        debug!(count = books.len(), "listed books");
        Ok(books)
    }

    fn find_book_by_external_id(&self, external_id: &str) -> Result<Option<Book>> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {BOOK_COLUMNS} FROM books WHERE external_id = ?1 \
                     ORDER BY created_at ASC LIMIT 1"
                ),
                params![external_id],
                row_to_book,
            )
            .optional()
            .map_err(db_err)
    }

    #[instrument(skip(self), fields(book_id = %id))]
    fn delete_book(&self, id: &BookId) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM books WHERE id = ?1", params![id.to_string()])
            .map_err(|e| LeafcountError::Database(format!("delete book: {e}")))?;

        info!(book_id = %id, "book deleted");
        Ok(())
    }

    #[instrument(skip(self, page), fields(page_id = %page.id, book_id = %page.book_id))]
    fn insert_page(&self, page: &Page) -> Result<()> {
        let columns = StateColumns::from_state(&page.state)?;

        self.conn()?
            .execute(
                &format!(
                    "INSERT INTO pages ({PAGE_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
                ),
                params![
                    page.id.to_string(),
                    page.book_id.to_string(),
                    page.page_number,
                    page.image_ref.as_str(),
                    columns.status,
                    columns.extracted_text,
                    columns.word_count,
                    columns.error_message,
                    columns.bounding_boxes,
                    columns.readability,
                    timestamp(&page.created_at),
                ],
            )
            .map_err(|e| LeafcountError::Database(format!("insert page: {e}")))?;

        info!(page_id = %page.id, page_number = page.page_number, "page inserted");
        Ok(())
    }

    fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        self.conn()?
            .query_row(
                &format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = ?1"),
                params![id.to_string()],
                row_to_page,
            )
            .optional()
            .map_err(db_err)
    }

    fn pages_for_book(&self, book_id: &BookId) -> Result<Vec<Page>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {PAGE_COLUMNS} FROM pages WHERE book_id = ?1
                 ORDER BY page_number ASC, created_at ASC"
            ))
            .map_err(|e| LeafcountError::Database(format!("prepare pages_for_book: {e}")))?;

        let pages = stmt
            .query_map(params![book_id.to_string()], row_to_page)
            .map_err(|e| LeafcountError::Database(format!("query pages_for_book: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| LeafcountError::Database(format!("collect rows: {e}")))?;

        debug!(book_id = %book_id, count = pages.len(), "listed pages");
        Ok(pages)
    }

    fn count_pages_with_image(&self, image_ref: &ImageRef) -> Result<usize> {
        let count: i64 = self
            .conn()?
            .query_row(
                "SELECT COUNT(*) FROM pages WHERE image_ref = ?1",
                params![image_ref.as_str()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count as usize)
    }

    #[instrument(skip(self, state), fields(page_id = %id, status = %state.status()))]
    fn update_page_state(&self, id: &PageId, state: &PageState) -> Result<()> {
        let columns = StateColumns::from_state(state)?;

        let rows = self
            .conn()?
            .execute(
                "UPDATE pages SET status = ?1, extracted_text = ?2, word_count = ?3,
                 error_message = ?4, bounding_boxes = ?5, readability = ?6
                 WHERE id = ?7",
                params![
                    columns.status,
                    columns.extracted_text,
                    columns.word_count,
                    columns.error_message,
                    columns.bounding_boxes,
                    columns.readability,
                    id.to_string(),
                ],
            )
            .map_err(|e| LeafcountError::Database(format!("update page state: {e}")))?;

        if rows == 0 {
            return Err(LeafcountError::PageNotFound(*id));
        }

        debug!(page_id = %id, status = %state.status(), "page state updated");
        Ok(())
    }

    #[instrument(skip(self), fields(page_id = %id))]
    fn delete_page(&self, id: &PageId) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM pages WHERE id = ?1", params![id.to_string()])
            .map_err(|e| LeafcountError::Database(format!("delete page: {e}")))?;

        info!(page_id = %id, "page deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// State <-> columns
// ---------------------------------------------------------------------------

/// The column values that encode a `PageState`.
struct StateColumns {
    status: &'static str,
    extracted_text: Option<String>,
    word_count: Option<i64>,
    error_message: Option<String>,
    bounding_boxes: Option<String>,
    readability: Option<String>,
}

impl StateColumns {
    fn from_state(state: &PageState) -> Result<Self> {
        let mut columns = Self {
            status: state.status().as_str(),
            extracted_text: None,
            word_count: None,
            error_message: None,
            bounding_boxes: None,
            readability: None,
        };

        match state {
            PageState::Pending | PageState::Processing => {}
            PageState::Done(result) => {
                columns.extracted_text = Some(result.extracted_text.clone());
                columns.word_count = Some(result.word_count as i64);
                columns.bounding_boxes = result
                    .bounding_boxes
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                columns.readability = result
                    .readability
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
            }
            PageState::Error { message } => {
                columns.error_message = Some(message.clone());
            }
        }

        Ok(columns)
    }
}

fn conversion_err<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

/// Fixed-width RFC 3339 so that `ORDER BY created_at` sorts chronologically.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(column, e))
}

fn parse_uuid(column: usize, value: &str) -> rusqlite::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(value).map_err(|e| conversion_err(column, e))
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a SQLite row to a `Book`. Column order follows `BOOK_COLUMNS`.
fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    let id_str: String = row.get(0)?;
    let external_id: Option<String> = row.get(4)?;
    let external_user_id: Option<String> = row.get(5)?;
    let created_at_str: String = row.get(6)?;

    let external = external_id.map(|external_id| ExternalLink {
        external_id,
        external_user_id: external_user_id.unwrap_or_default(),
    });

    Ok(Book {
        id: BookId(parse_uuid(0, &id_str)?),
        title: row.get(1)?,
        author: row.get(2)?,
        total_pages: row.get(3)?,
        external,
        created_at: parse_timestamp(6, &created_at_str)?,
    })
}

/// Map a SQLite row to a `Page`. Column order follows `PAGE_COLUMNS`.
fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<Page> {
    let id_str: String = row.get(0)?;
    let book_id_str: String = row.get(1)?;
    let image_ref: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(10)?;

    let status: PageStatus = status_str.parse().map_err(|msg: String| {
        conversion_err(
            4,
            std::io::Error::new(std::io::ErrorKind::InvalidData, msg),
        )
    })?;

    let state = match status {
        PageStatus::Pending => PageState::Pending,
        PageStatus::Processing => PageState::Processing,
        PageStatus::Done => {
            let bounding_boxes_json: Option<String> = row.get(8)?;
            let readability_json: Option<String> = row.get(9)?;

            let bounding_boxes: Option<Vec<BoundingBox>> = bounding_boxes_json
                .map(|json| serde_json::from_str(&json))
                .transpose()
                .map_err(|e| conversion_err(8, e))?;
            let readability: Option<ReadabilityMetrics> = readability_json
                .map(|json| serde_json::from_str(&json))
                .transpose()
                .map_err(|e| conversion_err(9, e))?;

            PageState::Done(PageResult {
                extracted_text: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                word_count: row.get::<_, Option<i64>>(6)?.unwrap_or(0).max(0) as usize,
                bounding_boxes,
                readability,
            })
        }
        PageStatus::Error => PageState::Error {
            message: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        },
    };

    Ok(Page {
        id: PageId(parse_uuid(0, &id_str)?),
        book_id: BookId(parse_uuid(1, &book_id_str)?),
        page_number: row.get(2)?,
        image_ref: ImageRef(image_ref),
        state,
        created_at: parse_timestamp(10, &created_at_str)?,
    })
}
