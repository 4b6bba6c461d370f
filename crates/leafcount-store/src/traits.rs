// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Collaborator contracts consumed by the processing core.
//
// The document store is the only point of contention between concurrently
// processed pages. Writes are last-write-wins, keyed by id.

use async_trait::async_trait;

use leafcount_core::error::Result;
use leafcount_core::types::{Book, BookId, ImageRef, Page, PageId, PageState};

/// Per-record storage for books and pages.
///
/// Methods are synchronous: local implementations answer in well under a
/// millisecond. Implementations must be safe to share between tasks.
pub trait DocumentStore: Send + Sync {
    /// Insert a new book.
    fn insert_book(&self, book: &Book) -> Result<()>;

    /// Fetch a book by id. `None` if it does not exist.
    fn get_book(&self, id: &BookId) -> Result<Option<Book>>;

    /// All books, newest first.
    fn list_books(&self) -> Result<Vec<Book>>;

    /// Find the book imported from the given external record.
    fn find_book_by_external_id(&self, external_id: &str) -> Result<Option<Book>>;

    /// Delete the book record only. Idempotent.
    fn delete_book(&self, id: &BookId) -> Result<()>;

    /// Insert a new page.
    fn insert_page(&self, page: &Page) -> Result<()>;

    /// Fetch a page by id. `None` if it does not exist.
    fn get_page(&self, id: &PageId) -> Result<Option<Page>>;

    /// Every page of a book, ordered by page number.
    fn pages_for_book(&self, book_id: &BookId) -> Result<Vec<Page>>;

    /// How many pages, across all books, point at the given image.
    fn count_pages_with_image(&self, image_ref: &ImageRef) -> Result<usize>;

    /// Replace the processing state of a page.
    ///
    /// Every state field is rewritten from `state`, so nothing from an earlier
    /// attempt survives. Fails with `PageNotFound` if the page is gone.
    fn update_page_state(&self, id: &PageId, state: &PageState) -> Result<()>;

    /// Delete a page record. Idempotent.
    fn delete_page(&self, id: &PageId) -> Result<()>;
}

/// Storage for page images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store image bytes and return a reference to them.
    async fn put(&self, data: &[u8]) -> Result<ImageRef>;

    /// Resolve a reference to a URL the bytes can be fetched from.
    /// `None` if the image is not (or no longer) stored.
    async fn resolve(&self, image_ref: &ImageRef) -> Result<Option<String>>;

    /// Download the bytes behind a URL returned by [`ImageStore::resolve`].
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Remove an image. Idempotent.
    async fn delete(&self, image_ref: &ImageRef) -> Result<()>;
}
