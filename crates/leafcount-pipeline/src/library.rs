// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Library operations — book and page records around the processing pipeline.
//
// A book owns its pages, and a page owns its image: deleting a book removes
// every page and image under it. Images are content-addressed, so pages
// uploaded from the same photo share one image, which is only removed with
// the last page that points at it.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::{
    Book, BookId, BookOverview, BookSummary, ExternalBook, ExternalLink, ImageRef, Page, PageId,
    PageStatus,
};
use leafcount_store::{DocumentStore, ImageStore};

use crate::aggregator;
use crate::orchestrator::Orchestrator;

/// Handle to a page-processing task.
pub type ProcessingTask = JoinHandle<Result<PageStatus>>;

/// A page together with a URL for its image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageListing {
    #[serde(flatten)]
    pub page: Page,
    /// `None` when the image can no longer be resolved.
    pub image_url: Option<String>,
}

/// Book and page operations exposed to the host.
#[derive(Clone)]
pub struct Library {
    documents: Arc<dyn DocumentStore>,
    images: Arc<dyn ImageStore>,
    orchestrator: Orchestrator,
}

impl Library {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        images: Arc<dyn ImageStore>,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            documents,
            images,
            orchestrator,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    // -- Books --

    pub fn create_book(
        &self,
        title: impl Into<String>,
        author: Option<String>,
        total_pages: Option<u32>,
    ) -> Result<Book> {
        let mut book = Book::new(title);
        book.author = author;
        book.total_pages = known_total(total_pages);
        self.documents.insert_book(&book)?;
        Ok(book)
    }

    pub fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        self.documents.get_book(id)
    }

    /// Every book, newest first, with its page counts.
    pub fn list_books(&self) -> Result<Vec<BookOverview>> {
        self.documents
            .list_books()?
            .into_iter()
            .map(|book| {
                let pages = self.documents.pages_for_book(&book.id)?;
                Ok(aggregator::overview(book, &pages))
            })
            .collect()
    }

    /// Delete a book with all of its pages and their images.
    ///
    /// Deleting a book that does not exist is a no-op.
    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn delete_book(&self, id: &BookId) -> Result<()> {
        let pages = self.documents.pages_for_book(id)?;
        for page in &pages {
            self.documents.delete_page(&page.id)?;
            self.release_image(&page.image_ref).await?;
        }
        self.documents.delete_book(id)?;
        info!(pages = pages.len(), "book deleted with its pages");
        Ok(())
    }

    /// Create a book for an external reading-tracker record.
    ///
    /// Importing the same external id again returns the existing book's id
    /// and changes nothing.
    #[instrument(skip(self, external), fields(external_id = %external.external_id))]
    pub fn import_external_book(&self, external: ExternalBook) -> Result<BookId> {
        if let Some(existing) = self
            .documents
            .find_book_by_external_id(&external.external_id)?
        {
            info!(book_id = %existing.id, "external book already imported");
            return Ok(existing.id);
        }

        let mut book = Book::new(external.title);
        book.author = external.author;
        book.total_pages = known_total(external.total_pages);
        book.external = Some(ExternalLink {
            external_id: external.external_id,
            external_user_id: external.external_user_id,
        });
        self.documents.insert_book(&book)?;
        Ok(book.id)
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<Book>> {
        self.documents.find_book_by_external_id(external_id)
    }

    /// Book statistics computed from its current pages.
    pub fn summarize_book(&self, id: &BookId) -> Result<BookSummary> {
        let book = self
            .documents
            .get_book(id)?
            .ok_or(LeafcountError::BookNotFound(*id))?;
        let pages = self.documents.pages_for_book(id)?;
        Ok(aggregator::summarize(book, &pages))
    }

    // -- Pages --

    /// Record a page for an already-stored image. The page starts `Pending`.
    pub fn create_page(
        &self,
        book_id: &BookId,
        image_ref: ImageRef,
        page_number: u32,
    ) -> Result<Page> {
        if page_number == 0 {
            return Err(LeafcountError::InvalidPageNumber(page_number));
        }
        self.require_book(book_id)?;

        let page = Page::new(*book_id, image_ref, page_number);
        self.documents.insert_page(&page)?;
        Ok(page)
    }

    pub fn get_page(&self, id: &PageId) -> Result<Option<Page>> {
        self.documents.get_page(id)
    }

    /// Store a page photo, create its page and start processing it.
    #[instrument(skip(self, image), fields(book_id = %book_id, bytes = image.len()))]
    pub async fn upload_page(
        &self,
        book_id: &BookId,
        page_number: u32,
        image: &[u8],
    ) -> Result<(PageId, ProcessingTask)> {
        if page_number == 0 {
            return Err(LeafcountError::InvalidPageNumber(page_number));
        }
        self.require_book(book_id)?;

        let image_ref = self.images.put(image).await?;
        let page = self.create_page(book_id, image_ref, page_number)?;
        info!(page_id = %page.id, page_number, "page uploaded");

        let task = self.orchestrator.submit(page.id);
        Ok((page.id, task))
    }

    /// Run a page through the pipeline again, from the top.
    pub fn reprocess_page(&self, id: &PageId) -> Result<ProcessingTask> {
        if self.documents.get_page(id)?.is_none() {
            return Err(LeafcountError::PageNotFound(*id));
        }
        info!(page_id = %id, "re-process requested");
        Ok(self.orchestrator.submit(*id))
    }

    /// Delete a page and, unless another page shares it, its image.
    /// Deleting a missing page is a no-op.
    #[instrument(skip(self), fields(page_id = %id))]
    pub async fn delete_page(&self, id: &PageId) -> Result<()> {
        let Some(page) = self.documents.get_page(id)? else {
            return Ok(());
        };
        self.documents.delete_page(id)?;
        self.release_image(&page.image_ref).await
    }

    /// The book's pages in page-number order, each with its image URL.
    pub async fn list_pages(&self, book_id: &BookId) -> Result<Vec<PageListing>> {
        let pages = self.documents.pages_for_book(book_id)?;
        let mut listings = Vec::with_capacity(pages.len());
        for page in pages {
            let image_url = self.images.resolve(&page.image_ref).await?;
            listings.push(PageListing { page, image_url });
        }
        Ok(listings)
    }

    /// Remove an image once no page refers to it.
    async fn release_image(&self, image_ref: &ImageRef) -> Result<()> {
        let remaining = self.documents.count_pages_with_image(image_ref)?;
        if remaining > 0 {
            debug!(image_ref = %image_ref, remaining, "image still in use, kept");
            return Ok(());
        }
        self.images.delete(image_ref).await
    }

    fn require_book(&self, id: &BookId) -> Result<()> {
        match self.documents.get_book(id)? {
            Some(_) => Ok(()),
            None => Err(LeafcountError::BookNotFound(*id)),
        }
    }
}

/// A page total of zero means the page count is unknown.
fn known_total(total_pages: Option<u32>) -> Option<u32> {
    total_pages.filter(|&total| total > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, ProviderReply, PNG_BYTES};

    fn external(id: &str) -> ExternalBook {
        ExternalBook {
            external_id: id.into(),
            external_user_id: "reader-1".into(),
            title: "Middlemarch".into(),
            author: Some("George Eliot".into()),
            total_pages: Some(880),
        }
    }

    #[tokio::test]
    async fn upload_then_summarize() {
        let harness = Harness::new();
        let library = harness.library();
        let book = library
            .create_book("Sampled", None, Some(100))
            .expect("create book");

        for text in ["One two three four.", "Five six seven eight nine ten."] {
            harness
                .provider
                .push(ProviderReply::Text(text.into(), Vec::new()));
        }
        for number in [1, 2] {
            let (_, task) = library
                .upload_page(&book.id, number, PNG_BYTES)
                .await
                .expect("upload");
            let status = task.await.expect("joined").expect("processed");
            assert_eq!(status, PageStatus::Done);
        }

        let summary = library.summarize_book(&book.id).expect("summary");
        assert_eq!(summary.total_word_count, 10);
        assert_eq!(summary.page_count, 2);
        assert_eq!(summary.processed_count, 2);
        assert_eq!(summary.sampling.as_ref().map(|s| s.mean), Some(5.0));
        assert_eq!(summary.estimate.map(|e| e.estimated_total), Some(500));
        assert_eq!(
            summary.average_readability.map(|a| a.page_count),
            Some(2)
        );
    }

    #[tokio::test]
    async fn upload_rejects_unknown_book_and_bad_numbers() {
        let harness = Harness::new();
        let library = harness.library();

        let missing = library.upload_page(&BookId::new(), 1, PNG_BYTES).await;
        assert!(matches!(missing, Err(LeafcountError::BookNotFound(_))));

        let book = library.create_book("Real", None, None).expect("create");
        let zero = library.upload_page(&book.id, 0, PNG_BYTES).await;
        assert!(matches!(zero, Err(LeafcountError::InvalidPageNumber(0))));
        assert_eq!(harness.images.len(), 0);
    }

    #[tokio::test]
    async fn pages_listed_in_order_with_urls() {
        let harness = Harness::new();
        let library = harness.library();
        let book = library.create_book("Ordered", None, None).expect("create");

        let stored = harness.store_image().await;
        library
            .create_page(&book.id, stored.clone(), 3)
            .expect("page 3");
        library
            .create_page(&book.id, ImageRef("gone".into()), 1)
            .expect("page 1");
        library.create_page(&book.id, stored, 2).expect("page 2");

        let listings = library.list_pages(&book.id).await.expect("list");
        let numbers: Vec<u32> = listings.iter().map(|l| l.page.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(listings[0].image_url.is_none());
        assert!(listings[1].image_url.is_some());
        assert!(listings.iter().all(|l| l.page.status() == PageStatus::Pending));
    }

    #[tokio::test]
    async fn delete_book_cascades() {
        let harness = Harness::new();
        let library = harness.library();
        let book = library.create_book("Doomed", None, None).expect("create");
        let keeper = library.create_book("Keeper", None, None).expect("create");

        let first = harness.store_image_bytes(b"first").await;
        let second = harness.store_image_bytes(b"second").await;
        let kept = harness.store_image_bytes(b"kept").await;
        let p1 = library.create_page(&book.id, first.clone(), 1).expect("p1");
        let p2 = library.create_page(&book.id, second.clone(), 2).expect("p2");
        library.create_page(&keeper.id, kept.clone(), 1).expect("kept");

        library.delete_book(&book.id).await.expect("delete");

        assert!(library.get_book(&book.id).expect("get").is_none());
        assert!(harness.stored_page(&p1.id).is_none());
        assert!(harness.stored_page(&p2.id).is_none());
        assert!(!harness.images.contains(&first));
        assert!(!harness.images.contains(&second));
        assert!(harness.images.contains(&kept));
        assert_eq!(library.list_pages(&keeper.id).await.expect("list").len(), 1);

        library.delete_book(&book.id).await.expect("delete again");
    }

    #[tokio::test]
    async fn delete_page_removes_image() {
        let harness = Harness::new();
        let library = harness.library();
        let book = library.create_book("Pages", None, None).expect("create");
        let image_ref = harness.store_image().await;
        let page = library
            .create_page(&book.id, image_ref.clone(), 1)
            .expect("page");

        library.delete_page(&page.id).await.expect("delete");
        assert!(harness.stored_page(&page.id).is_none());
        assert!(!harness.images.contains(&image_ref));

        library.delete_page(&page.id).await.expect("delete missing");
    }

    #[test]
    fn import_is_idempotent() {
        let harness = Harness::new();
        let library = harness.library();

        let first = library
            .import_external_book(external("fb-42"))
            .expect("import");
        let mut changed = external("fb-42");
        changed.title = "Renamed".into();
        let second = library.import_external_book(changed).expect("re-import");
        assert_eq!(first, second);

        let book = library
            .find_by_external_id("fb-42")
            .expect("lookup")
            .expect("found");
        assert_eq!(book.title, "Middlemarch");
        assert_eq!(book.total_pages, Some(880));
        assert_eq!(library.list_books().expect("list").len(), 1);
    }

    #[test]
    fn list_books_reports_counts() {
        let harness = Harness::new();
        let library = harness.library();
        let book = library.create_book("Counted", None, None).expect("create");
        library
            .create_page(&book.id, ImageRef("a".into()), 1)
            .expect("page");

        let listing = library.list_books().expect("list");
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].page_count, 1);
        assert_eq!(listing[0].processed_count, 0);
        assert_eq!(listing[0].total_word_count, 0);
    }

    #[test]
    fn unknown_book_summary_is_not_found() {
        let harness = Harness::new();
        let result = harness.library().summarize_book(&BookId::new());
        assert!(matches!(result, Err(LeafcountError::BookNotFound(_))));
    }

    #[tokio::test]
    async fn reprocess_requires_existing_page() {
        let harness = Harness::new();
        let library = harness.library();
        assert!(matches!(
            library.reprocess_page(&PageId::new()),
            Err(LeafcountError::PageNotFound(_))
        ));

        let book = library.create_book("Again", None, None).expect("create");
        let image_ref = harness.store_image().await;
        let page = library.create_page(&book.id, image_ref, 1).expect("page");
        harness
            .provider
            .push(ProviderReply::Text("Once more.".into(), Vec::new()));

        let status = library
            .reprocess_page(&page.id)
            .expect("submitted")
            .await
            .expect("joined")
            .expect("processed");
        assert_eq!(status, PageStatus::Done);
    }

    #[tokio::test]
    async fn shared_photo_survives_deleting_one_page() {
        let harness = Harness::new();
        let library = harness.library();
        let book = library.create_book("Twice", None, None).expect("create");

        let mut uploaded = Vec::new();
        for number in [1, 2] {
            harness
                .provider
                .push(ProviderReply::Text("Same photo.".into(), Vec::new()));
            let (page_id, task) = library
                .upload_page(&book.id, number, PNG_BYTES)
                .await
                .expect("upload");
            task.await.expect("joined").expect("processed");
            uploaded.push(page_id);
        }
        let first = harness.stored(&uploaded[0]);
        let second = harness.stored(&uploaded[1]);
        assert_eq!(first.image_ref, second.image_ref);

        library.delete_page(&first.id).await.expect("delete");
        assert!(harness.images.contains(&second.image_ref));

        harness
            .provider
            .push(ProviderReply::Text("Same photo.".into(), Vec::new()));
        let status = library
            .reprocess_page(&second.id)
            .expect("submitted")
            .await
            .expect("joined")
            .expect("processed");
        assert_eq!(status, PageStatus::Done);

        library.delete_page(&second.id).await.expect("delete last");
        assert!(!harness.images.contains(&second.image_ref));
    }

    #[tokio::test]
    async fn delete_book_keeps_images_used_by_other_books() {
        let harness = Harness::new();
        let library = harness.library();
        let doomed = library.create_book("Doomed", None, None).expect("create");
        let keeper = library.create_book("Keeper", None, None).expect("create");

        let shared = harness.store_image().await;
        library
            .create_page(&doomed.id, shared.clone(), 1)
            .expect("doomed page");
        library
            .create_page(&doomed.id, shared.clone(), 2)
            .expect("doomed duplicate");
        library
            .create_page(&keeper.id, shared.clone(), 1)
            .expect("keeper page");

        library.delete_book(&doomed.id).await.expect("delete");
        assert!(harness.images.contains(&shared));

        let listings = library.list_pages(&keeper.id).await.expect("list");
        assert!(listings[0].image_url.is_some());
    }

    #[test]
    fn zero_total_pages_is_unknown() {
        let harness = Harness::new();
        let library = harness.library();

        let created = library
            .create_book("Unpaged", None, Some(0))
            .expect("create");
        assert_eq!(created.total_pages, None);

        let mut record = external("fb-0");
        record.total_pages = Some(0);
        let imported = library.import_external_book(record).expect("import");
        let stored = library.get_book(&imported).expect("get").expect("found");
        assert_eq!(stored.total_pages, None);
    }
}
