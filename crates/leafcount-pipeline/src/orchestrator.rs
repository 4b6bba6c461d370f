// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page processing orchestrator — drives one page through OCR and analysis.
//
// States: Pending -> Processing -> {Done | Error}. Any state may be sent back
// to Processing by a re-process request, which always restarts from the top.
// There are no automatic retries.
//
// Every failure after the page has been loaded is recorded on the page as
// `Error` with the error's display text. Only a missing page or a failing
// document store aborts the attempt and surfaces to the caller.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::{Page, PageId, PageResult, PageState, PageStatus};
use leafcount_store::{DocumentStore, ImageStore};
use leafcount_text::{analyze, count_words, normalize};

use crate::credentials::CredentialSource;
use crate::download::ImageDownloader;
use crate::vision::{Annotation, OcrProvider};

/// Runs the per-page pipeline against injected collaborators.
///
/// Cloning is cheap; every clone shares the same collaborators.
#[derive(Clone)]
pub struct Orchestrator {
    documents: Arc<dyn DocumentStore>,
    images: Arc<dyn ImageStore>,
    provider: Arc<dyn OcrProvider>,
    credentials: Arc<dyn CredentialSource>,
    downloader: ImageDownloader,
    credential_name: String,
}

impl Orchestrator {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        images: Arc<dyn ImageStore>,
        provider: Arc<dyn OcrProvider>,
        credentials: Arc<dyn CredentialSource>,
        credential_name: impl Into<String>,
    ) -> Self {
        Self {
            documents,
            images,
            provider,
            credentials,
            downloader: ImageDownloader::default(),
            credential_name: credential_name.into(),
        }
    }

    /// Use the host's HTTP client for image downloads.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.downloader = ImageDownloader::new(http);
        self
    }

    /// Process a page to completion and return the status it settled in.
    ///
    /// Captured failures still return `Ok(PageStatus::Error)`.
    #[instrument(skip(self), fields(page_id = %page_id))]
    pub async fn process(&self, page_id: PageId) -> Result<PageStatus> {
        let page = self
            .documents
            .get_page(&page_id)?
            .ok_or(LeafcountError::PageNotFound(page_id))?;

        self.documents
            .update_page_state(&page_id, &PageState::Processing)?;
        info!(previous = %page.status(), "page processing started");

        let next = match self.run(&page).await {
            Ok(result) => {
                info!(word_count = result.word_count, "page processed");
                PageState::Done(result)
            }
            Err(e) if e.is_page_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "page processing failed");
                PageState::Error {
                    message: e.to_string(),
                }
            }
        };

        self.documents.update_page_state(&page_id, &next)?;
        Ok(next.status())
    }

    /// Start processing in the background.
    ///
    /// The handle resolves once the page has settled, so callers (and tests)
    /// can wait for completion.
    pub fn submit(&self, page_id: PageId) -> JoinHandle<Result<PageStatus>> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.process(page_id).await })
    }

    async fn run(&self, page: &Page) -> Result<PageResult> {
        let url = self
            .images
            .resolve(&page.image_ref)
            .await?
            .ok_or(LeafcountError::ImageNotFound)?;

        let api_key = self
            .credentials
            .get(&self.credential_name)
            .ok_or_else(|| LeafcountError::MissingCredential(self.credential_name.clone()))?;

        let image = self.downloader.download(self.images.as_ref(), &url).await?;
        let annotation = self.provider.annotate(&image, &api_key).await?;

        Ok(page_result(annotation))
    }
}

/// Build the stored result from a provider answer.
///
/// Words are counted on the normalized text. Bounding boxes are kept as the
/// provider reported them; readability is skipped for blank text.
pub fn page_result(annotation: Option<Annotation>) -> PageResult {
    let Some(annotation) = annotation else {
        return PageResult::empty();
    };

    let extracted_text = normalize(&annotation.full_text);
    let word_count = count_words(&extracted_text);
    let readability = if extracted_text.trim().is_empty() {
        None
    } else {
        Some(analyze(&extracted_text))
    };

    PageResult {
        extracted_text,
        word_count,
        bounding_boxes: Some(annotation.words),
        readability,
    }
}
