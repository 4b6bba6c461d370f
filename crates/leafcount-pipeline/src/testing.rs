// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory collaborators shared by the pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use leafcount_core::config::DEFAULT_CREDENTIAL_NAME;
use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::{BookId, BoundingBox, ImageRef, Page, PageId, Vertex};
use leafcount_store::{DocumentStore, ImageStore, SqliteStore, content_ref};

use crate::credentials::{CredentialSource, StaticCredentials};
use crate::library::Library;
use crate::orchestrator::Orchestrator;
use crate::vision::{Annotation, OcrProvider};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRtest";

const MEM_SCHEME: &str = "mem://";

/// Image store backed by a map.
#[derive(Default)]
pub struct MemoryImages {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImages {
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("lock").len()
    }

    pub fn contains(&self, image_ref: &ImageRef) -> bool {
        self.blobs.lock().expect("lock").contains_key(image_ref.as_str())
    }
}

#[async_trait]
impl ImageStore for MemoryImages {
    async fn put(&self, data: &[u8]) -> Result<ImageRef> {
        let image_ref = content_ref(data);
        self.blobs
            .lock()
            .expect("lock")
            .insert(image_ref.to_string(), data.to_vec());
        Ok(image_ref)
    }

    async fn resolve(&self, image_ref: &ImageRef) -> Result<Option<String>> {
        Ok(self
            .contains(image_ref)
            .then(|| format!("{MEM_SCHEME}{image_ref}")))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let key = url.strip_prefix(MEM_SCHEME).unwrap_or(url);
        self.blobs
            .lock()
            .expect("lock")
            .get(key)
            .cloned()
            .ok_or_else(|| LeafcountError::ImageFetch(format!("no blob at {url}")))
    }

    async fn delete(&self, image_ref: &ImageRef) -> Result<()> {
        self.blobs.lock().expect("lock").remove(image_ref.as_str());
        Ok(())
    }
}

/// What the scripted provider answers with next.
pub enum ProviderReply {
    Text(String, Vec<BoundingBox>),
    Nothing,
    Failure(u16, String),
}

/// OCR provider that plays back queued replies in order.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ProviderReply>>,
    calls: AtomicUsize,
    last_api_key: Mutex<Option<String>>,
}

impl ScriptedProvider {
    pub fn push(&self, reply: ProviderReply) {
        self.replies.lock().expect("lock").push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.last_api_key.lock().expect("lock").clone()
    }
}

#[async_trait]
impl OcrProvider for ScriptedProvider {
    async fn annotate(&self, _image: &[u8], api_key: &str) -> Result<Option<Annotation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_api_key.lock().expect("lock") = Some(api_key.to_string());

        let reply = self.replies.lock().expect("lock").pop_front();
        match reply {
            Some(ProviderReply::Text(full_text, words)) => Ok(Some(Annotation { full_text, words })),
            Some(ProviderReply::Nothing) | None => Ok(None),
            Some(ProviderReply::Failure(status, body)) => {
                Err(LeafcountError::Provider { status, body })
            }
        }
    }
}

/// Word boxes with a unit square polygon.
pub fn words(texts: &[&str]) -> Vec<BoundingBox> {
    texts
        .iter()
        .map(|text| BoundingBox {
            text: (*text).to_string(),
            vertices: vec![
                Vertex { x: 0, y: 0 },
                Vertex { x: 1, y: 0 },
                Vertex { x: 1, y: 1 },
                Vertex { x: 0, y: 1 },
            ],
        })
        .collect()
}

/// An orchestrator wired to in-memory collaborators.
pub struct Harness {
    pub documents: Arc<SqliteStore>,
    pub images: Arc<MemoryImages>,
    pub provider: Arc<ScriptedProvider>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_credentials(StaticCredentials::new().with(DEFAULT_CREDENTIAL_NAME, "test-key"))
    }

    pub fn without_credentials() -> Self {
        Self::with_credentials(StaticCredentials::new())
    }

    fn with_credentials(credentials: impl CredentialSource + 'static) -> Self {
        let documents = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
        let images = Arc::new(MemoryImages::default());
        let provider = Arc::new(ScriptedProvider::default());
        let orchestrator = Orchestrator::new(
            documents.clone(),
            images.clone(),
            provider.clone(),
            Arc::new(credentials),
            DEFAULT_CREDENTIAL_NAME,
        );
        Self {
            documents,
            images,
            provider,
            orchestrator,
        }
    }

    pub fn library(&self) -> Library {
        Library::new(
            self.documents.clone(),
            self.images.clone(),
            self.orchestrator.clone(),
        )
    }

    pub async fn store_image(&self) -> ImageRef {
        self.store_image_bytes(PNG_BYTES).await
    }

    pub async fn store_image_bytes(&self, data: &[u8]) -> ImageRef {
        self.images.put(data).await.expect("put image")
    }

    /// A pending page, outside any book, whose image is stored.
    pub async fn page_with_image(&self) -> Page {
        let image_ref = self.store_image().await;
        self.page_with_ref(image_ref)
    }

    pub fn page_with_ref(&self, image_ref: ImageRef) -> Page {
        let page = Page::new(BookId::new(), image_ref, 1);
        self.documents.insert_page(&page).expect("insert page");
        page
    }

    pub fn stored_page(&self, id: &PageId) -> Option<Page> {
        self.documents.get_page(id).expect("get page")
    }

    pub fn stored(&self, id: &PageId) -> Page {
        self.stored_page(id).expect("page exists")
    }
}
