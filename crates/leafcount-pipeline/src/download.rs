// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image download — fetches the bytes behind a resolved image URL.

use tracing::debug;

use leafcount_core::error::{LeafcountError, Result};
use leafcount_store::ImageStore;

/// Downloads page images for the OCR request.
///
/// `http://` and `https://` URLs go over the shared HTTP client; anything
/// else is handed back to the image store that produced the URL.
#[derive(Debug, Clone, Default)]
pub struct ImageDownloader {
    http: reqwest::Client,
}

impl ImageDownloader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn download(&self, images: &dyn ImageStore, url: &str) -> Result<Vec<u8>> {
        if !is_http(url) {
            return images.fetch(url).await;
        }

        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_error)?;

        let bytes = response
            .bytes()
            .await
            .map_err(fetch_error)?;

        debug!(bytes = bytes.len(), "image downloaded");
        Ok(bytes.to_vec())
    }
}

// Signed storage URLs carry tokens in the query string.
fn fetch_error(e: reqwest::Error) -> LeafcountError {
    LeafcountError::ImageFetch(e.without_url().to_string())
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
