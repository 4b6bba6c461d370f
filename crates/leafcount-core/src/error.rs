// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Leafcount.
//
// The Display text of the processing variants is stored verbatim as the
// `error_message` of a page that lands in the `Error` state.

use thiserror::Error;

use crate::types::{BookId, PageId};

/// Top-level error type for all Leafcount operations.
#[derive(Debug, Error)]
pub enum LeafcountError {
    // -- Lookup errors --
    #[error("Page not found: {0}")]
    PageNotFound(PageId),

    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    #[error("page numbers start at 1, got {0}")]
    InvalidPageNumber(u32),

    // -- Processing errors (captured onto the page) --
    #[error("Image not found in storage")]
    ImageNotFound,

    #[error("Image download failed: {0}")]
    ImageFetch(String),

    #[error("{0} not configured")]
    MissingCredential(String),

    #[error("Vision API error: {status} - {body}")]
    Provider { status: u16, body: String },

    // -- Image store --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl LeafcountError {
    /// Whether this error aborts a processing attempt instead of being
    /// recorded on the page.
    ///
    /// A missing page has nothing to record onto, and a failing document
    /// store cannot accept the error record either.
    pub fn is_page_fatal(&self) -> bool {
        matches!(
            self,
            Self::PageNotFound(_)
                | Self::BookNotFound(_)
                | Self::Database(_)
                | Self::Serialization(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeafcountError>;
