// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// leafcount-pipeline — Page processing and book statistics for Leafcount.
//
// The orchestrator takes a page from upload to extracted, analysed text via
// an OCR provider; the aggregator turns a book's pages into word-count and
// readability statistics; the library ties both to the stores. Every
// collaborator is injected by the host, which owns their lifetimes.

pub mod aggregator;
pub mod credentials;
pub mod download;
pub mod library;
pub mod orchestrator;
pub mod vision;

#[cfg(test)]
mod testing;

pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use library::{Library, PageListing, ProcessingTask};
pub use orchestrator::Orchestrator;
pub use vision::{Annotation, OcrProvider, VisionClient, build_http_client};
