// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// leafcount-store — Persistence collaborators for Leafcount.
//
// The processing core only talks to the traits in `traits`. This crate also
// ships the local implementations the host binary uses: a SQLite document
// store for books and pages, and a filesystem image store keyed by SHA-256.

pub mod documents;
pub mod images;
pub mod integrity;
pub mod traits;

pub use documents::SqliteStore;
pub use images::FileImageStore;
pub use integrity::{check_content, content_ref, is_content_ref};
pub use traits::{DocumentStore, ImageStore};
