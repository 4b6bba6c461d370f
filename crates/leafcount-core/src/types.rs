// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Leafcount.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a photographed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Unique identifier for a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(pub Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Opaque handle to a stored page image.
///
/// The local image store uses the SHA-256 hex digest of the image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle states of a page.
///
/// `Pending -> Processing -> {Done | Error}`; `Done` and `Error` may be sent
/// back to `Processing` by an explicit re-process request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Uploaded, processing not yet started.
    Pending,
    /// OCR and analysis in flight.
    Processing,
    /// Text extracted and analysed.
    Done,
    /// Processing failed; the page carries the error message.
    Error,
}

impl PageStatus {
    /// Storage keyword for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "done" => Ok(Self::Done),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown page status: {other}")),
        }
    }
}

/// A corner of a bounding polygon, in image pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: i64,
    pub y: i64,
}

/// A word or phrase detected by OCR and where it sits on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub text: String,
    /// Quadrilateral, clockwise from top-left as reported by the provider.
    pub vertices: Vec<Vertex>,
}

/// Human-readable bucket for a Flesch Reading Ease score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingLevel {
    #[serde(rename = "Very Easy (5th grade)")]
    VeryEasy,
    #[serde(rename = "Easy (6th grade)")]
    Easy,
    #[serde(rename = "Fairly Easy (7th grade)")]
    FairlyEasy,
    #[serde(rename = "Standard (8th-9th grade)")]
    Standard,
    #[serde(rename = "Fairly Difficult (10th-12th grade)")]
    FairlyDifficult,
    #[serde(rename = "Difficult (College)")]
    Difficult,
    #[serde(rename = "Very Difficult (College graduate)")]
    VeryDifficult,
}

impl ReadingLevel {
    /// Bucket a Flesch Reading Ease score. Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::VeryEasy
        } else if score >= 80.0 {
            Self::Easy
        } else if score >= 70.0 {
            Self::FairlyEasy
        } else if score >= 60.0 {
            Self::Standard
        } else if score >= 50.0 {
            Self::FairlyDifficult
        } else if score >= 30.0 {
            Self::Difficult
        } else {
            Self::VeryDifficult
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryEasy => "Very Easy (5th grade)",
            Self::Easy => "Easy (6th grade)",
            Self::FairlyEasy => "Fairly Easy (7th grade)",
            Self::Standard => "Standard (8th-9th grade)",
            Self::FairlyDifficult => "Fairly Difficult (10th-12th grade)",
            Self::Difficult => "Difficult (College)",
            Self::VeryDifficult => "Very Difficult (College graduate)",
        }
    }
}

impl std::fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Readability statistics for a text sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub sentence_count: usize,
    pub word_count: usize,
    pub syllable_count: usize,
    /// Rounded to 1 decimal place.
    pub avg_words_per_sentence: f64,
    /// Rounded to 2 decimal places.
    pub avg_syllables_per_word: f64,
    /// 0–100, higher is easier. Rounded to 1 decimal place.
    pub flesch_reading_ease: f64,
    /// US school grade. Rounded to 1 decimal place.
    pub flesch_kincaid_grade: f64,
    pub reading_level: ReadingLevel,
}

/// Everything a successful OCR pass produces for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    /// Normalized OCR text.
    pub extracted_text: String,
    /// Whitespace-delimited tokens in `extracted_text`.
    pub word_count: usize,
    /// Absent when the provider returned no annotations at all.
    pub bounding_boxes: Option<Vec<BoundingBox>>,
    /// Absent when the extracted text is empty.
    pub readability: Option<ReadabilityMetrics>,
}

impl PageResult {
    /// Outcome of an OCR call that found no text on the page.
    pub fn empty() -> Self {
        Self {
            extracted_text: String::new(),
            word_count: 0,
            bounding_boxes: None,
            readability: None,
        }
    }
}

/// Processing state of a page together with the data that state owns.
///
/// Each transition builds a whole new variant, so a page can never carry
/// results from an earlier attempt that disagree with its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageState {
    Pending,
    Processing,
    Done(PageResult),
    Error { message: String },
}

impl PageState {
    pub fn status(&self) -> PageStatus {
        match self {
            Self::Pending => PageStatus::Pending,
            Self::Processing => PageStatus::Processing,
            Self::Done(_) => PageStatus::Done,
            Self::Error { .. } => PageStatus::Error,
        }
    }

    pub fn result(&self) -> Option<&PageResult> {
        match self {
            Self::Done(result) => Some(result),
            _ => None,
        }
    }

    pub fn word_count(&self) -> Option<usize> {
        self.result().map(|r| r.word_count)
    }

    pub fn readability(&self) -> Option<&ReadabilityMetrics> {
        self.result().and_then(|r| r.readability.as_ref())
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// One photographed page of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub book_id: BookId,
    /// Positive, unique within a book (last write wins on conflict).
    pub page_number: u32,
    pub image_ref: ImageRef,
    #[serde(flatten)]
    pub state: PageState,
    pub created_at: DateTime<Utc>,
}

impl Page {
    pub fn new(book_id: BookId, image_ref: ImageRef, page_number: u32) -> Self {
        Self {
            id: PageId::new(),
            book_id,
            page_number,
            image_ref,
            state: PageState::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn status(&self) -> PageStatus {
        self.state.status()
    }
}

/// Link from a book to the reading-tracker account it was imported from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub external_id: String,
    pub external_user_id: String,
}

/// A book: the aggregate root that owns its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: Option<String>,
    /// Page count of the physical book, when known. Enables whole-book
    /// word-count estimates.
    pub total_pages: Option<u32>,
    pub external: Option<ExternalLink>,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            author: None,
            total_pages: None,
            external: None,
            created_at: Utc::now(),
        }
    }
}

/// A book as offered by an external reading-tracker account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBook {
    pub external_id: String,
    pub external_user_id: String,
    pub title: String,
    pub author: Option<String>,
    pub total_pages: Option<u32>,
}

/// Qualitative confidence in a page sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// How far a sample of per-page word counts can be trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingStats {
    pub sample_size: usize,
    /// Mean words per page, 1 decimal place.
    pub mean: f64,
    /// Sample standard deviation, 1 decimal place.
    pub std_dev: f64,
    /// Coefficient of variation as a percentage, 1 decimal place.
    pub cv: f64,
    /// Pages needed for a ±10% margin at 95% confidence (at least 2).
    pub recommended_sample_size: u64,
    pub additional_pages_needed: u64,
    pub confidence_level: ConfidenceLevel,
    /// Current 95% margin as a percentage of the mean, 1 decimal place.
    pub current_margin_percent: f64,
    pub ci_lower_per_page: u64,
    pub ci_upper_per_page: u64,
}

/// Book-level readability averaged over the pages that have metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageReadability {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub avg_words_per_sentence: f64,
    pub avg_syllables_per_word: f64,
    pub reading_level: ReadingLevel,
    /// Number of pages the averages were taken over.
    pub page_count: usize,
}

/// Whole-book word count extrapolated from the page sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEstimate {
    pub total_pages: u32,
    pub estimated_total: u64,
    pub ci_lower_total: u64,
    pub ci_upper_total: u64,
    /// Sampled pages as a share of the recommended sample, capped at 100.
    pub sample_progress_percent: f64,
}

/// A book with the page counts shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookOverview {
    #[serde(flatten)]
    pub book: Book,
    /// Sum of the word counts of processed pages.
    pub total_word_count: u64,
    pub page_count: usize,
    /// Pages in the `Done` state.
    pub processed_count: usize,
}

/// Derived, read-time view of a book and its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: Book,
    pub total_word_count: u64,
    pub page_count: usize,
    pub processed_count: usize,
    pub average_readability: Option<AverageReadability>,
    pub sampling: Option<SamplingStats>,
    pub estimate: Option<BookEstimate>,
}
