// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book aggregator — read-time statistics over all pages of a book.
//
// Nothing here is stored. Each call is a single linear pass over the pages
// handed in.

use leafcount_core::types::{
    AverageReadability, Book, BookOverview, BookSummary, Page, PageStatus, ReadabilityMetrics,
    ReadingLevel,
};
use leafcount_text::{estimate_sampling, extrapolate, round_to};

/// Counts shown in book listings.
pub fn overview(book: Book, pages: &[Page]) -> BookOverview {
    BookOverview {
        book,
        total_word_count: total_word_count(pages),
        page_count: pages.len(),
        processed_count: processed_count(pages),
    }
}

/// Full statistics for one book.
///
/// Sampling covers the word counts of `Done` pages. The whole-book estimate
/// needs both sampling statistics and a known, non-zero page total.
pub fn summarize(book: Book, pages: &[Page]) -> BookSummary {
    let done_counts: Vec<usize> = pages
        .iter()
        .filter(|page| page.status() == PageStatus::Done)
        .filter_map(|page| page.state.word_count())
        .collect();

    let sampling = estimate_sampling(&done_counts);
    let estimate = match (&sampling, book.total_pages) {
        (Some(stats), Some(total_pages)) if total_pages > 0 => {
            Some(extrapolate(stats, total_pages))
        }
        _ => None,
    };

    BookSummary {
        total_word_count: total_word_count(pages),
        page_count: pages.len(),
        processed_count: done_counts.len(),
        average_readability: average_readability(pages),
        sampling,
        estimate,
        book,
    }
}

/// Mean readability over the pages that have metrics.
///
/// The reading level is bucketed from the unrounded mean ease.
pub fn average_readability(pages: &[Page]) -> Option<AverageReadability> {
    let metrics: Vec<_> = pages
        .iter()
        .filter_map(|page| page.state.readability())
        .collect();
    if metrics.is_empty() {
        return None;
    }

    let count = metrics.len() as f64;
    let mean = |field: fn(&ReadabilityMetrics) -> f64| {
        metrics.iter().map(|m| field(m)).sum::<f64>() / count
    };

    let ease = mean(|m| m.flesch_reading_ease);
    Some(AverageReadability {
        flesch_reading_ease: round_to(ease, 1),
        flesch_kincaid_grade: round_to(mean(|m| m.flesch_kincaid_grade), 1),
        avg_words_per_sentence: round_to(mean(|m| m.avg_words_per_sentence), 1),
        avg_syllables_per_word: round_to(mean(|m| m.avg_syllables_per_word), 2),
        reading_level: ReadingLevel::from_score(ease),
        page_count: metrics.len(),
    })
}

fn total_word_count(pages: &[Page]) -> u64 {
    pages
        .iter()
        .filter_map(|page| page.state.word_count())
        .map(|count| count as u64)
        .sum()
}

fn processed_count(pages: &[Page]) -> usize {
    pages
        .iter()
        .filter(|page| page.status() == PageStatus::Done)
        .count()
}
