// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sampling estimator for whole-book word counts.
//
// Readers photograph a handful of pages, not the whole book. Treating those
// pages as a simple random sample, the estimator reports the mean words per
// page, a 95% confidence interval around it, and how many pages would be
// needed to pin the mean down to ±10%:
//
//   n_required = ceil((z · CV / margin)²),   z = 1.96, margin = 0.10
//
// All statistics are recomputed from the current page data on every read.

use leafcount_core::types::{BookEstimate, ConfidenceLevel, SamplingStats};

use crate::round_to;

/// Target relative margin of error (±10%).
pub const TARGET_MARGIN: f64 = 0.10;

/// Two-sided z-score for 95% confidence.
pub const Z_95: f64 = 1.96;

/// Smallest sample for which a standard deviation exists.
pub const MIN_SAMPLE: usize = 2;

/// Compute sampling statistics over per-page word counts.
///
/// Returns `None` for fewer than two pages: the sample standard deviation is
/// undefined there and the statistics are omitted rather than zeroed.
pub fn estimate_sampling(word_counts: &[usize]) -> Option<SamplingStats> {
    let n = word_counts.len();
    if n < MIN_SAMPLE {
        return None;
    }
    let n_f = n as f64;

    let mean = word_counts.iter().map(|&x| x as f64).sum::<f64>() / n_f;
    let variance = word_counts
        .iter()
        .map(|&x| (x as f64 - mean).powi(2))
        .sum::<f64>()
        / (n_f - 1.0);
    let std_dev = variance.sqrt();

    let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

    let required = recommended_sample_size(cv);

    let standard_error = std_dev / n_f.sqrt();
    let margin_of_error = Z_95 * standard_error;
    let ci_lower = (mean - margin_of_error).max(0.0);
    let ci_upper = mean + margin_of_error;

    let current_margin_percent = if mean > 0.0 {
        margin_of_error / mean * 100.0
    } else {
        0.0
    };

    Some(SamplingStats {
        sample_size: n,
        mean: round_to(mean, 1),
        std_dev: round_to(std_dev, 1),
        cv: round_to(cv * 100.0, 1),
        recommended_sample_size: required,
        additional_pages_needed: required.saturating_sub(n as u64),
        confidence_level: confidence_level(n, required),
        current_margin_percent: round_to(current_margin_percent, 1),
        ci_lower_per_page: ci_lower.round() as u64,
        ci_upper_per_page: ci_upper.round() as u64,
    })
}

/// Pages needed for a ±10% margin at 95% confidence, never fewer than two.
pub fn recommended_sample_size(cv: f64) -> u64 {
    let raw = ((Z_95 * cv) / TARGET_MARGIN).powi(2).ceil();
    (raw as u64).max(MIN_SAMPLE as u64)
}

/// Bucket a sample size against the recommended one.
pub fn confidence_level(sample_size: usize, recommended: u64) -> ConfidenceLevel {
    let n = sample_size as f64;
    let recommended = recommended as f64;
    if n >= recommended {
        ConfidenceLevel::High
    } else if n >= 0.5 * recommended {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

/// Scale per-page statistics up to a book of `total_pages` pages.
pub fn extrapolate(stats: &SamplingStats, total_pages: u32) -> BookEstimate {
    let pages = f64::from(total_pages);
    let progress = if stats.recommended_sample_size > 0 {
        stats.sample_size as f64 / stats.recommended_sample_size as f64 * 100.0
    } else {
        100.0
    };

    BookEstimate {
        total_pages,
        estimated_total: (stats.mean * pages).round() as u64,
        ci_lower_total: (stats.ci_lower_per_page as f64 * pages).round() as u64,
        ci_upper_total: (stats.ci_upper_per_page as f64 * pages).round() as u64,
        sample_progress_percent: round_to(progress.min(100.0), 1),
    }
}
