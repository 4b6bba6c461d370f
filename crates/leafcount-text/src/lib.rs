// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// leafcount-text — The pure text engines behind Leafcount.
//
// Provides OCR output cleanup (hyphen rejoining, page-number and running-header
// removal), Flesch readability scoring, and the sampling estimator that says how
// far a handful of photographed pages can be trusted to stand in for a whole
// book. Every function here is total and stateless.

pub mod normalize;
pub mod readability;
pub mod sampling;

pub use normalize::{count_words, normalize};
pub use readability::{analyze, count_syllables};
pub use sampling::{estimate_sampling, extrapolate};

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
