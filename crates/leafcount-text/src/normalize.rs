// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR text normalizer.
//
// Document OCR splits words across lines and picks up page furniture (page
// numbers, running headers) as if it were body text. Both inflate word counts.
// The pass below applies a fixed sequence of rules, each an independent
// predicate or rewrite:
//
//   1. rejoin `-\n<non-space>` hyphenation splits
//   2. split into lines
//   3. drop lines that are only digits
//   4. drop short all-caps lines
//   5. join the survivors with `\n`, order preserved
//
// Nothing else is touched: case, punctuation and inner whitespace survive.

use tracing::trace;

/// Lines at or above this many characters are never treated as headers.
pub const HEADER_MAX_CHARS: usize = 30;

/// Run the full normalization pipeline over raw OCR output.
pub fn normalize(raw: &str) -> String {
    let joined = rejoin_hyphenated(raw);

    let mut dropped = 0usize;
    let kept: Vec<&str> = joined
        .split('\n')
        .filter(|line| {
            let keep = !is_page_number(line) && !is_running_header(line);
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();

    trace!(dropped, kept = kept.len(), "normalized OCR text");
    kept.join("\n")
}

/// Collapse a line break that splits a hyphenated word.
///
/// `"well-\nfunded"` becomes `"well-funded"`. The break is removed only when a
/// single `-` sits directly before it and a non-whitespace character directly
/// after it. The character after the break is consumed together with the
/// break, so `"a-\n-\nb"` yields `"a--\nb"`.
pub fn rejoin_hyphenated(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        out.push(c);
        if c != '-' {
            continue;
        }

        let mut lookahead = chars.clone();
        if lookahead.next() != Some('\n') {
            continue;
        }
        match lookahead.next() {
            Some(next) if !next.is_whitespace() => {
                chars.next(); // the line break
                chars.next(); // `next`
                out.push(next);
            }
            _ => {}
        }
    }

    out
}

/// A line holding nothing but a page number.
pub fn is_page_number(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit())
}

/// A short, all-caps line such as a running header (`"300 VIRAL BA"`).
///
/// The line must contain at least one upper-case letter, so digit- or
/// punctuation-only lines are left alone here.
pub fn is_running_header(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() < HEADER_MAX_CHARS
        && trimmed.to_uppercase() == trimmed
        && trimmed.chars().any(char::is_uppercase)
}

/// Number of whitespace-delimited tokens in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
