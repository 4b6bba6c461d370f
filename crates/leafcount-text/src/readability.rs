// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Readability analysis — Flesch Reading Ease and Flesch-Kincaid Grade.
//
// Sentence and word boundaries are found with simple punctuation and
// whitespace rules; syllables are estimated with a vowel-group heuristic.
// The scores are indicative, not linguistic ground truth.

use leafcount_core::types::{ReadabilityMetrics, ReadingLevel};

use crate::round_to;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

/// Compute readability metrics for `text`.
///
/// Never fails: empty or non-textual input yields zero counts and scores.
pub fn analyze(text: &str) -> ReadabilityMetrics {
    let sentences = split_sentences(text);
    let words = split_words(text);

    let sentence_count = sentences.len();
    let word_count = words.len();
    let syllable_count: usize = words.iter().map(|w| count_syllables(w)).sum();

    let avg_words_per_sentence = if sentence_count > 0 {
        word_count as f64 / sentence_count as f64
    } else {
        0.0
    };
    let avg_syllables_per_word = if word_count > 0 {
        syllable_count as f64 / word_count as f64
    } else {
        0.0
    };

    let (ease, grade) = if word_count > 0 && sentence_count > 0 {
        (
            flesch_reading_ease(avg_words_per_sentence, avg_syllables_per_word),
            flesch_kincaid_grade(avg_words_per_sentence, avg_syllables_per_word),
        )
    } else {
        (0.0, 0.0)
    };

    ReadabilityMetrics {
        sentence_count,
        word_count,
        syllable_count,
        avg_words_per_sentence: round_to(avg_words_per_sentence, 1),
        avg_syllables_per_word: round_to(avg_syllables_per_word, 2),
        flesch_reading_ease: round_to(ease, 1),
        flesch_kincaid_grade: round_to(grade, 1),
        // Bucketed before rounding, so 59.96 stays "Fairly Difficult".
        reading_level: ReadingLevel::from_score(ease),
    }
}

/// `206.835 − 1.015·ASL − 84.6·ASW`, clamped to `[0, 100]`.
pub fn flesch_reading_ease(avg_words_per_sentence: f64, avg_syllables_per_word: f64) -> f64 {
    (206.835 - 1.015 * avg_words_per_sentence - 84.6 * avg_syllables_per_word).clamp(0.0, 100.0)
}

/// `0.39·ASL + 11.8·ASW − 15.59`, floored at 0.
pub fn flesch_kincaid_grade(avg_words_per_sentence: f64, avg_syllables_per_word: f64) -> f64 {
    (0.39 * avg_words_per_sentence + 11.8 * avg_syllables_per_word - 15.59).max(0.0)
}

/// Split on runs of `.`, `!` or `?` that are followed by whitespace or the end
/// of the text.
///
/// Punctuation inside a token (`3.14`, `e.g.x`) does not end a sentence. If
/// nothing non-blank survives, the whole text counts as one sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((idx, c)) = iter.next() {
        if !is_terminator(c) {
            continue;
        }

        let mut run_end = idx + c.len_utf8();
        while let Some(&(i, next)) = iter.peek() {
            if !is_terminator(next) {
                break;
            }
            run_end = i + next.len_utf8();
            iter.next();
        }

        match iter.peek() {
            None => {
                sentences.push(&text[start..idx]);
                start = text.len();
            }
            Some(&(_, next)) if next.is_whitespace() => {
                sentences.push(&text[start..idx]);
                let mut after = run_end;
                while let Some(&(i, ws)) = iter.peek() {
                    if !ws.is_whitespace() {
                        break;
                    }
                    after = i + ws.len_utf8();
                    iter.next();
                }
                start = after;
            }
            Some(_) => {}
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    let sentences: Vec<&str> = sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        vec![text]
    } else {
        sentences
    }
}

/// Whitespace-separated tokens with everything except ASCII letters,
/// apostrophes and hyphens removed. Tokens left empty are dropped.
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| c.is_ascii_alphabetic() || *c == '\'' || *c == '-')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Estimate the syllables in a single word.
///
/// Counts groups of consecutive vowels (`y` included), discounts a silent
/// trailing `e` unless the word ends in `le`, and adds one for a trailing
/// `ia`/`io`. Words of up to three letters are one syllable; an empty word
/// (after stripping non-letters) is zero.
pub fn count_syllables(word: &str) -> usize {
    let word: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect();

    if word.is_empty() {
        return 0;
    }
    if word.len() <= 3 {
        return 1;
    }

    let mut groups = 0usize;
    let mut in_group = false;
    for c in word.chars() {
        let vowel = VOWELS.contains(&c);
        if vowel && !in_group {
            groups += 1;
        }
        in_group = vowel;
    }

    let mut count = groups.max(1);
    if word.ends_with('e') && !word.ends_with("le") {
        count = count.saturating_sub(1).max(1);
    }
    if word.ends_with("ia") || word.ends_with("io") {
        count += 1;
    }

    count.max(1)
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_heuristic() {
        assert_eq!(count_syllables("cat"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("like"), 1);
        assert_eq!(count_syllables("radio"), 3);
        assert_eq!(count_syllables("Rhythm"), 1);
        assert_eq!(count_syllables("beautiful"), 3);
    }

    #[test]
    fn syllables_of_non_letters() {
        assert_eq!(count_syllables(""), 0);
        assert_eq!(count_syllables("'-'"), 0);
        assert_eq!(count_syllables("a1b2"), 1);
    }

    #[test]
    fn splits_on_terminal_punctuation() {
        let sentences = split_sentences("One two. Three four!  Five?");
        assert_eq!(sentences, vec!["One two", "Three four", "Five"]);
    }

    #[test]
    fn inner_punctuation_does_not_split() {
        assert_eq!(split_sentences("Pi is 3.14 or so"), vec!["Pi is 3.14 or so"]);
        assert_eq!(split_sentences("Wait... what?!"), vec!["Wait", "what"]);
    }

    #[test]
    fn blank_text_is_one_sentence() {
        assert_eq!(split_sentences(""), vec![""]);
        assert_eq!(split_sentences("?! ..."), vec!["?! ..."]);
    }

    #[test]
    fn words_keep_apostrophes_and_hyphens() {
        let words = split_words("Don't stop—the well-funded 42 \"team\" ...");
        assert_eq!(words, vec!["Don't", "stopthe", "well-funded", "team"]);
    }

    #[test]
    fn flesch_formulas() {
        let ease = flesch_reading_ease(20.0, 1.5);
        assert!((ease - 59.635).abs() < 1e-9);
        assert_eq!(round_to(ease, 1), 59.6);
        assert_eq!(ReadingLevel::from_score(ease), ReadingLevel::FairlyDifficult);
        assert_eq!(ReadingLevel::from_score(60.0), ReadingLevel::Standard);

        assert!((flesch_kincaid_grade(20.0, 1.5) - 9.91).abs() < 1e-9);
        assert_eq!(flesch_reading_ease(1.0, 0.5), 100.0);
        assert_eq!(flesch_reading_ease(40.0, 3.0), 0.0);
        assert_eq!(flesch_kincaid_grade(1.0, 1.0), 0.0);
    }

    #[test]
    fn analyzes_simple_prose() {
        let metrics = analyze("The cat sat on the mat. The dog ran.");
        assert_eq!(metrics.sentence_count, 2);
        assert_eq!(metrics.word_count, 9);
        assert_eq!(metrics.syllable_count, 9);
        assert_eq!(metrics.avg_words_per_sentence, 4.5);
        assert_eq!(metrics.avg_syllables_per_word, 1.0);
        // 206.835 - 1.015 * 4.5 - 84.6 is above 100 -> clamped
        assert_eq!(metrics.flesch_reading_ease, 100.0);
        assert_eq!(metrics.reading_level, ReadingLevel::VeryEasy);
        // 0.39 * 4.5 + 11.8 - 15.59 = -2.035 -> floored
        assert_eq!(metrics.flesch_kincaid_grade, 0.0);
    }

    #[test]
    fn empty_text_scores_zero() {
        let metrics = analyze("");
        assert_eq!(metrics.sentence_count, 1);
        assert_eq!(metrics.word_count, 0);
        assert_eq!(metrics.flesch_reading_ease, 0.0);
        assert_eq!(metrics.flesch_kincaid_grade, 0.0);
        assert_eq!(metrics.avg_syllables_per_word, 0.0);
        assert_eq!(metrics.reading_level, ReadingLevel::VeryDifficult);
    }

    #[test]
    fn rounding_precision() {
        // el-e-phants wan-der gi-raf-fes graze slow-ly lions sleep
        let metrics = analyze("Elephants wander. Giraffes graze slowly. Lions sleep.");
        assert_eq!(metrics.sentence_count, 3);
        assert_eq!(metrics.word_count, 7);
        assert_eq!(metrics.syllable_count, 13);
        assert_eq!(metrics.avg_words_per_sentence, 2.3);
        assert_eq!(metrics.avg_syllables_per_word, 1.86);
    }
}
