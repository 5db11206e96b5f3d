//! Weighted multi-criterion scoring for worked arithmetic answers.
//!
//! A response is graded on three criteria: whether the expected figures
//! appear in it, whether it is phrased as a price answer, and whether it
//! shows its working. Each criterion yields a sub-score in `[0, 1]`; the
//! final score is their weighted sum.

use prompt_lab_core::ResponseScorer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

pub const NUMERIC_WEIGHT: f64 = 0.6;
pub const FORMAT_WEIGHT: f64 = 0.2;
pub const EXPLANATION_WEIGHT: f64 = 0.2;

/// Every expected number is present.
pub const FULL_MATCH_SCORE: f64 = 1.0;
/// At least half (rounded down) of the expected numbers are present.
pub const MAJORITY_MATCH_SCORE: f64 = 0.7;
/// Some, but fewer than half, of the expected numbers are present.
pub const PARTIAL_MATCH_SCORE: f64 = 0.4;
pub const NO_MATCH_SCORE: f64 = 0.0;

pub const CURRENCY_MARKER_SCORE: f64 = 0.3;
pub const DOMAIN_TERM_SCORE: f64 = 0.4;
pub const AMOUNT_PATTERN_SCORE: f64 = 0.3;

pub const STEP_INDICATOR_SCORE: f64 = 0.4;
pub const REASONING_TERM_SCORE: f64 = 0.3;
pub const STRUCTURE_SCORE: f64 = 0.3;
/// A response needs more than this many line breaks to count as structured.
pub const MIN_STRUCTURED_LINE_BREAKS: usize = 3;

pub const CURRENCY_MARKERS: [&str; 2] = ["tl", "lira"];
pub const DOMAIN_TERMS: [&str; 6] = ["fiyat", "bilet", "elma", "portakal", "kahve", "çay"];
pub const STEP_INDICATORS: [&str; 4] = ["adım", "önce", "sonra", "denklem"];
pub const REASONING_TERMS: [&str; 5] = ["bilinmeyen", "değişken", "çöz", "hesap", "toplam"];

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\b").expect("integer pattern is valid"));
static DECIMAL_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d$").expect("digit pattern is valid"));
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*tl").expect("amount pattern is valid"));

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    pub numeric: f64,
    pub format: f64,
    pub explanation: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            numeric: NUMERIC_WEIGHT,
            format: FORMAT_WEIGHT,
            explanation: EXPLANATION_WEIGHT,
        }
    }
}

/// Per-criterion sub-scores and their weighted total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub numeric: f64,
    pub format: f64,
    pub explanation: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MathReasoningScorer {
    pub weights: ScoringWeights,
}

impl MathReasoningScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn breakdown(&self, expected: &str, actual: &str) -> ScoreBreakdown {
        let expected_numbers = extract_numbers(expected);
        let actual_numbers = extract_numbers(actual);

        let numeric = numeric_accuracy(&expected_numbers, &actual_numbers);
        let format = format_correctness(actual);
        let explanation = explanation_quality(actual);

        let total = (numeric * self.weights.numeric
            + format * self.weights.format
            + explanation * self.weights.explanation)
            .clamp(0.0, 1.0);

        tracing::debug!(
            expected_numbers = ?expected_numbers,
            actual_numbers = ?actual_numbers,
            numeric = format_args!("{numeric:.2}"),
            format = format_args!("{format:.2}"),
            explanation = format_args!("{explanation:.2}"),
            total = format_args!("{total:.2}"),
            "Scoring breakdown"
        );

        ScoreBreakdown {
            numeric,
            format,
            explanation,
            total,
        }
    }
}

impl ResponseScorer for MathReasoningScorer {
    fn score(&self, expected: &str, actual: &str) -> f64 {
        self.breakdown(expected, actual).total
    }
}

/// Distinct integers appearing as whole words in `text`, in canonical form.
///
/// Any Unicode decimal digit counts, integers have no size limit, and
/// leading zeros are dropped: "06", "6" and "٦" are all `"6"`.
pub fn extract_numbers(text: &str) -> HashSet<String> {
    INTEGER
        .find_iter(text)
        .map(|m| canonical_integer(m.as_str()))
        .collect()
}

/// ASCII digits of `digits` with leading zeros removed ("0" stays "0").
fn canonical_integer(digits: &str) -> String {
    let ascii: String = digits
        .chars()
        .filter_map(decimal_digit_value)
        .filter_map(|d| char::from_digit(d, 10))
        .collect();
    let trimmed = ascii.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT.is_match(c.encode_utf8(&mut buf))
}

/// Value of a Unicode `Nd` character.
///
/// Decimal digits are always encoded as contiguous runs of zero through
/// nine, so the value is the offset from the start of the run, modulo 10.
fn decimal_digit_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

pub fn numeric_accuracy(expected: &HashSet<String>, actual: &HashSet<String>) -> f64 {
    if expected.is_empty() {
        return NO_MATCH_SCORE;
    }

    if expected.is_subset(actual) {
        return FULL_MATCH_SCORE;
    }

    let common = expected.intersection(actual).count();
    if common >= expected.len() / 2 {
        MAJORITY_MATCH_SCORE
    } else if common > 0 {
        PARTIAL_MATCH_SCORE
    } else {
        NO_MATCH_SCORE
    }
}

pub fn format_correctness(response: &str) -> f64 {
    let lower = response.to_lowercase();
    let mut score = 0.0;

    if CURRENCY_MARKERS.iter().any(|m| lower.contains(m)) {
        score += CURRENCY_MARKER_SCORE;
    }
    if DOMAIN_TERMS.iter().any(|t| lower.contains(t)) {
        score += DOMAIN_TERM_SCORE;
    }
    if AMOUNT.is_match(&lower) {
        score += AMOUNT_PATTERN_SCORE;
    }

    f64::min(score, 1.0)
}

pub fn explanation_quality(response: &str) -> f64 {
    let lower = response.to_lowercase();
    let mut score = 0.0;

    if STEP_INDICATORS.iter().any(|w| lower.contains(w)) {
        score += STEP_INDICATOR_SCORE;
    }
    if REASONING_TERMS.iter().any(|t| lower.contains(t)) {
        score += REASONING_TERM_SCORE;
    }
    if response.matches('\n').count() > MIN_STRUCTURED_LINE_BREAKS {
        score += STRUCTURE_SCORE;
    }

    f64::min(score, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_numeric_tiers() {
        let expected = set(&["6", "4", "12", "2"]);
        assert_eq!(numeric_accuracy(&expected, &set(&["2", "4", "6", "12", "99"])), FULL_MATCH_SCORE);
        assert_eq!(numeric_accuracy(&expected, &set(&["6", "4"])), MAJORITY_MATCH_SCORE);
        assert_eq!(numeric_accuracy(&expected, &set(&["6"])), PARTIAL_MATCH_SCORE);
        assert_eq!(numeric_accuracy(&expected, &set(&["7"])), NO_MATCH_SCORE);
    }

    #[test]
    fn test_single_expected_number_floor_half_is_zero() {
        // floor(1 / 2) == 0, so even a miss clears the majority tier
        assert_eq!(numeric_accuracy(&set(&["5"]), &set(&["3"])), MAJORITY_MATCH_SCORE);
    }

    #[test]
    fn test_extract_numbers_collapses_duplicates() {
        assert_eq!(extract_numbers("6 TL, 6 TL ve 4 TL"), set(&["6", "4"]));
        assert!(extract_numbers("sayı yok").is_empty());
    }

    #[test]
    fn test_digits_inside_words_are_not_numbers() {
        assert!(extract_numbers("x2y").is_empty());
        assert_eq!(extract_numbers("5s = 75"), set(&["75"]));
    }

    #[test]
    fn test_leading_zeros_are_dropped() {
        assert_eq!(extract_numbers("06 ve 6 ve 000"), set(&["6", "0"]));
    }

    #[test]
    fn test_non_ascii_digits_are_normalized() {
        // Arabic-Indic, Devanagari and fullwidth digits
        assert_eq!(extract_numbers("١٢ TL"), set(&["12"]));
        assert_eq!(extract_numbers("४२"), set(&["42"]));
        assert_eq!(extract_numbers("７"), set(&["7"]));
    }

    #[test]
    fn test_integers_have_no_size_limit() {
        assert_eq!(
            extract_numbers("123456789012345678901234"),
            set(&["123456789012345678901234"])
        );
    }
}
