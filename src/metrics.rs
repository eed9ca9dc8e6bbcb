//! Answer evaluation metrics
//!
//! Scores a generated answer against a reference answer supplied with the
//! user's feedback. Tokens come from Unicode word segmentation, so Japanese
//! text is compared character by character while Latin text is compared by word.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// Smoothing numerator for n-gram orders with no match
const BLEU_EPSILON: f64 = 0.1;
const BLEU_MAX_ORDER: usize = 4;

/// Metrics stored alongside every rated answer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub bleu: f64,
    pub similarity: f64,
    pub word_count: usize,
    pub relevance: f64,
}

/// Lowercased word tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

/// Score `answer` against `reference`.
///
/// With an empty reference only the word count is meaningful; the other
/// scores are zero.
pub fn evaluate(answer: &str, reference: &str) -> Scores {
    let answer_tokens = tokenize(answer);
    let word_count = answer_tokens.len();

    if reference.trim().is_empty() {
        return Scores {
            word_count,
            ..Scores::default()
        };
    }

    let reference_tokens = tokenize(reference);
    Scores {
        bleu: bleu(&answer_tokens, &reference_tokens),
        similarity: tfidf_cosine(&answer_tokens, &reference_tokens),
        word_count,
        relevance: relevance(&answer_tokens, &reference_tokens),
    }
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

/// Sentence BLEU-4 with uniform weights, epsilon smoothing and brevity penalty
pub fn bleu(candidate: &[String], reference: &[String]) -> f64 {
    if candidate.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let weight = 1.0 / BLEU_MAX_ORDER as f64;
    let mut log_precision = 0.0;
    for n in 1..=BLEU_MAX_ORDER {
        let candidate_grams = ngram_counts(candidate, n);
        let reference_grams = ngram_counts(reference, n);

        let total: usize = candidate_grams.values().sum();
        let matched: usize = candidate_grams
            .iter()
            .map(|(gram, count)| (*count).min(reference_grams.get(gram).copied().unwrap_or(0)))
            .sum();

        // No unigram overlap at all: nothing to smooth
        if n == 1 && matched == 0 {
            return 0.0;
        }

        let denominator = total.max(1) as f64;
        let precision = if matched == 0 {
            BLEU_EPSILON / denominator
        } else {
            matched as f64 / denominator
        };
        log_precision += weight * precision.ln();
    }

    let c = candidate.len() as f64;
    let r = reference.len() as f64;
    let brevity_penalty = if c > r { 1.0 } else { (1.0 - r / c).exp() };

    brevity_penalty * log_precision.exp()
}

/// Cosine similarity of smooth-idf TF-IDF vectors built over the two texts
pub fn tfidf_cosine(a: &[String], b: &[String]) -> f64 {
    let tf_a = ngram_counts(a, 1);
    let tf_b = ngram_counts(b, 1);

    let vocabulary: HashSet<&[String]> = tf_a.keys().chain(tf_b.keys()).copied().collect();
    let documents = 2.0_f64;

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for term in vocabulary {
        let count_a = tf_a.get(term).copied().unwrap_or(0) as f64;
        let count_b = tf_b.get(term).copied().unwrap_or(0) as f64;
        let df = (count_a > 0.0) as u8 as f64 + (count_b > 0.0) as u8 as f64;
        let idf = ((1.0 + documents) / (1.0 + df)).ln() + 1.0;

        let weight_a = count_a * idf;
        let weight_b = count_b * idf;
        dot += weight_a * weight_b;
        norm_a += weight_a * weight_a;
        norm_b += weight_b * weight_b;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Share of distinct reference tokens that also appear in the answer
pub fn relevance(answer: &[String], reference: &[String]) -> f64 {
    let reference: HashSet<&String> = reference.iter().collect();
    if reference.is_empty() {
        return 0.0;
    }
    let answer: HashSet<&String> = answer.iter().collect();
    answer.intersection(&reference).count() as f64 / reference.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tokenize_mixed_scripts() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
        // Ideographs segment one per token
        assert_eq!(tokenize("東京"), vec!["東", "京"]);
    }

    #[test]
    fn test_identical_texts_score_perfectly() {
        let text = "The capital of Japan is Tokyo and it is large";
        let scores = evaluate(text, text);
        assert!(close(scores.bleu, 1.0));
        assert!(close(scores.similarity, 1.0));
        assert!(close(scores.relevance, 1.0));
        assert_eq!(scores.word_count, 10);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let scores = evaluate("apples and pears", "quantum chromodynamics");
        assert_eq!(scores.bleu, 0.0);
        assert_eq!(scores.similarity, 0.0);
        assert_eq!(scores.relevance, 0.0);
        assert_eq!(scores.word_count, 3);
    }

    #[test]
    fn test_empty_reference_only_counts_words() {
        let scores = evaluate("Tokyo is the capital", "   ");
        assert_eq!(
            scores,
            Scores {
                word_count: 4,
                ..Scores::default()
            }
        );
    }

    #[test]
    fn test_short_candidate_gets_brevity_penalty() {
        let reference = tokenize("the cat sat on the mat today");
        let candidate = tokenize("the cat sat on the mat");
        let score = bleu(&candidate, &reference);
        assert!(score > 0.0 && score < 1.0);
    }

    #[test]
    fn test_relevance_partial_overlap() {
        let answer = tokenize("tokyo is big");
        let reference = tokenize("tokyo is the capital");
        assert!(close(relevance(&answer, &reference), 0.5));
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let a = tokenize("mount fuji is the highest mountain");
        let b = tokenize("the highest mountain in japan");
        assert!(close(tfidf_cosine(&a, &b), tfidf_cosine(&b, &a)));
    }
}
