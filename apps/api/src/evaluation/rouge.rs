//! ROUGE-1, ROUGE-2 and ROUGE-L over stemmed, lowercased word tokens.
//!
//! Tokenization: lowercase, split on every run outside `[a-z0-9]`, stem
//! tokens longer than three characters. Empty inputs score zero.

use std::collections::HashMap;

use rust_stemmers::Stemmer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl RougeScore {
    pub const ZERO: RougeScore = RougeScore {
        precision: 0.0,
        recall: 0.0,
        f1: 0.0,
    };

    fn from_counts(overlap: usize, candidate_total: usize, reference_total: usize) -> Self {
        let precision = ratio(overlap, candidate_total);
        let recall = ratio(overlap, reference_total);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RougeScores {
    pub rouge1: RougeScore,
    pub rouge2: RougeScore,
    #[serde(rename = "rougeL")]
    pub rouge_l: RougeScore,
}

pub fn score(stemmer: &Stemmer, reference: &str, candidate: &str) -> RougeScores {
    let reference = tokenize(stemmer, reference);
    let candidate = tokenize(stemmer, candidate);

    RougeScores {
        rouge1: rouge_n(&reference, &candidate, 1),
        rouge2: rouge_n(&reference, &candidate, 2),
        rouge_l: rouge_l(&reference, &candidate),
    }
}

pub fn tokenize(stemmer: &Stemmer, text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| !t.is_empty())
        .map(|t| {
            if t.len() > 3 {
                stemmer.stem(t).into_owned()
            } else {
                t.to_string()
            }
        })
        .collect()
}

fn rouge_n(reference: &[String], candidate: &[String], n: usize) -> RougeScore {
    let reference_counts = ngram_counts(reference, n);
    let candidate_counts = ngram_counts(candidate, n);

    let overlap: usize = candidate_counts
        .iter()
        .map(|(gram, &count)| count.min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();

    RougeScore::from_counts(
        overlap,
        candidate_counts.values().sum(),
        reference_counts.values().sum(),
    )
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for gram in tokens.windows(n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

fn rouge_l(reference: &[String], candidate: &[String]) -> RougeScore {
    if reference.is_empty() || candidate.is_empty() {
        return RougeScore::ZERO;
    }
    RougeScore::from_counts(
        lcs_len(reference, candidate),
        candidate.len(),
        reference.len(),
    )
}

/// Longest common subsequence length, two-row dynamic programming.
fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
