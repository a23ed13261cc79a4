//! Count-vector cosine similarity over skill-name bags.
//!
//! Tokens are lowercased runs of two or more word characters, so single-letter
//! names such as "R" never contribute.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"))
}

pub fn term_counts(text: &str) -> HashMap<String, f64> {
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for token in token_regex().find_iter(&lowered) {
        *counts.entry(token.as_str().to_string()).or_insert(0.0) += 1.0;
    }
    counts
}

/// Cosine similarity of two count vectors; 0 when either is all zeros.
pub fn cosine(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm_a = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Similarity × 100 of the resume bag against each job bag, in job order.
pub fn lexical_scores(resume_text: &str, job_texts: &[String]) -> Vec<f64> {
    let resume = term_counts(resume_text);
    job_texts
        .iter()
        .map(|job| (cosine(&resume, &term_counts(job)) * 100.0).clamp(0.0, 100.0))
        .collect()
}
