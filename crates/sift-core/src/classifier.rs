//! Statistical text classifier
//!
//! The last stage of the waterfall: a multinomial classifier over the short,
//! structured payment strings banks emit. Tokens map to numeric ids in an
//! unbounded vocabulary; each category keeps a token-frequency table and a
//! document count. Scoring uses additive (Laplace) smoothing so a token the
//! category has never seen does not zero the whole product, and runs in log
//! space so long descriptions cannot underflow.
//!
//! Training is incremental; `retrain` rebuilds from scratch. The engine is
//! responsible for publishing a retrained model atomically.

use std::collections::HashMap;

use tracing::debug;

use crate::models::TrainingSample;

/// Winning category and normalized confidence
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category_id: String,
    /// Winner's share of the total score mass, in [0, 1]
    pub confidence: f64,
}

/// Tokenize classifier input: lowercase, split on non-alphanumeric, drop
/// tokens shorter than 2 chars.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_string())
        .collect()
}

/// Vocabulary-based multinomial classifier with Laplace smoothing
#[derive(Debug, Clone, Default)]
pub struct TextClassifier {
    /// Token → numeric id; grows without bound as training data arrives
    vocabulary: HashMap<String, u32>,
    /// Category → (token id → occurrence count)
    token_counts: HashMap<String, HashMap<u32, u32>>,
    /// Category → total token occurrences, kept alongside the table so
    /// scoring does not re-sum it per call
    token_totals: HashMap<String, u64>,
    /// Category → documents trained
    doc_counts: HashMap<String, u64>,
    total_docs: u64,
}

impl TextClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any document has been trained
    pub fn is_trained(&self) -> bool {
        self.total_docs > 0
    }

    /// Categories with at least one trained document
    pub fn class_count(&self) -> usize {
        self.doc_counts.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Incrementally train on categorized samples. Zero samples is a no-op;
    /// a sample whose text yields no tokens is skipped.
    pub fn train(&mut self, samples: &[TrainingSample]) {
        for sample in samples {
            let tokens = tokenize(&sample.text);
            if tokens.is_empty() {
                continue;
            }

            let table = self
                .token_counts
                .entry(sample.category_id.clone())
                .or_default();
            let total = self.token_totals.entry(sample.category_id.clone()).or_insert(0);

            for token in tokens {
                let next_id = self.vocabulary.len() as u32;
                let id = *self.vocabulary.entry(token).or_insert(next_id);
                *table.entry(id).or_insert(0) += 1;
                *total += 1;
            }

            *self.doc_counts.entry(sample.category_id.clone()).or_insert(0) += 1;
            self.total_docs += 1;
        }

        debug!(
            "Classifier trained: {} docs, {} classes, {} tokens",
            self.total_docs,
            self.class_count(),
            self.vocabulary_size()
        );
    }

    /// Full rebuild: clears vocabulary and all counts, then trains.
    pub fn retrain(&mut self, samples: &[TrainingSample]) {
        *self = Self::default();
        self.train(samples);
    }

    /// Score the text against every known category.
    ///
    /// Returns `None` when the model is untrained, the text is blank, or no
    /// input token was seen during training. An indecisive answer is never
    /// an error.
    pub fn classify(&self, text: &str) -> Option<Classification> {
        if !self.is_trained() {
            return None;
        }

        // Only vocabulary tokens contribute; unknown tokens carry no signal
        let token_ids: Vec<u32> = tokenize(text)
            .iter()
            .filter_map(|t| self.vocabulary.get(t).copied())
            .collect();
        if token_ids.is_empty() {
            return None;
        }

        let vocab_size = self.vocabulary.len() as f64;
        let mut scores: Vec<(&str, f64)> = Vec::with_capacity(self.doc_counts.len());

        for (category, docs) in &self.doc_counts {
            let table = &self.token_counts[category];
            let total = self.token_totals[category] as f64;
            let prior = *docs as f64 / self.total_docs as f64;

            let mut log_score = prior.ln();
            for id in &token_ids {
                let count = table.get(id).copied().unwrap_or(0) as f64;
                // Laplace smoothing over the vocabulary
                log_score += ((count + 1.0) / (total + vocab_size)).ln();
            }
            scores.push((category.as_str(), log_score));
        }

        // Normalize the winner's score against the total mass. Shift by the
        // max first so the exponentials stay in range.
        let max_log = scores
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::NEG_INFINITY, f64::max);
        let mass: f64 = scores.iter().map(|(_, s)| (s - max_log).exp()).sum();
        if mass <= 0.0 {
            return None;
        }

        let (category, best) = scores
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;
        let confidence = ((best - max_log).exp() / mass).clamp(0.0, 1.0);

        debug!(
            "Classified '{}' as {} (confidence {:.3})",
            text, category, confidence
        );

        Some(Classification {
            category_id: category.to_string(),
            confidence,
        })
    }
}
