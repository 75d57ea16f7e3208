use serde::Serialize;
use tracing::debug;

use crate::{
    category::validate_category,
    error::ClassifierResult,
    frequency::{CategoryCounts, FrequencyStore},
    result::ClassificationResult,
};

pub const DEFAULT_SMOOTHING: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    /// Additive smoothing constant `k` in `(count + k) / (total + k * |V|)`.
    pub smoothing: f64,
    /// Give every trained category the same prior instead of weighting by
    /// document frequency.
    pub assume_uniform: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            assume_uniform: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelStats {
    pub categories: usize,
    pub trained_categories: usize,
    pub vocabulary: usize,
    pub documents: u64,
    pub tokens: u64,
}

/// Multinomial Naive Bayes model over whitespace tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    store: FrequencyStore,
    options: ModelOptions,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ModelOptions) -> Self {
        Self {
            store: FrequencyStore::new(),
            options,
        }
    }

    pub(crate) fn from_parts(store: FrequencyStore, options: ModelOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &FrequencyStore {
        &self.store
    }

    pub fn options(&self) -> ModelOptions {
        self.options
    }

    pub fn is_empty(&self) -> bool {
        self.store.categories().next().is_none() && self.store.vocabulary().is_empty()
    }

    pub fn train<S: AsRef<str>>(&mut self, tokens: &[S], category: &str) -> ClassifierResult<()> {
        validate_category(category)?;
        for token in tokens {
            self.store.increment(category, token.as_ref(), 1);
        }
        self.store.add_document(category);
        debug!(category, tokens = tokens.len(), "trained document");
        Ok(())
    }

    /// Reverses one `train` call. Counts and totals clamp at zero, and an
    /// unknown category is left uncreated.
    pub fn untrain<S: AsRef<str>>(&mut self, tokens: &[S], category: &str) -> ClassifierResult<()> {
        validate_category(category)?;
        if !self.store.contains_category(category) {
            debug!(category, "untrain of unknown category ignored");
            return Ok(());
        }
        let mut removed = 0;
        for token in tokens {
            removed += self.store.decrement(category, token.as_ref(), 1);
        }
        self.store.remove_document(category);
        debug!(category, removed, "untrained document");
        Ok(())
    }

    pub fn classify<S: AsRef<str>>(&self, tokens: &[S]) -> ClassificationResult {
        let vocabulary = self.store.vocabulary().len();
        if vocabulary == 0 {
            return ClassificationResult::default();
        }

        let trained: Vec<(&str, &CategoryCounts)> = self
            .store
            .categories()
            .filter(|(_, counts)| counts.has_training_data())
            .collect();
        if trained.is_empty() {
            return ClassificationResult::default();
        }

        let total_documents = trained
            .iter()
            .fold(0u64, |total, (_, counts)| total.saturating_add(counts.documents()));
        let uniform_prior = -(trained.len() as f64).ln();
        let k = self.options.smoothing;

        let log_scores: Vec<(String, f64)> = trained
            .iter()
            .map(|(category, counts)| {
                let prior = if self.options.assume_uniform {
                    uniform_prior
                } else {
                    (counts.documents() as f64 / total_documents as f64).ln()
                };
                let denominator = counts.total_tokens() as f64 + k * vocabulary as f64;
                let evidence: f64 = tokens
                    .iter()
                    .map(|token| ((counts.count(token.as_ref()) as f64 + k) / denominator).ln())
                    .sum();
                (category.to_string(), prior + evidence)
            })
            .collect();

        ClassificationResult::new(normalize(log_scores))
    }

    pub fn purge_less_than(&mut self, threshold: u64) -> usize {
        let purged = self.store.purge_less_than(threshold);
        debug!(threshold, purged, "purged low-frequency tokens");
        purged
    }

    pub fn delete_category(&mut self, category: &str) -> bool {
        self.store.delete_category(category)
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats {
            vocabulary: self.store.vocabulary().len(),
            ..ModelStats::default()
        };
        for (_, counts) in self.store.categories() {
            stats.categories += 1;
            if counts.has_training_data() {
                stats.trained_categories += 1;
            }
            stats.documents = stats.documents.saturating_add(counts.documents());
            stats.tokens = stats.tokens.saturating_add(counts.total_tokens());
        }
        stats
    }
}

/// Softmax over log scores, shifted by the maximum so the largest term is
/// `exp(0)` and nothing underflows to an all-zero sum.
fn normalize(log_scores: Vec<(String, f64)>) -> Vec<(String, f64)> {
    let max = log_scores
        .iter()
        .map(|(_, score)| *score)
        .fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = log_scores
        .iter()
        .map(|(_, score)| (score - max).exp())
        .collect();
    let sum: f64 = weights.iter().sum();

    log_scores
        .into_iter()
        .zip(weights)
        .map(|((category, _), weight)| (category, weight / sum))
        .collect()
}

#[cfg(test)]
#[path = "tests/model_tests.rs"]
mod tests;
