use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;

/// Occurrence counts and document total for one category. `total_tokens`
/// always equals the sum of `tokens`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    documents: u64,
    total_tokens: u64,
    tokens: BTreeMap<String, u64>,
}

impl CategoryCounts {
    /// `None` when the token counts do not fit in a `u64` total.
    pub(crate) fn from_tokens(documents: u64, tokens: BTreeMap<String, u64>) -> Option<Self> {
        let total_tokens = tokens
            .values()
            .try_fold(0u64, |total, count| total.checked_add(*count))?;
        Some(Self {
            documents,
            total_tokens,
            tokens,
        })
    }

    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn tokens(&self) -> &BTreeMap<String, u64> {
        &self.tokens
    }

    pub fn count(&self, token: &str) -> u64 {
        self.tokens.get(token).copied().unwrap_or(0)
    }

    pub fn has_training_data(&self) -> bool {
        self.documents > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyStore {
    categories: IndexMap<String, CategoryCounts>,
    vocabulary: BTreeSet<String>,
}

impl FrequencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        categories: IndexMap<String, CategoryCounts>,
        mut vocabulary: BTreeSet<String>,
    ) -> Self {
        for counts in categories.values() {
            vocabulary.extend(counts.tokens.keys().cloned());
        }
        Self {
            categories,
            vocabulary,
        }
    }

    pub fn increment(&mut self, category: &str, token: &str, by: u64) {
        let counts = self.category_entry(category);
        let count = counts.tokens.entry(token.to_string()).or_insert(0);
        *count = count.saturating_add(by);
        counts.total_tokens = counts.total_tokens.saturating_add(by);
        if !self.vocabulary.contains(token) {
            self.vocabulary.insert(token.to_string());
        }
    }

    /// Subtracts up to `by` from the count and returns how much was actually
    /// removed. Entries and vocabulary membership survive a drop to zero.
    pub fn decrement(&mut self, category: &str, token: &str, by: u64) -> u64 {
        let Some(counts) = self.categories.get_mut(category) else {
            return 0;
        };
        let Some(count) = counts.tokens.get_mut(token) else {
            return 0;
        };
        let removed = by.min(*count);
        *count -= removed;
        counts.total_tokens = counts.total_tokens.saturating_sub(removed);
        removed
    }

    pub(crate) fn add_document(&mut self, category: &str) {
        let counts = self.category_entry(category);
        counts.documents = counts.documents.saturating_add(1);
    }

    pub(crate) fn remove_document(&mut self, category: &str) {
        if let Some(counts) = self.categories.get_mut(category) {
            counts.documents = counts.documents.saturating_sub(1);
        }
    }

    /// Removes every vocabulary token whose count summed across categories is
    /// strictly below `threshold`. Returns the number of tokens removed.
    pub fn purge_less_than(&mut self, threshold: u64) -> usize {
        if threshold == 0 {
            return 0;
        }

        let doomed: Vec<String> = self
            .vocabulary
            .iter()
            .filter(|token| self.token_count_across_categories(token) < threshold)
            .cloned()
            .collect();

        for token in &doomed {
            for counts in self.categories.values_mut() {
                if let Some(count) = counts.tokens.remove(token.as_str()) {
                    counts.total_tokens = counts.total_tokens.saturating_sub(count);
                }
            }
            self.vocabulary.remove(token.as_str());
        }

        doomed.len()
    }

    /// Drops the category's table and totals. Vocabulary is left alone.
    pub fn delete_category(&mut self, category: &str) -> bool {
        self.categories.shift_remove(category).is_some()
    }

    pub fn count(&self, category: &str, token: &str) -> u64 {
        self.categories
            .get(category)
            .map(|counts| counts.count(token))
            .unwrap_or(0)
    }

    pub fn token_count_across_categories(&self, token: &str) -> u64 {
        self.categories
            .values()
            .fold(0u64, |total, counts| total.saturating_add(counts.count(token)))
    }

    pub fn totals(&self, category: &str) -> Option<&CategoryCounts> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &CategoryCounts)> {
        self.categories
            .iter()
            .map(|(name, counts)| (name.as_str(), counts))
    }

    pub fn contains_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn vocabulary(&self) -> &BTreeSet<String> {
        &self.vocabulary
    }

    pub fn total_documents(&self) -> u64 {
        self.categories
            .values()
            .fold(0u64, |total, counts| total.saturating_add(counts.documents))
    }

    fn category_entry(&mut self, category: &str) -> &mut CategoryCounts {
        self.categories.entry(category.to_string()).or_default()
    }
}
