/// Per-category likelihoods in category insertion order. Values lie in
/// `[0, 1]` and sum to one unless the result is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    scores: Vec<(String, f64)>,
}

impl ClassificationResult {
    pub(crate) fn new(scores: Vec<(String, f64)>) -> Self {
        Self { scores }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores
            .iter()
            .map(|(category, likelihood)| (category.as_str(), *likelihood))
    }

    pub fn get(&self, category: &str) -> Option<f64> {
        self.iter()
            .find(|(name, _)| *name == category)
            .map(|(_, likelihood)| likelihood)
    }

    /// Highest likelihood wins; on a tie the earliest category is kept.
    pub fn max_class(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (category, likelihood) in self.iter() {
            match best {
                Some((_, top)) if likelihood <= top => {}
                _ => best = Some((category, likelihood)),
            }
        }
        best.map(|(category, _)| category)
    }

    /// Categories whose likelihood is strictly greater than `threshold`.
    pub fn above(&self, threshold: f64) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, likelihood)| *likelihood > threshold)
            .map(|(category, _)| category)
    }
}
