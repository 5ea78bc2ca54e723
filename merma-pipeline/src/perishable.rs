//! Perishable classification over category names.
//!
//! A category counts as perishable when it contains one of a configured
//! keyword list, case-insensitively. The list is configuration rather
//! than scattered string matching: callers with different category
//! taxonomies build their own classifier and the rest of the pipeline
//! never changes.

/// Default keyword set: the short-shelf-life groups the dashboard
/// tracks. Matching is case-insensitive substring, so `Fresh Fruit`
/// and `FRUTAS-frozen` both hit `fruit`.
pub const PERISHABLE_KEYWORDS: [&str; 5] = ["dairy", "fruit", "vegetable", "meat", "bread"];

/// Splits category names into perishable and non-perishable.
#[derive(Clone, Debug)]
pub struct PerishableClassifier {
    keywords: Vec<String>,
}

impl Default for PerishableClassifier {
    fn default() -> Self {
        PerishableClassifier::new(PERISHABLE_KEYWORDS)
    }
}

impl PerishableClassifier {
    /// Build a classifier from a custom keyword list. Keywords are
    /// lowercased once here so classification never re-normalizes them.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| keyword.into().to_lowercase())
            .collect();
        PerishableClassifier { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_perishable(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        self.keywords.iter().any(|keyword| category.contains(keyword.as_str()))
    }
}
