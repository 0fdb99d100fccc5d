//! Classifier label vocabulary and its canonical categories.

use crate::emotion::CanonicalCategory;

/// Every label the supported classifiers can emit, with its category.
pub static LABEL_CATEGORIES: &[(&str, CanonicalCategory)] = &[
    ("joy", CanonicalCategory::Positive),
    ("love", CanonicalCategory::Positive),
    ("optimism", CanonicalCategory::Positive),
    ("trust", CanonicalCategory::Positive),
    ("admiration", CanonicalCategory::Positive),
    ("amusement", CanonicalCategory::Positive),
    ("anger", CanonicalCategory::Negative),
    ("disgust", CanonicalCategory::Negative),
    ("fear", CanonicalCategory::Negative),
    ("sadness", CanonicalCategory::Negative),
    ("pessimism", CanonicalCategory::Negative),
    ("disappointment", CanonicalCategory::Negative),
    ("guilt", CanonicalCategory::Negative),
    ("remorse", CanonicalCategory::Negative),
    ("neutral", CanonicalCategory::Neutral),
    ("surprise", CanonicalCategory::Surprised),
    ("curiosity", CanonicalCategory::Inquisitive),
];

/// Looks up a label after trimming and lowercasing it.
pub fn category_for_label(label: &str) -> Option<CanonicalCategory> {
    let normalized = label.trim().to_lowercase();
    LABEL_CATEGORIES
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, category)| *category)
}
