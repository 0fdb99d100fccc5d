mod aggregate;
mod classifier;
mod huggingface;
pub mod labels;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub use aggregate::aggregate;
pub use classifier::{ClassifyError, EmotionClassifier, KeywordEmotionClassifier};
pub use huggingface::{HuggingFaceClassifier, DEFAULT_HF_BASE_URL, DEFAULT_HF_MODEL};

/// Per-label confidences exactly as the classifier emitted them.
pub type RawScores = BTreeMap<String, f64>;

/// The coarse emotion buckets that drive voice parameters.
///
/// Declaration order is the tie-break order used when two categories
/// aggregate to the same score.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalCategory {
    Positive,
    Negative,
    Neutral,
    Surprised,
    Inquisitive,
}

impl CanonicalCategory {
    pub const ALL: [CanonicalCategory; 5] = [
        CanonicalCategory::Positive,
        CanonicalCategory::Negative,
        CanonicalCategory::Neutral,
        CanonicalCategory::Surprised,
        CanonicalCategory::Inquisitive,
    ];

    pub const fn index(self) -> usize {
        match self {
            CanonicalCategory::Positive => 0,
            CanonicalCategory::Negative => 1,
            CanonicalCategory::Neutral => 2,
            CanonicalCategory::Surprised => 3,
            CanonicalCategory::Inquisitive => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            CanonicalCategory::Positive => "positive",
            CanonicalCategory::Negative => "negative",
            CanonicalCategory::Neutral => "neutral",
            CanonicalCategory::Surprised => "surprised",
            CanonicalCategory::Inquisitive => "inquisitive",
        }
    }
}

impl fmt::Display for CanonicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("no emotion scores to map (empty or all zero)")]
    EmptyInput,
    #[error("classifier label {label:?} has no canonical category")]
    UnmappedLabel { label: String },
}

/// Aggregate score per canonical category, indexed by enumeration order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CanonicalScores([f64; 5]);

impl CanonicalScores {
    pub fn get(&self, category: CanonicalCategory) -> f64 {
        self.0[category.index()]
    }

    pub(crate) fn add(&mut self, category: CanonicalCategory, score: f64) {
        self.0[category.index()] += score;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalCategory, f64)> + '_ {
        CanonicalCategory::ALL.iter().map(|c| (*c, self.get(*c)))
    }

    /// Highest-scoring category. Only a strictly greater score displaces an
    /// earlier category, so ties go to the first in enumeration order.
    pub fn dominant(&self) -> (CanonicalCategory, f64) {
        let mut best = (CanonicalCategory::Positive, self.get(CanonicalCategory::Positive));
        for (category, score) in self.iter().skip(1) {
            if score > best.1 {
                best = (category, score);
            }
        }
        best
    }

    /// Scores divided by their total. A zero total is returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return *self;
        }
        let mut out = *self;
        for v in out.0.iter_mut() {
            *v /= total;
        }
        out
    }
}

impl Serialize for CanonicalScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CanonicalCategory::ALL.len()))?;
        for (category, score) in self.iter() {
            map.serialize_entry(category.as_str(), &score)?;
        }
        map.end()
    }
}

/// Dominant emotion, its intensity and the score breakdown behind it.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct EmotionProfile {
    pub category: CanonicalCategory,
    pub intensity: f64,
    pub canonical_scores: CanonicalScores,
    pub raw_scores: RawScores,
}

impl EmotionProfile {
    pub fn from_raw_scores(raw_scores: RawScores) -> Result<Self, MappingError> {
        let aggregated = aggregate(&raw_scores)?;
        let canonical_scores = aggregated.normalized();
        let (category, dominant_score) = canonical_scores.dominant();

        Ok(Self {
            category,
            intensity: clamp_unit(dominant_score),
            canonical_scores,
            raw_scores,
        })
    }
}

/// Clamps into [0, 1]; NaN and infinities collapse to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    if value.is_infinite() {
        return if value > 0.0 { 1.0 } else { 0.0 };
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, f64)]) -> RawScores {
        pairs.iter().map(|(l, s)| ((*l).to_owned(), *s)).collect()
    }

    #[test]
    fn profile_picks_joy_as_positive() {
        let profile =
            EmotionProfile::from_raw_scores(raw(&[("joy", 0.82), ("neutral", 0.12), ("sadness", 0.06)]))
                .expect("mapped");
        assert_eq!(profile.category, CanonicalCategory::Positive);
        assert!((profile.intensity - 0.82).abs() < 1e-9);
        assert!((profile.canonical_scores.get(CanonicalCategory::Neutral) - 0.12).abs() < 1e-9);
    }

    #[test]
    fn profile_sums_labels_of_same_category() {
        let profile =
            EmotionProfile::from_raw_scores(raw(&[("sadness", 0.70), ("anger", 0.20), ("joy", 0.10)]))
                .expect("mapped");
        assert_eq!(profile.category, CanonicalCategory::Negative);
        assert!((profile.intensity - 0.90).abs() < 1e-9);
    }

    #[test]
    fn intensity_is_renormalized_when_scores_exceed_one() {
        let profile = EmotionProfile::from_raw_scores(raw(&[
            ("joy", 1.0),
            ("love", 1.0),
            ("optimism", 1.0),
            ("anger", 1.0),
        ]))
        .expect("mapped");
        assert_eq!(profile.category, CanonicalCategory::Positive);
        assert!((profile.intensity - 0.75).abs() < 1e-9);
        assert!(profile.intensity <= 1.0);
    }

    #[test]
    fn all_zero_scores_are_empty_input() {
        let err = EmotionProfile::from_raw_scores(raw(&[("joy", 0.0), ("anger", 0.0)]))
            .expect_err("should fail");
        assert_eq!(err, MappingError::EmptyInput);
    }

    #[test]
    fn dominant_tie_prefers_enumeration_order() {
        let mut scores = CanonicalScores::default();
        scores.add(CanonicalCategory::Negative, 0.5);
        scores.add(CanonicalCategory::Positive, 0.5);
        assert_eq!(scores.dominant().0, CanonicalCategory::Positive);

        let mut scores = CanonicalScores::default();
        scores.add(CanonicalCategory::Inquisitive, 0.4);
        scores.add(CanonicalCategory::Surprised, 0.4);
        assert_eq!(scores.dominant().0, CanonicalCategory::Surprised);
    }

    #[test]
    fn canonical_scores_serialize_as_named_map() {
        let mut scores = CanonicalScores::default();
        scores.add(CanonicalCategory::Surprised, 0.25);
        let json = serde_json::to_value(scores).expect("serialize");
        assert_eq!(json["surprised"], 0.25);
        assert_eq!(json["positive"], 0.0);
        assert_eq!(json.as_object().map(|m| m.len()), Some(5));
    }

    #[test]
    fn clamp_unit_handles_non_finite() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(f64::INFINITY), 1.0);
        assert_eq!(clamp_unit(f64::NEG_INFINITY), 0.0);
        assert_eq!(clamp_unit(1.2), 1.0);
        assert_eq!(clamp_unit(-0.1), 0.0);
    }
}
