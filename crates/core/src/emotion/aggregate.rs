use crate::emotion::labels::category_for_label;
use crate::emotion::{clamp_unit, CanonicalScores, MappingError, RawScores};

const LOG_TARGET: &str = "emotion::aggregate";

/// Folds raw classifier scores into per-category sums.
///
/// Every label must be known; out-of-range scores are clamped into [0, 1].
/// Fails with [`MappingError::EmptyInput`] when nothing is left to rank.
pub fn aggregate(raw: &RawScores) -> Result<CanonicalScores, MappingError> {
    if raw.is_empty() {
        return Err(MappingError::EmptyInput);
    }

    let mut scores = CanonicalScores::default();
    for (label, &score) in raw {
        let category = category_for_label(label).ok_or_else(|| MappingError::UnmappedLabel {
            label: label.clone(),
        })?;

        let sanitized = clamp_unit(score);
        if sanitized != score {
            tracing::warn!(
                target: LOG_TARGET,
                label = %label,
                score,
                clamped = sanitized,
                "classifier score out of range"
            );
        }
        scores.add(category, sanitized);
    }

    if scores.total() <= 0.0 {
        return Err(MappingError::EmptyInput);
    }

    tracing::debug!(target: LOG_TARGET, labels = raw.len(), total = scores.total(), "aggregated scores");
    Ok(scores)
}
