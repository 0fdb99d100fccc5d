//! Emotion to prosody mapping.
//!
//! Each canonical category owns a fixed set of base deltas (rate, pitch,
//! volume) applied at full strength. The detected intensity scales those
//! deltas linearly between [`MIN_MULTIPLIER`] and [`MAX_MULTIPLIER`], so even
//! a weak emotion stays audible while a strong one is exaggerated.

use crate::emotion::{clamp_unit, CanonicalCategory, EmotionProfile, MappingError, RawScores};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_MULTIPLIER: f64 = 0.60;
pub const MAX_MULTIPLIER: f64 = 1.40;
// Literal width of the multiplier range. `MAX_MULTIPLIER - MIN_MULTIPLIER`
// comes out one ulp short and breaks half-way rounding.
const MULTIPLIER_SPAN: f64 = 0.80;
pub const DEFAULT_VOICE: &str = "en-US-AriaNeural";

const LOG_TARGET: &str = "voice";

/// Speaking style preset understood by neural TTS voices.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StyleHint {
    Cheerful,
    Sad,
    Excited,
    Chat,
}

impl StyleHint {
    pub const fn as_str(self) -> &'static str {
        match self {
            StyleHint::Cheerful => "cheerful",
            StyleHint::Sad => "sad",
            StyleHint::Excited => "excited",
            StyleHint::Chat => "chat",
        }
    }
}

impl fmt::Display for StyleHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unscaled offsets for a category at full intensity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceDeltas {
    pub rate_percent: f64,
    pub pitch_hz: f64,
    pub volume_percent: f64,
    pub style: Option<StyleHint>,
}

impl VoiceDeltas {
    pub const fn for_category(category: CanonicalCategory) -> Self {
        match category {
            CanonicalCategory::Positive => Self {
                rate_percent: 18.0,
                pitch_hz: 35.0,
                volume_percent: 4.0,
                style: Some(StyleHint::Cheerful),
            },
            CanonicalCategory::Negative => Self {
                rate_percent: -12.0,
                pitch_hz: -30.0,
                volume_percent: -2.0,
                style: Some(StyleHint::Sad),
            },
            CanonicalCategory::Neutral => Self {
                rate_percent: 0.0,
                pitch_hz: 0.0,
                volume_percent: 0.0,
                style: None,
            },
            CanonicalCategory::Surprised => Self {
                rate_percent: 24.0,
                pitch_hz: 50.0,
                volume_percent: 6.0,
                style: Some(StyleHint::Excited),
            },
            CanonicalCategory::Inquisitive => Self {
                rate_percent: 8.0,
                pitch_hz: 18.0,
                volume_percent: 2.0,
                style: Some(StyleHint::Chat),
            },
        }
    }
}

/// Maps intensity in [0, 1] onto [`MIN_MULTIPLIER`, `MAX_MULTIPLIER`]
/// as `0.60 + intensity * 0.80`.
pub fn intensity_multiplier(intensity: f64) -> f64 {
    let t = clamp_unit(intensity);
    MIN_MULTIPLIER + t * MULTIPLIER_SPAN
}

// Zero bases stay exactly zero; everything else rounds half away from zero.
fn scale(base: f64, multiplier: f64) -> i32 {
    if base == 0.0 {
        return 0;
    }
    (base * multiplier).round() as i32
}

/// Final prosody adjustments handed to the speech engine.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SynthesisParameters {
    pub category: CanonicalCategory,
    pub intensity: f64,
    pub multiplier: f64,
    pub rate_percent: i32,
    pub pitch_hz: i32,
    pub volume_percent: i32,
    pub style: Option<StyleHint>,
}

impl SynthesisParameters {
    pub fn from_profile(profile: &EmotionProfile) -> Self {
        Self::scaled(profile.category, profile.intensity)
    }

    pub fn scaled(category: CanonicalCategory, intensity: f64) -> Self {
        let intensity = clamp_unit(intensity);
        let multiplier = intensity_multiplier(intensity);
        let base = VoiceDeltas::for_category(category);

        Self {
            category,
            intensity,
            multiplier,
            rate_percent: scale(base.rate_percent, multiplier),
            pitch_hz: scale(base.pitch_hz, multiplier),
            volume_percent: scale(base.volume_percent, multiplier),
            style: base.style,
        }
    }

    pub fn rate(&self) -> String {
        format!("{:+}%", self.rate_percent)
    }

    pub fn pitch(&self) -> String {
        format!("{:+}Hz", self.pitch_hz)
    }

    pub fn volume(&self) -> String {
        format!("{:+}%", self.volume_percent)
    }
}

/// Maps raw classifier scores straight to synthesis parameters.
pub fn map_emotion_to_voice(raw_scores: &RawScores) -> Result<SynthesisParameters, MappingError> {
    let profile = EmotionProfile::from_raw_scores(raw_scores.clone())?;
    let params = SynthesisParameters::from_profile(&profile);
    tracing::debug!(
        target: LOG_TARGET,
        category = %params.category,
        intensity = params.intensity,
        rate = params.rate_percent,
        pitch = params.pitch_hz,
        volume = params.volume_percent,
        "mapped emotion to voice"
    );
    Ok(params)
}

/// Voice name plus the signed prosody strings neural TTS engines accept.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceProfile {
    pub voice: String,
    pub rate: String,
    pub pitch: String,
    pub volume: String,
    pub style: Option<StyleHint>,
}

impl VoiceProfile {
    pub fn new(voice: impl Into<String>, params: &SynthesisParameters) -> Self {
        Self {
            voice: voice.into(),
            rate: params.rate(),
            pitch: params.pitch(),
            volume: params.volume(),
            style: params.style,
        }
    }
}
