use crate::emotion::RawScores;
use futures::future::BoxFuture;
use futures::FutureExt;

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("classifier returned no scores")]
    EmptyResponse,
    #[error("classifier request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("classifier api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
    #[error("invalid classifier url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClassifyError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifyError::Network(e) => e.is_timeout() || e.is_connect(),
            ClassifyError::Api { status, .. } => crate::util::is_http_retryable(*status),
            _ => false,
        }
    }
}

/// Turns free text into per-label confidences.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, text: String) -> BoxFuture<'_, Result<RawScores, ClassifyError>>;
}

impl<C: EmotionClassifier + ?Sized> EmotionClassifier for Box<C> {
    fn classify(&self, text: String) -> BoxFuture<'_, Result<RawScores, ClassifyError>> {
        (**self).classify(text)
    }
}

const KEYWORD_HIT_WEIGHT: f64 = 2.0;
const NEUTRAL_BASELINE: f64 = 1.0;

static KEYWORDS: &[(&str, &[&str])] = &[
    ("joy", &["happy", "glad", "joy", "joyful", "delighted", "great", "wonderful", "yay"]),
    ("love", &["love", "loved", "adore", "lovely"]),
    ("optimism", &["hope", "hopeful", "optimistic", "hopefully"]),
    ("admiration", &["amazing", "awesome", "brilliant", "impressive", "proud"]),
    ("amusement", &["funny", "haha", "lol", "hilarious"]),
    ("anger", &["angry", "mad", "furious", "annoyed", "hate", "outraged"]),
    ("disgust", &["disgust", "disgusting", "gross", "revolting"]),
    ("fear", &["scared", "afraid", "fear", "terrified", "worried", "anxious"]),
    ("sadness", &["sad", "unhappy", "depressed", "miserable", "crying", "lonely"]),
    ("disappointment", &["terrible", "awful", "disappointed", "disappointing", "unfortunately"]),
    ("surprise", &["wow", "whoa", "omg", "unbelievable", "shocked", "surprised", "surprise"]),
    ("curiosity", &["why", "how", "wonder", "curious", "what"]),
];

/// Deterministic offline classifier driven by keyword hits.
///
/// Every known label is reported. `neutral` carries a constant baseline so
/// text without any hits classifies as neutral; a trailing `?` counts as a
/// curiosity hit.
pub struct KeywordEmotionClassifier;

impl KeywordEmotionClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, text: &str) -> RawScores {
        let lower_text = text.to_lowercase();
        let words: Vec<&str> = lower_text
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let mut scores = RawScores::new();
        scores.insert("neutral".to_owned(), NEUTRAL_BASELINE);
        for (label, keywords) in KEYWORDS {
            let hits = words.iter().filter(|w| keywords.contains(*w)).count();
            scores.insert((*label).to_owned(), hits as f64 * KEYWORD_HIT_WEIGHT);
        }
        if lower_text.trim_end().ends_with('?') {
            if let Some(curiosity) = scores.get_mut("curiosity") {
                *curiosity += KEYWORD_HIT_WEIGHT;
            }
        }

        let total: f64 = scores.values().sum();
        for v in scores.values_mut() {
            *v /= total;
        }
        scores
    }
}

impl Default for KeywordEmotionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionClassifier for KeywordEmotionClassifier {
    fn classify(&self, text: String) -> BoxFuture<'_, Result<RawScores, ClassifyError>> {
        async move { Ok(self.score(&text)) }.boxed()
    }
}
