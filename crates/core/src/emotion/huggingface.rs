use crate::config::ApiKey;
use crate::emotion::{ClassifyError, EmotionClassifier, RawScores};
use crate::util::{retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_HF_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";
pub const DEFAULT_HF_BASE_URL: &str = "https://api-inference.huggingface.co";
const LOG_TARGET: &str = "emotion::huggingface";

/// Text classification through the hosted inference API.
#[derive(Clone)]
pub struct HuggingFaceClassifier {
    client: Client,
    api_token: Option<ApiKey>,
    base_url: Url,
    model: String,
    retry: RetryConfig,
}

impl HuggingFaceClassifier {
    pub fn new(api_token: Option<ApiKey>, model: String) -> Result<Self, ClassifyError> {
        let base_url = Url::parse(DEFAULT_HF_BASE_URL)?;
        Ok(Self {
            client: Client::new(),
            api_token,
            base_url,
            model,
            retry: RetryConfig::default(),
        })
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.model
        )
    }

    async fn request_once(&self, text: &str) -> Result<RawScores, ClassifyError> {
        let body = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters { top_k: None },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        parse_scores(&text)
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters {
    // `null` asks for every label rather than only the best one.
    top_k: Option<u32>,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batched(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
    Single(LabelScore),
}

/// Parses any of the response shapes the API returns for a single input.
/// Labels are lowercased; an empty result is an error.
fn parse_scores(body: &str) -> Result<RawScores, ClassifyError> {
    let parsed: InferenceResponse = serde_json::from_str(body)
        .map_err(|e| ClassifyError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

    let items = match parsed {
        InferenceResponse::Batched(batches) => batches.into_iter().next().unwrap_or_default(),
        InferenceResponse::Flat(items) => items,
        InferenceResponse::Single(item) => vec![item],
    };

    let scores: RawScores = items
        .into_iter()
        .filter(|item| !item.label.trim().is_empty())
        .map(|item| (item.label.trim().to_lowercase(), item.score))
        .collect();

    if scores.is_empty() {
        return Err(ClassifyError::EmptyResponse);
    }
    Ok(scores)
}

impl EmotionClassifier for HuggingFaceClassifier {
    fn classify(&self, text: String) -> BoxFuture<'_, Result<RawScores, ClassifyError>> {
        async move {
            tracing::debug!(target: LOG_TARGET, model = %self.model, chars = text.len(), "classifying text");
            let scores = retry_with_backoff(
                &self.retry,
                || self.request_once(&text),
                ClassifyError::is_retryable,
            )
            .await?;
            tracing::debug!(target: LOG_TARGET, labels = scores.len(), "classifier responded");
            Ok(scores)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_batched_response() {
        let body = r#"[[{"label":"joy","score":0.82},{"label":"neutral","score":0.12},{"label":"sadness","score":0.06}]]"#;
        let scores = parse_scores(body).unwrap();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores["joy"], 0.82);
    }

    #[test]
    fn parses_flat_response_and_lowercases_labels() {
        let body = r#"[{"label":"Anger","score":0.7},{"label":"FEAR","score":0.3}]"#;
        let scores = parse_scores(body).unwrap();
        assert_eq!(scores["anger"], 0.7);
        assert_eq!(scores["fear"], 0.3);
    }

    #[test]
    fn parses_single_object() {
        let scores = parse_scores(r#"{"label":"surprise","score":0.9}"#).unwrap();
        assert_eq!(scores["surprise"], 0.9);
    }

    #[test]
    fn empty_response_is_an_error() {
        assert!(matches!(parse_scores("[[]]"), Err(ClassifyError::EmptyResponse)));
        assert!(matches!(
            parse_scores(r#"[{"label":"","score":1.0}]"#),
            Err(ClassifyError::EmptyResponse)
        ));
    }

    #[test]
    fn malformed_response_is_invalid() {
        assert!(matches!(
            parse_scores(r#"{"error":"model loading"}"#),
            Err(ClassifyError::InvalidResponse(_))
        ));
    }

    #[test]
    fn endpoint_joins_model_path() {
        let classifier = HuggingFaceClassifier::new(None, DEFAULT_HF_MODEL.to_owned())
            .unwrap()
            .with_base_url(Url::parse("http://localhost:8080/").unwrap());
        assert_eq!(
            classifier.endpoint(),
            "http://localhost:8080/models/j-hartmann/emotion-english-distilroberta-base"
        );
    }

    #[test]
    fn builder_keeps_model_and_retry_budget() {
        let classifier = HuggingFaceClassifier::new(None, "bhadresh-savani/distilbert-base-uncased-emotion".to_owned())
            .unwrap()
            .with_retry(RetryConfig::new(1, std::time::Duration::ZERO));
        assert_eq!(classifier.model(), "bhadresh-savani/distilbert-base-uncased-emotion");
        assert_eq!(classifier.retry.max_attempts, 1);
        assert!(classifier.endpoint().ends_with("/models/bhadresh-savani/distilbert-base-uncased-emotion"));
    }

    #[test]
    fn request_body_asks_for_all_labels() {
        let body = InferenceRequest {
            inputs: "hi",
            parameters: InferenceParameters { top_k: None },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["parameters"]["top_k"].is_null());
        assert_eq!(json["options"]["wait_for_model"], true);
    }
}
