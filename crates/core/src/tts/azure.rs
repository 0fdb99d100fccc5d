use crate::config::{ApiKey, AzureRegion};
use crate::tts::{ssml, TtsAudio, TtsClient, TtsError, TtsRequest};
use crate::util::{retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

pub const DEFAULT_OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";
const USER_AGENT: &str = concat!("empathy-engine/", env!("CARGO_PKG_VERSION"));
const LOG_TARGET: &str = "tts::azure";

/// Neural TTS over the Azure Speech REST endpoint.
///
/// The whole request, including voice, style and prosody, is carried in the
/// SSML body.
#[derive(Clone)]
pub struct AzureTtsClient {
    client: Client,
    api_key: ApiKey,
    endpoint: Url,
    output_format: String,
    retry: RetryConfig,
}

impl AzureTtsClient {
    pub fn new(api_key: ApiKey, region: &AzureRegion) -> Result<Self, TtsError> {
        let endpoint = Url::parse(&format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            region.as_str()
        ))?;
        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint,
            output_format: DEFAULT_OUTPUT_FORMAT.to_owned(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_output_format(mut self, output_format: String) -> Self {
        self.output_format = output_format;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn request_once(&self, body: &str) -> Result<TtsAudio, TtsError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Ocp-Apim-Subscription-Key", self.api_key.expose())
            .header(CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", &self.output_format)
            .header("User-Agent", USER_AGENT)
            .body(body.to_owned())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());
            return Err(TtsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_owned();
        let data = response.bytes().await?;
        if data.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        Ok(TtsAudio { content_type, data })
    }
}

impl TtsClient for AzureTtsClient {
    fn synthesize(&self, request: TtsRequest) -> BoxFuture<'_, Result<TtsAudio, TtsError>> {
        async move {
            let body = ssml::render(&request.text, &request.voice.0, &request.params);
            tracing::debug!(
                target: LOG_TARGET,
                voice = %request.voice.0,
                style = ?request.params.style,
                ssml_len = body.len(),
                "requesting synthesis"
            );

            let audio = retry_with_backoff(&self.retry, || self.request_once(&body), TtsError::is_retryable).await?;

            tracing::info!(
                target: LOG_TARGET,
                bytes = audio.data.len(),
                content_type = %audio.content_type,
                "synthesis complete"
            );
            Ok(audio)
        }
        .boxed()
    }
}
