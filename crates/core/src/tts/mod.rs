mod azure;
pub mod ssml;

use crate::voice::SynthesisParameters;
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use azure::{AzureTtsClient, DEFAULT_OUTPUT_FORMAT};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceId(pub String);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TtsRequest {
    pub text: String,
    pub voice: VoiceId,
    pub params: SynthesisParameters,
}

/// Encoded audio as returned by the speech service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TtsAudio {
    pub content_type: String,
    pub data: Bytes,
}

impl TtsAudio {
    /// File extension matching the content type, defaulting to `bin`.
    pub fn extension(&self) -> &'static str {
        match self.content_type.split(';').next().map(str::trim) {
            Some("audio/mpeg") | Some("audio/mp3") => "mp3",
            Some("audio/wav") | Some("audio/x-wav") | Some("audio/wave") => "wav",
            Some("audio/ogg") => "ogg",
            Some("audio/webm") => "webm",
            _ => "bin",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("tts request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("tts api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("tts returned no audio")]
    EmptyAudio,
    #[error("invalid tts url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl TtsError {
    pub fn is_retryable(&self) -> bool {
        match self {
            TtsError::Network(e) => e.is_timeout() || e.is_connect(),
            TtsError::Api { status, .. } => crate::util::is_http_retryable(*status),
            _ => false,
        }
    }
}

pub trait TtsClient: Send + Sync {
    fn synthesize(&self, request: TtsRequest) -> BoxFuture<'_, Result<TtsAudio, TtsError>>;
}
