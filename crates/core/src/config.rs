use crate::emotion::{DEFAULT_HF_BASE_URL, DEFAULT_HF_MODEL};
use crate::tts::DEFAULT_OUTPUT_FORMAT;
use crate::util::RetryConfig;
use crate::voice::DEFAULT_VOICE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_AZURE_REGION: &str = "eastus";
pub const DEFAULT_OUTPUT_PATH: &str = "speech.mp3";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_AZURE_SPEECH_KEY: &str = "AZURE_SPEECH_KEY";
pub const ENV_AZURE_SPEECH_REGION: &str = "AZURE_SPEECH_REGION";
pub const ENV_EMPATHY_VOICE: &str = "EMPATHY_VOICE";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceName(String);

impl VoiceName {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyVoice);
        }
        Ok(Self(v.trim().to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VoiceName {
    fn default() -> Self {
        Self(DEFAULT_VOICE.to_owned())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AzureRegion(String);

impl AzureRegion {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into().trim().to_lowercase();
        if v.is_empty() || !v.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidRegion(v));
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AzureRegion {
    fn default() -> Self {
        Self(DEFAULT_AZURE_REGION.to_owned())
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierBackend {
    /// Offline keyword scoring.
    #[default]
    Keyword,
    /// Hosted transformer model.
    #[serde(rename = "huggingface")]
    HuggingFace,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackend,
    pub model: String,
    pub base_url: String,
    pub api_token: Option<ApiKey>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::default(),
            model: DEFAULT_HF_MODEL.to_owned(),
            base_url: DEFAULT_HF_BASE_URL.to_owned(),
            api_token: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TtsConfig {
    pub api_key: Option<ApiKey>,
    pub region: AzureRegion,
    /// Full synthesis URL; replaces the one derived from `region`.
    pub endpoint: Option<String>,
    pub output_format: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            region: AzureRegion::default(),
            endpoint: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub voice: VoiceName,
    pub classifier: ClassifierConfig,
    pub tts: TtsConfig,
    pub output_path: Option<PathBuf>,
    /// Attempts per remote call, shared by the classifier and TTS clients.
    pub max_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            voice: VoiceName::default(),
            classifier: ClassifierConfig::default(),
            tts: TtsConfig::default(),
            output_path: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AppConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            ..RetryConfig::default()
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("voice name must not be empty")]
    EmptyVoice,
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("invalid azure region: {0:?}")]
    InvalidRegion(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory environment for tests.
#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}
