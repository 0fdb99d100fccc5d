#![deny(warnings)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use empathy_engine_core::config::{
    resolve_api_key, resolve_string_with_default, AppConfig, AzureRegion, ClassifierBackend,
    ClassifierConfig, Env, StdEnv, TtsConfig, VoiceName, DEFAULT_AZURE_REGION,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_OUTPUT_PATH, ENV_AZURE_SPEECH_KEY, ENV_AZURE_SPEECH_REGION, ENV_EMPATHY_VOICE,
    ENV_HF_API_TOKEN,
};
use empathy_engine_core::emotion::{
    EmotionClassifier, HuggingFaceClassifier, KeywordEmotionClassifier, DEFAULT_HF_BASE_URL,
    DEFAULT_HF_MODEL,
};
use empathy_engine_core::pipeline::{analyze, Pipeline, SynthesisReport};
use empathy_engine_core::tts::{AzureTtsClient, DEFAULT_OUTPUT_FORMAT};
use empathy_engine_core::util::RetryConfig;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "empathy-engine")]
#[command(about = "Detect the emotion in text and speak it with a matching voice")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected emotion and voice settings as JSON.
    Analyze(CommonArgs),
    /// Synthesize expressive speech and write it to a file.
    Synthesize {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long)]
        azure_key: Option<String>,

        #[arg(long, env = ENV_AZURE_SPEECH_REGION, default_value = DEFAULT_AZURE_REGION)]
        azure_region: String,

        /// Full synthesis URL, overriding the regional endpoint.
        #[arg(long)]
        azure_endpoint: Option<String>,

        #[arg(long, default_value = DEFAULT_OUTPUT_FORMAT)]
        output_format: String,

        #[arg(long, short, default_value = DEFAULT_OUTPUT_PATH)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Text to analyze; read from stdin when omitted.
    #[arg(long, short)]
    text: Option<String>,

    #[arg(long, value_enum, default_value_t = Backend::Keyword)]
    classifier: Backend,

    #[arg(long, default_value = DEFAULT_HF_MODEL)]
    model: String,

    #[arg(long, default_value = DEFAULT_HF_BASE_URL)]
    hf_base_url: String,

    #[arg(long)]
    hf_token: Option<String>,

    #[arg(long)]
    voice: Option<String>,

    /// Attempts per remote call before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    Keyword,
    Huggingface,
}

impl From<Backend> for ClassifierBackend {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Keyword => ClassifierBackend::Keyword,
            Backend::Huggingface => ClassifierBackend::HuggingFace,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let env = StdEnv;
    match cli.command {
        Command::Analyze(common) => {
            let text = read_text(common.text.clone())?;
            let cfg = build_config(common, None, &env)?;
            let classifier = build_classifier(&cfg.classifier, cfg.retry())?;
            let analysis = analyze(&*classifier, &cfg.voice, &text).await?;
            print_report(&SynthesisReport::new(&analysis, None))?;
        }
        Command::Synthesize {
            common,
            azure_key,
            azure_region,
            azure_endpoint,
            output_format,
            output,
        } => {
            let text = read_text(common.text.clone())?;
            let tts = TtsConfig {
                api_key: resolve_api_key(azure_key, ENV_AZURE_SPEECH_KEY, &env)?,
                region: AzureRegion::new(azure_region)?,
                endpoint: azure_endpoint,
                output_format,
            };
            let mut cfg = build_config(common, Some(tts), &env)?;
            cfg.output_path = Some(output);
            run_synthesis(cfg, &text).await?;
        }
    }

    Ok(())
}

async fn run_synthesis(cfg: AppConfig, text: &str) -> anyhow::Result<()> {
    let api_key = cfg
        .tts
        .api_key
        .clone()
        .ok_or_else(|| {
            anyhow::anyhow!("an Azure Speech key is required (--azure-key or {ENV_AZURE_SPEECH_KEY})")
        })?;
    let mut tts = AzureTtsClient::new(api_key, &cfg.tts.region)?
        .with_output_format(cfg.tts.output_format.clone())
        .with_retry(cfg.retry());
    if let Some(endpoint) = &cfg.tts.endpoint {
        let endpoint = endpoint
            .parse::<url::Url>()
            .with_context(|| format!("invalid --azure-endpoint: {endpoint}"))?;
        tts = tts.with_endpoint(endpoint);
    }
    let classifier = build_classifier(&cfg.classifier, cfg.retry())?;

    tracing::info!(
        voice = %cfg.voice.as_str(),
        classifier = ?cfg.classifier.backend,
        region = %cfg.tts.region.as_str(),
        max_attempts = cfg.max_attempts,
        "config loaded"
    );

    let pipeline = Pipeline::new(classifier, tts, cfg.voice.clone());
    let synthesis = pipeline.run(text).await?;

    let output = cfg
        .output_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));
    tokio::fs::write(&output, &synthesis.audio.data)
        .await
        .with_context(|| format!("failed to write audio to {}", output.display()))?;
    tracing::info!(
        path = %output.display(),
        bytes = synthesis.audio.data.len(),
        format = synthesis.audio.extension(),
        "audio written"
    );

    print_report(&SynthesisReport::new(&synthesis.analysis, Some(output)))
}

fn build_classifier(
    cfg: &ClassifierConfig,
    retry: RetryConfig,
) -> anyhow::Result<Box<dyn EmotionClassifier>> {
    let classifier: Box<dyn EmotionClassifier> = match cfg.backend {
        ClassifierBackend::Keyword => Box::new(KeywordEmotionClassifier::new()),
        ClassifierBackend::HuggingFace => {
            let base_url = cfg
                .base_url
                .parse::<url::Url>()
                .with_context(|| format!("invalid --hf-base-url: {}", cfg.base_url))?;
            let classifier = HuggingFaceClassifier::new(cfg.api_token.clone(), cfg.model.clone())?
                .with_base_url(base_url)
                .with_retry(retry);
            tracing::info!(model = classifier.model(), "using hosted classifier");
            Box::new(classifier)
        }
    };
    Ok(classifier)
}

fn build_config(
    common: CommonArgs,
    tts: Option<TtsConfig>,
    env: &impl Env,
) -> anyhow::Result<AppConfig> {
    let voice = VoiceName::new(resolve_string_with_default(
        common.voice,
        ENV_EMPATHY_VOICE,
        env,
        VoiceName::default().as_str(),
    ))?;

    let max_attempts = common.max_attempts;
    let classifier = ClassifierConfig {
        backend: common.classifier.into(),
        model: common.model,
        base_url: common.hf_base_url,
        api_token: resolve_api_key(common.hf_token, ENV_HF_API_TOKEN, env)?,
    };

    Ok(AppConfig {
        voice,
        classifier,
        tts: tts.unwrap_or_default(),
        output_path: None,
        max_attempts,
    })
}

fn read_text(arg: Option<String>) -> anyhow::Result<String> {
    let text = match arg {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read text from stdin")?;
            buf
        }
    };
    if text.trim().is_empty() {
        anyhow::bail!("no text given (use --text or pipe text on stdin)");
    }
    Ok(text)
}

fn print_report(report: &SynthesisReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
