use crate::config::VoiceName;
use crate::emotion::{
    CanonicalCategory, CanonicalScores, ClassifyError, EmotionClassifier, EmotionProfile,
    MappingError,
};
use crate::tts::{TtsAudio, TtsClient, TtsError, TtsRequest, VoiceId};
use crate::voice::{SynthesisParameters, VoiceProfile};
use serde::Serialize;
use std::path::PathBuf;

const LOG_TARGET: &str = "pipeline";

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("text must not be empty")]
    EmptyText,
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error(transparent)]
    Tts(#[from] TtsError),
}

/// Emotion and voice settings derived from one piece of text.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub text: String,
    pub profile: EmotionProfile,
    pub params: SynthesisParameters,
    pub voice_profile: VoiceProfile,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Synthesis {
    pub analysis: Analysis,
    pub audio: TtsAudio,
}

/// Classifies `text` and maps the result to synthesis parameters.
pub async fn analyze<C>(classifier: &C, voice: &VoiceName, text: &str) -> Result<Analysis, PipelineError>
where
    C: EmotionClassifier + ?Sized,
{
    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::EmptyText);
    }

    let raw_scores = classifier.classify(text.to_owned()).await?;
    let profile = EmotionProfile::from_raw_scores(raw_scores)?;
    let params = SynthesisParameters::from_profile(&profile);
    let voice_profile = VoiceProfile::new(voice.as_str(), &params);

    tracing::info!(
        target: LOG_TARGET,
        emotion = %profile.category,
        intensity = profile.intensity,
        rate = %voice_profile.rate,
        pitch = %voice_profile.pitch,
        volume = %voice_profile.volume,
        "text analyzed"
    );

    Ok(Analysis {
        text: text.to_owned(),
        profile,
        params,
        voice_profile,
    })
}

pub struct Pipeline<C, T> {
    pub classifier: C,
    pub tts: T,
    pub voice: VoiceName,
}

impl<C, T> Pipeline<C, T>
where
    C: EmotionClassifier,
    T: TtsClient,
{
    pub fn new(classifier: C, tts: T, voice: VoiceName) -> Self {
        Self {
            classifier,
            tts,
            voice,
        }
    }

    pub async fn analyze(&self, text: &str) -> Result<Analysis, PipelineError> {
        analyze(&self.classifier, &self.voice, text).await
    }

    pub async fn run(&self, text: &str) -> Result<Synthesis, PipelineError> {
        let analysis = self.analyze(text).await?;
        let request = TtsRequest {
            text: analysis.text.clone(),
            voice: VoiceId(self.voice.as_str().to_owned()),
            params: analysis.params.clone(),
        };

        let audio = self.tts.synthesize(request).await.map_err(|e| {
            tracing::error!(target: LOG_TARGET, error = %e, "synthesis failed");
            e
        })?;

        Ok(Synthesis { analysis, audio })
    }
}

/// JSON summary of one request: the detected emotion, its score
/// breakdown and the voice settings used.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SynthesisReport {
    pub emotion: CanonicalCategory,
    pub intensity: f64,
    pub canonical_scores: CanonicalScores,
    pub voice_profile: VoiceProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
}

impl SynthesisReport {
    pub fn new(analysis: &Analysis, audio_path: Option<PathBuf>) -> Self {
        Self {
            emotion: analysis.profile.category,
            intensity: analysis.profile.intensity,
            canonical_scores: analysis.profile.canonical_scores,
            voice_profile: analysis.voice_profile.clone(),
            audio_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{KeywordEmotionClassifier, RawScores};
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::Mutex;

    struct FixedClassifier(RawScores);

    impl EmotionClassifier for FixedClassifier {
        fn classify(&self, _text: String) -> BoxFuture<'_, Result<RawScores, ClassifyError>> {
            let scores = self.0.clone();
            async move { Ok(scores) }.boxed()
        }
    }

    struct FailingClassifier;

    impl EmotionClassifier for FailingClassifier {
        fn classify(&self, _text: String) -> BoxFuture<'_, Result<RawScores, ClassifyError>> {
            async { Err(ClassifyError::EmptyResponse) }.boxed()
        }
    }

    #[derive(Default)]
    struct RecordingTts {
        requests: Mutex<Vec<TtsRequest>>,
    }

    impl TtsClient for RecordingTts {
        fn synthesize(&self, request: TtsRequest) -> BoxFuture<'_, Result<TtsAudio, TtsError>> {
            async move {
                if let Ok(mut requests) = self.requests.lock() {
                    requests.push(request);
                }
                Ok(TtsAudio {
                    content_type: "audio/mpeg".to_owned(),
                    data: Bytes::from_static(b"ID3"),
                })
            }
            .boxed()
        }
    }

    struct FailingTts;

    impl TtsClient for FailingTts {
        fn synthesize(&self, _request: TtsRequest) -> BoxFuture<'_, Result<TtsAudio, TtsError>> {
            async {
                Err(TtsError::Api {
                    status: 401,
                    body: "unauthorized".into(),
                })
            }
            .boxed()
        }
    }

    fn raw(pairs: &[(&str, f64)]) -> RawScores {
        pairs.iter().map(|(l, s)| ((*l).to_owned(), *s)).collect()
    }

    #[tokio::test]
    async fn run_passes_scaled_parameters_to_tts() {
        let pipeline = Pipeline::new(
            FixedClassifier(raw(&[("joy", 0.82), ("neutral", 0.12), ("sadness", 0.06)])),
            RecordingTts::default(),
            VoiceName::default(),
        );

        let synthesis = pipeline.run("  What a lovely morning  ").await.unwrap();
        assert_eq!(synthesis.audio.data, Bytes::from_static(b"ID3"));
        assert_eq!(synthesis.analysis.voice_profile.rate, "+23%");

        let requests = pipeline.tts.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].text, "What a lovely morning");
        assert_eq!(requests[0].voice.0, "en-US-AriaNeural");
        assert_eq!(requests[0].params.pitch_hz, 44);
    }

    #[tokio::test]
    async fn blank_text_is_rejected_before_classifying() {
        let err = analyze(&FailingClassifier, &VoiceName::default(), "   \n")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyText));
    }

    #[tokio::test]
    async fn classifier_errors_propagate() {
        let err = analyze(&FailingClassifier, &VoiceName::default(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Classify(ClassifyError::EmptyResponse)));
    }

    #[tokio::test]
    async fn unmapped_label_stops_before_tts() {
        let pipeline = Pipeline::new(
            FixedClassifier(raw(&[("joy", 0.6), ("confusion", 0.4)])),
            RecordingTts::default(),
            VoiceName::default(),
        );
        let err = pipeline.run("hmm").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Mapping(MappingError::UnmappedLabel { .. })
        ));
        assert!(pipeline.tts.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tts_errors_propagate() {
        let pipeline = Pipeline::new(KeywordEmotionClassifier::new(), FailingTts, VoiceName::default());
        let err = pipeline.run("I am so happy").await.unwrap_err();
        assert!(matches!(err, PipelineError::Tts(TtsError::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn report_exposes_emotion_intensity_and_scores() {
        let analysis = analyze(
            &FixedClassifier(raw(&[("sadness", 0.70), ("anger", 0.20), ("joy", 0.10)])),
            &VoiceName::default(),
            "everything went wrong",
        )
        .await
        .unwrap();

        let report = SynthesisReport::new(&analysis, Some(PathBuf::from("out.mp3")));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["emotion"], "negative");
        assert!((json["intensity"].as_f64().unwrap() - 0.9).abs() < 1e-9);
        assert!((json["canonical_scores"]["positive"].as_f64().unwrap() - 0.1).abs() < 1e-9);
        assert_eq!(json["voice_profile"]["style"], "sad");
        assert_eq!(json["audio_path"], "out.mp3");

        let without_audio = serde_json::to_value(SynthesisReport::new(&analysis, None)).unwrap();
        assert!(without_audio.get("audio_path").is_none());
    }
}
