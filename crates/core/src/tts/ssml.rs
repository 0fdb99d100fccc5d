//! SSML documents for neural voices.
//!
//! ```xml
//! <speak version="1.0" xmlns="http://www.w3.org/2001/10/synthesis"
//!        xmlns:mstts="https://www.w3.org/2001/mstts" xml:lang="en-US">
//!   <voice name="en-US-AriaNeural">
//!     <mstts:express-as style="cheerful">
//!       <prosody rate="+23%" pitch="+44Hz" volume="+5%">Hello!</prosody>
//!     </mstts:express-as>
//!   </voice>
//! </speak>
//! ```
//!
//! The `express-as` wrapper is omitted when there is no style hint.

use crate::voice::SynthesisParameters;

const FALLBACK_LANG: &str = "en-US";

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Locale prefix of a voice name, e.g. `en-US` for `en-US-AriaNeural`.
pub fn voice_locale(voice: &str) -> &str {
    let mut dashes = voice.match_indices('-').map(|(i, _)| i);
    match (dashes.next(), dashes.next()) {
        (Some(_), Some(second)) => &voice[..second],
        _ => FALLBACK_LANG,
    }
}

pub fn render(text: &str, voice: &str, params: &SynthesisParameters) -> String {
    let prosody = format!(
        "<prosody rate=\"{}\" pitch=\"{}\" volume=\"{}\">{}</prosody>",
        params.rate(),
        params.pitch(),
        params.volume(),
        escape_xml(text)
    );

    let body = match params.style {
        Some(style) => format!("<mstts:express-as style=\"{style}\">{prosody}</mstts:express-as>"),
        None => prosody,
    };

    format!(
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" \
         xmlns:mstts=\"https://www.w3.org/2001/mstts\" xml:lang=\"{}\">\
         <voice name=\"{}\">{}</voice></speak>",
        escape_xml(voice_locale(voice)),
        escape_xml(voice),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::CanonicalCategory;

    #[test]
    fn renders_style_and_prosody() {
        let params = SynthesisParameters::scaled(CanonicalCategory::Positive, 0.82);
        let ssml = render("Hello!", "en-US-AriaNeural", &params);
        assert!(ssml.starts_with("<speak version=\"1.0\""));
        assert!(ssml.contains("xml:lang=\"en-US\""));
        assert!(ssml.contains("<voice name=\"en-US-AriaNeural\">"));
        assert!(ssml.contains("<mstts:express-as style=\"cheerful\">"));
        assert!(ssml.contains("<prosody rate=\"+23%\" pitch=\"+44Hz\" volume=\"+5%\">Hello!</prosody>"));
        assert!(ssml.ends_with("</voice></speak>"));
    }

    #[test]
    fn neutral_has_no_express_as() {
        let params = SynthesisParameters::scaled(CanonicalCategory::Neutral, 0.4);
        let ssml = render("Fine.", "en-GB-SoniaNeural", &params);
        assert!(!ssml.contains("express-as"));
        assert!(ssml.contains("xml:lang=\"en-GB\""));
        assert!(ssml.contains("rate=\"+0%\" pitch=\"+0Hz\" volume=\"+0%\""));
    }

    #[test]
    fn text_is_escaped() {
        let params = SynthesisParameters::scaled(CanonicalCategory::Neutral, 0.0);
        let ssml = render("Tom & \"Jerry\" <3", "en-US-AriaNeural", &params);
        assert!(ssml.contains("Tom &amp; &quot;Jerry&quot; &lt;3"));
    }

    #[test]
    fn locale_falls_back_for_odd_names() {
        assert_eq!(voice_locale("de-DE-KatjaNeural"), "de-DE");
        assert_eq!(voice_locale("zh-CN-shaanxi-XiaoniNeural"), "zh-CN");
        assert_eq!(voice_locale("aria"), "en-US");
    }
}
