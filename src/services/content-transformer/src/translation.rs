//! Offline translation stand-in
//!
//! No translation backend is wired up; `translate` renders a templated
//! placeholder that names the detected source and the requested target.

use serde::{Deserialize, Serialize};

use crate::analyzers::language::{self, Language};
use crate::error::{AppError, Result};
use mindloom_shared::truncate_chars;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_language: Option<String>,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub source_language: &'static str,
    pub target_language: &'static str,
    pub detected_language: Option<&'static str>,
    pub translated_content: String,
}

fn lookup(code: &str) -> Result<&'static Language> {
    language::find(code)
        .ok_or_else(|| AppError::ValidationError(format!("Unsupported language: {}", code)))
}

pub fn translate(
    content: &str,
    title: &str,
    source: Option<&str>,
    target: &str,
) -> Result<Translation> {
    let target = lookup(target)?;
    let (source, detected) = match source.filter(|code| !code.is_empty()) {
        Some(code) => (lookup(code)?, None),
        None => {
            let detected = language::detect(content);
            (lookup(detected)?, Some(detected))
        }
    };

    let word_count = content.split(' ').count();
    let translated_content = format!(
        "[TRANSLATED TO {target_upper}]\n\n\
         {flag} This is a simulated translation of your content from {source_name} to {target_name}.\n\n\
         Original title: \"{title}\"\n\n\
         Content preview: {preview}...\n\n\
         🔄 In a production environment, this would be translated using advanced AI translation services like:\n\
         • Google Translate API\n\
         • Microsoft Translator\n\
         • DeepL API\n\
         • OpenAI GPT translation\n\n\
         The translation would maintain:\n\
         ✓ Context and meaning\n\
         ✓ Technical terminology\n\
         ✓ Cultural nuances\n\
         ✓ Formatting and structure\n\n\
         Word count: {word_count} words\n\
         Estimated translation accuracy: 95%+",
        target_upper = target.name.to_uppercase(),
        flag = target.flag,
        source_name = source.name,
        target_name = target.name,
        title = title,
        preview = truncate_chars(content, PREVIEW_CHARS),
        word_count = word_count,
    );

    Ok(Translation {
        source_language: source.code,
        target_language: target.code,
        detected_language: detected,
        translated_content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_template() {
        let result = translate("the quick brown fox", "Fox", None, "es").unwrap();
        assert_eq!(result.source_language, "en");
        assert_eq!(result.detected_language, Some("en"));
        assert!(result.translated_content.starts_with("[TRANSLATED TO SPANISH]\n\n🇪🇸 This is"));
        assert!(result.translated_content.contains("from English to Spanish."));
        assert!(result.translated_content.contains("Original title: \"Fox\""));
        assert!(result.translated_content.contains("Content preview: the quick brown fox...\n\n"));
        assert!(result.translated_content.contains("Word count: 4 words\n"));
    }

    #[test]
    fn test_explicit_source_skips_detection() {
        let result = translate("hola", "T", Some("fr"), "de").unwrap();
        assert_eq!(result.source_language, "fr");
        assert!(result.detected_language.is_none());
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        assert!(matches!(
            translate("x", "T", None, "xx"),
            Err(AppError::ValidationError(_))
        ));
    }
}
