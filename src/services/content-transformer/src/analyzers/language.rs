use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub flag: &'static str,
}

pub const SUPPORTED_LANGUAGES: [Language; 20] = [
    Language { code: "en", name: "English", flag: "🇺🇸" },
    Language { code: "es", name: "Spanish", flag: "🇪🇸" },
    Language { code: "fr", name: "French", flag: "🇫🇷" },
    Language { code: "de", name: "German", flag: "🇩🇪" },
    Language { code: "it", name: "Italian", flag: "🇮🇹" },
    Language { code: "pt", name: "Portuguese", flag: "🇵🇹" },
    Language { code: "ru", name: "Russian", flag: "🇷🇺" },
    Language { code: "ja", name: "Japanese", flag: "🇯🇵" },
    Language { code: "ko", name: "Korean", flag: "🇰🇷" },
    Language { code: "zh", name: "Chinese", flag: "🇨🇳" },
    Language { code: "ar", name: "Arabic", flag: "🇸🇦" },
    Language { code: "hi", name: "Hindi", flag: "🇮🇳" },
    Language { code: "nl", name: "Dutch", flag: "🇳🇱" },
    Language { code: "sv", name: "Swedish", flag: "🇸🇪" },
    Language { code: "no", name: "Norwegian", flag: "🇳🇴" },
    Language { code: "da", name: "Danish", flag: "🇩🇰" },
    Language { code: "fi", name: "Finnish", flag: "🇫🇮" },
    Language { code: "pl", name: "Polish", flag: "🇵🇱" },
    Language { code: "tr", name: "Turkish", flag: "🇹🇷" },
    Language { code: "th", name: "Thai", flag: "🇹🇭" },
];

/// Common-word samples per detectable language, in tie-break order
const SAMPLES: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "is", "in", "to", "of", "a", "that", "it", "with"]),
    ("es", &["el", "la", "de", "que", "y", "en", "un", "es", "se", "no"]),
    ("fr", &["le", "de", "et", "à", "un", "il", "être", "en", "avoir"]),
    ("de", &["der", "die", "und", "in", "den", "von", "zu", "das", "mit", "sich"]),
    ("it", &["il", "di", "che", "e", "la", "per", "in", "un", "è", "con"]),
    ("pt", &["o", "de", "que", "e", "do", "da", "em", "um", "para", "é"]),
    ("ru", &["в", "и", "не", "на", "я", "быть", "он", "с", "что", "а"]),
    ("zh", &["的", "一", "是", "在", "不", "了", "有", "和", "人", "这"]),
    ("ja", &["の", "に", "は", "を", "た", "が", "で", "て", "と", "し"]),
    ("ar", &["في", "من", "إلى", "على", "هذا", "هذه", "التي", "كان", "لم"]),
];

pub const DEFAULT_LANGUAGE: &str = "en";

pub fn find(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES.iter().find(|language| language.code == code)
}

/// Per-language count of space-separated tokens containing a sample word
pub fn scores(text: &str) -> Vec<(&'static str, usize)> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split(' ').collect();

    SAMPLES
        .iter()
        .map(|(code, sample)| {
            let matches = sample
                .iter()
                .map(|word| tokens.iter().filter(|token| token.contains(word)).count())
                .sum();
            (*code, matches)
        })
        .collect()
}

/// Language with the strictly highest score; `en` when nothing matches
pub fn detect(text: &str) -> &'static str {
    let mut best = (DEFAULT_LANGUAGE, 0);
    for (code, matches) in scores(text) {
        if matches > best.1 {
            best = (code, matches);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_common_languages() {
        assert_eq!(detect("The cat is on the mat with a hat"), "en");
        assert_eq!(detect("Как дела я не знаю что это"), "ru");
        assert_eq!(detect("这是我的书 在 不 了"), "zh");
        assert_eq!(detect("の に は を"), "ja");
    }

    #[test]
    fn test_empty_defaults_to_english() {
        assert_eq!(detect(""), "en");
        assert_eq!(detect("12345"), "en");
    }

    #[test]
    fn test_supported_language_table() {
        assert_eq!(SUPPORTED_LANGUAGES.len(), 20);
        assert_eq!(find("ko").map(|l| l.name), Some("Korean"));
        assert_eq!(find("th").map(|l| l.flag), Some("🇹🇭"));
        assert!(find("xx").is_none());
    }

    #[test]
    fn test_scores_cover_every_sample() {
        let scores = scores("hola");
        assert_eq!(scores.len(), 10);
        assert_eq!(scores[0].0, "en");
    }
}
