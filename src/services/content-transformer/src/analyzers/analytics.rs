use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{sentences, words};

const WORDS_PER_MINUTE: usize = 200;
const TOP_TOPICS: usize = 5;

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]").unwrap());

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did", "will", "would",
    "could", "should", "may", "might", "can", "this", "that", "these", "those",
];

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "wonderful", "fantastic", "positive", "success",
    "benefit", "advantage",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "negative", "problem", "issue", "disadvantage",
    "failure", "error",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub reading_time: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub avg_sentence_length: f64,
    pub avg_word_length: f64,
    pub complexity: Complexity,
    pub key_topics: Vec<String>,
    pub sentiment: Sentiment,
    pub readability_score: u32,
    pub readability_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AnalyticsReport {
    fn empty() -> Self {
        Self {
            reading_time: 0,
            word_count: 0,
            sentence_count: 0,
            paragraph_count: 0,
            avg_sentence_length: 0.0,
            avg_word_length: 0.0,
            complexity: Complexity::Easy,
            key_topics: Vec::new(),
            sentiment: Sentiment::Neutral,
            readability_score: 0,
            readability_level: readability_level(0).to_string(),
            message: Some("No content to analyze".to_string()),
        }
    }
}

pub fn analyze(text: &str) -> AnalyticsReport {
    let words = words(text);
    if words.is_empty() {
        return AnalyticsReport::empty();
    }

    let sentence_count = sentences(text).len();
    let paragraph_count = PARAGRAPH_BREAK
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .count();

    let avg_sentence_length = if sentence_count == 0 {
        0.0
    } else {
        words.len() as f64 / sentence_count as f64
    };
    let total_chars: usize = words.iter().map(|w| w.chars().count()).sum();
    let avg_word_length = total_chars as f64 / words.len() as f64;

    let readability_score = readability(avg_sentence_length, avg_word_length);

    AnalyticsReport {
        reading_time: reading_time_minutes(words.len()),
        word_count: words.len(),
        sentence_count,
        paragraph_count,
        avg_sentence_length,
        avg_word_length,
        complexity: complexity(avg_sentence_length, avg_word_length),
        key_topics: key_topics(&words),
        sentiment: sentiment(text),
        readability_score,
        readability_level: readability_level(readability_score).to_string(),
        message: None,
    }
}

pub fn reading_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(WORDS_PER_MINUTE)
}

pub fn complexity(avg_sentence_length: f64, avg_word_length: f64) -> Complexity {
    if avg_sentence_length > 20.0 || avg_word_length > 6.0 {
        Complexity::Hard
    } else if avg_sentence_length > 15.0 || avg_word_length > 5.0 {
        Complexity::Medium
    } else {
        Complexity::Easy
    }
}

/// Most frequent meaningful words; ties keep first-seen order
pub fn key_topics(words: &[&str]) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for word in words {
        let clean = NON_WORD.replace_all(&word.to_lowercase(), "").into_owned();
        if clean.chars().count() <= 3 || STOP_WORDS.contains(&clean.as_str()) {
            continue;
        }
        match index.get(&clean) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(clean.clone(), counts.len());
                counts.push((clean, 1));
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_TOPICS)
        .map(|(word, _)| word)
        .collect()
}

pub fn sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let count = |list: &[&str]| -> usize { list.iter().map(|w| lower.matches(w).count()).sum() };

    let positive = count(POSITIVE_WORDS);
    let negative = count(NEGATIVE_WORDS);

    if positive > negative + 2 {
        Sentiment::Positive
    } else if negative > positive + 2 {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Simplified Flesch reading ease, clamped to 0..=100
pub fn readability(avg_sentence_length: f64, avg_word_length: f64) -> u32 {
    let syllables_per_word = avg_word_length * 0.5;
    let score = 206.835 - 1.015 * avg_sentence_length - 84.6 * syllables_per_word;
    score.clamp(0.0, 100.0).round() as u32
}

pub fn readability_level(score: u32) -> &'static str {
    match score {
        90..=u32::MAX => "Very Easy",
        80..=89 => "Easy",
        70..=79 => "Fairly Easy",
        60..=69 => "Standard",
        50..=59 => "Fairly Difficult",
        30..=49 => "Difficult",
        _ => "Very Difficult",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_yields_zeroed_report() {
        let report = analyze("   \n ");
        assert_eq!(report.word_count, 0);
        assert_eq!(report.reading_time, 0);
        assert_eq!(report.complexity, Complexity::Easy);
        assert!(report.key_topics.is_empty());
        assert!(report.message.is_some());
    }

    #[test]
    fn test_counts() {
        let text = "Rust is fast. Rust is safe!\n\nSecond paragraph here?";
        let report = analyze(text);
        assert_eq!(report.word_count, 9);
        assert_eq!(report.sentence_count, 3);
        assert_eq!(report.paragraph_count, 2);
        assert_eq!(report.reading_time, 1);
        assert_eq!(report.avg_sentence_length, 3.0);
    }

    #[test]
    fn test_key_topics_order() {
        let text = "apple banana apple cherry banana apple dates elder figs grape";
        let topics = key_topics(&words(text));
        assert_eq!(topics, vec!["apple", "banana", "cherry", "dates", "elder"]);
    }

    #[test]
    fn test_key_topics_strip_punctuation_and_stop_words() {
        let topics = key_topics(&words("Those systems, systems! were THESE"));
        assert_eq!(topics, vec!["systems"]);
    }

    #[test]
    fn test_sentiment_thresholds() {
        assert_eq!(sentiment("good great excellent"), Sentiment::Positive);
        assert_eq!(sentiment("good great excellent bad"), Sentiment::Neutral);
        assert_eq!(sentiment("error failure problem awful"), Sentiment::Negative);
        // substring matches count too
        assert_eq!(sentiment("goodness greatness excellently"), Sentiment::Positive);
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(complexity(10.0, 4.0), Complexity::Easy);
        assert_eq!(complexity(16.0, 4.0), Complexity::Medium);
        assert_eq!(complexity(10.0, 5.5), Complexity::Medium);
        assert_eq!(complexity(21.0, 4.0), Complexity::Hard);
        assert_eq!(complexity(10.0, 6.5), Complexity::Hard);
    }

    #[test]
    fn test_readability_levels() {
        assert_eq!(readability(0.0, 0.0), 100);
        assert_eq!(readability(40.0, 8.0), 0);
        assert_eq!(readability_level(95), "Very Easy");
        assert_eq!(readability_level(65), "Standard");
        assert_eq!(readability_level(10), "Very Difficult");
    }

    proptest! {
        #[test]
        fn prop_reading_time_is_ceil_of_words(text in "[a-z ]{0,2000}") {
            let report = analyze(&text);
            prop_assert_eq!(report.reading_time, (report.word_count + 199) / 200);
        }

        #[test]
        fn prop_complexity_is_monotonic(
            s in 0.0f64..40.0, w in 0.0f64..12.0, ds in 0.0f64..10.0, dw in 0.0f64..3.0
        ) {
            prop_assert!(complexity(s, w) <= complexity(s + ds, w + dw));
        }
    }
}
