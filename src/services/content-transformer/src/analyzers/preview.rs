//! Quick previews rendered without any model call

use serde::Serialize;

use super::sentences;

const SITE_URL: &str = "https://mindloom-ai.netlify.app/";
const MIN_SENTENCE_CHARS: usize = 20;
const SUMMARY_POINTS: usize = 6;
const LEGAL_CLAUSES: usize = 4;

const LEGAL_TERMS: [&str; 12] = [
    "shall",
    "must",
    "may",
    "liable",
    "breach",
    "contract",
    "agreement",
    "terms",
    "conditions",
    "warranty",
    "indemnify",
    "jurisdiction",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickSummary {
    pub key_points: Vec<String>,
    pub word_count: usize,
    pub reading_time: usize,
    pub complexity: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalPreview {
    pub found_terms: Vec<&'static str>,
    pub key_clauses: Vec<String>,
    pub density: &'static str,
    pub readability: &'static str,
    pub recommendation: &'static str,
    pub text: String,
}

fn substantial_sentences(text: &str) -> Vec<&str> {
    sentences(text)
        .into_iter()
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect()
}

/// Count of single-space separated pieces, empty ones included
fn rough_word_count(text: &str) -> usize {
    text.split(' ').count()
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn quick_summary(text: &str, title: &str) -> QuickSummary {
    let key_points: Vec<String> = substantial_sentences(text)
        .into_iter()
        .take(SUMMARY_POINTS)
        .map(str::to_string)
        .collect();
    let word_count = rough_word_count(text);
    let reading_time = word_count.div_ceil(200);
    let complexity = if word_count > 1000 {
        "High"
    } else if word_count > 500 {
        "Medium"
    } else {
        "Low"
    };

    let text = format!(
        "📄 SMART SUMMARY: {title}

🔑 KEY POINTS:
{points}

📊 CONTENT STATS:
• Word Count: ~{word_count} words
• Reading Time: ~{reading_time} minutes
• Complexity: {complexity}

💡 This is a basic preview. The full MindLoom AI website offers:
• Advanced AI analysis with GPT/Gemini
• Interactive mind maps
• Study notes generation
• Multi-language support
• File upload processing
• And much more!

🚀 Get full access: {SITE_URL}",
        points = numbered(&key_points),
    );

    QuickSummary {
        key_points,
        word_count,
        reading_time,
        complexity,
        text,
    }
}

pub fn legal_preview(text: &str, title: &str) -> LegalPreview {
    let lowered = text.to_lowercase();
    let found_terms: Vec<&'static str> = LEGAL_TERMS
        .iter()
        .copied()
        .filter(|term| lowered.contains(term))
        .collect();

    let key_clauses: Vec<String> = substantial_sentences(text)
        .into_iter()
        .filter(|sentence| {
            let lowered = sentence.to_lowercase();
            LEGAL_TERMS.iter().any(|term| lowered.contains(term))
        })
        .take(LEGAL_CLAUSES)
        .map(str::to_string)
        .collect();

    let density = match found_terms.len() {
        n if n > 5 => "High",
        n if n > 2 => "Medium",
        _ => "Low",
    };
    let readability = if rough_word_count(text) > 1000 {
        "Complex"
    } else {
        "Moderate"
    };
    let recommendation = if found_terms.len() > 3 {
        "Consider professional legal review"
    } else {
        "Generally accessible"
    };

    let terms_block = if found_terms.is_empty() {
        "• No common legal terms detected".to_string()
    } else {
        found_terms
            .iter()
            .map(|term| format!("• {}", term.to_uppercase()))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let clauses_block = if key_clauses.is_empty() {
        "No specific legal clauses identified in this content.".to_string()
    } else {
        numbered(&key_clauses)
    };

    let text = format!(
        "⚖️ LEGAL DEMYSTIFICATION: {title}

🔍 LEGAL TERMS DETECTED:
{terms_block}

📋 KEY LEGAL CLAUSES:
{clauses_block}

⚠️ COMPLEXITY ASSESSMENT:
• Legal Language Density: {density}
• Readability: {readability}
• Recommendation: {recommendation}

💡 This is a basic preview. The full MindLoom AI offers:
• Professional legal document analysis
• Risk assessment and recommendations
• Plain English translations
• Clause-by-clause breakdowns
• Legal term definitions
• And comprehensive legal insights!

🚀 Get professional legal analysis: {SITE_URL}"
    );

    LegalPreview {
        found_terms,
        key_clauses,
        density,
        readability,
        recommendation,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quick_summary_takes_long_sentences() {
        let text = "Short one. This sentence is definitely long enough to count! Tiny? \
                    Another sentence that clears the twenty character bar.";
        let summary = quick_summary(text, "Doc");
        assert_eq!(
            summary.key_points,
            vec![
                "This sentence is definitely long enough to count",
                "Another sentence that clears the twenty character bar",
            ]
        );
        assert_eq!(summary.complexity, "Low");
        assert_eq!(summary.reading_time, 1);
        assert!(summary.text.starts_with("📄 SMART SUMMARY: Doc\n\n🔑 KEY POINTS:\n1. This sentence"));
        assert!(summary.text.contains("\n2. Another sentence"));
    }

    #[test]
    fn test_quick_summary_complexity_by_word_count() {
        assert_eq!(quick_summary(&"word ".repeat(600), "T").complexity, "Medium");
        assert_eq!(quick_summary(&"word ".repeat(1200), "T").complexity, "High");
    }

    #[test]
    fn test_legal_preview() {
        let text = "The parties shall comply with this agreement. \
                    Any breach of contract makes the vendor liable under these terms.";
        let preview = legal_preview(text, "NDA");
        assert_eq!(
            preview.found_terms,
            vec!["shall", "liable", "breach", "contract", "agreement", "terms"]
        );
        assert_eq!(preview.density, "High");
        assert_eq!(preview.recommendation, "Consider professional legal review");
        assert_eq!(preview.key_clauses.len(), 2);
        assert!(preview.text.contains("• SHALL\n• LIABLE"));
    }

    #[test]
    fn test_legal_preview_without_terms() {
        let preview = legal_preview("Just a friendly note about lunch plans today.", "Note");
        assert!(preview.found_terms.is_empty());
        assert_eq!(preview.density, "Low");
        assert_eq!(preview.recommendation, "Generally accessible");
        assert!(preview.text.contains("• No common legal terms detected"));
        assert!(preview.text.contains("No specific legal clauses identified in this content."));
    }
}
