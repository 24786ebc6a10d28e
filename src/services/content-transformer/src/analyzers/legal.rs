use serde::{Deserialize, Serialize};
use std::fmt;

use super::content_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegalSectionType {
    Obligation,
    Right,
    Risk,
    Definition,
    Deadline,
    Clause,
}

impl LegalSectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalSectionType::Obligation => "obligation",
            LegalSectionType::Right => "right",
            LegalSectionType::Risk => "risk",
            LegalSectionType::Definition => "definition",
            LegalSectionType::Deadline => "deadline",
            LegalSectionType::Clause => "clause",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            LegalSectionType::Obligation => "⚖️",
            LegalSectionType::Right => "✅",
            LegalSectionType::Risk => "⚠️",
            LegalSectionType::Definition => "📖",
            LegalSectionType::Deadline => "⏰",
            LegalSectionType::Clause => "📄",
        }
    }
}

impl fmt::Display for LegalSectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalSection {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: LegalSectionType,
    pub content: String,
    pub severity: Severity,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalAnalysis {
    pub sections: Vec<LegalSection>,
    pub high_risk_count: usize,
    pub obligation_count: usize,
}

impl LegalAnalysis {
    pub fn filter(&self, section_type: LegalSectionType) -> Vec<&LegalSection> {
        self.sections
            .iter()
            .filter(|section| section.section_type == section_type)
            .collect()
    }
}

struct Rule {
    section_type: LegalSectionType,
    keywords: &'static [&'static str],
    explanation: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        section_type: LegalSectionType::Obligation,
        keywords: &["shall", "must", "required"],
        explanation: "This creates a binding obligation that must be fulfilled.",
    },
    Rule {
        section_type: LegalSectionType::Right,
        keywords: &["may", "entitled", "right to"],
        explanation: "This grants a right or permission that can be exercised.",
    },
    Rule {
        section_type: LegalSectionType::Risk,
        keywords: &["penalty", "breach", "violation", "liable"],
        explanation: "This identifies potential legal risks or penalties.",
    },
    Rule {
        section_type: LegalSectionType::Definition,
        keywords: &["means", "defined as", "refers to"],
        explanation: "This provides a legal definition of terms used in the document.",
    },
    Rule {
        section_type: LegalSectionType::Deadline,
        keywords: &["days", "date", "deadline", "expire"],
        explanation: "This establishes important time limits or deadlines.",
    },
    Rule {
        section_type: LegalSectionType::Clause,
        keywords: &["clause", "section", "article"],
        explanation: "This is a structural element of the legal document.",
    },
];

fn severity_for(section_type: LegalSectionType, lowered: &str) -> Severity {
    match section_type {
        LegalSectionType::Obligation => {
            if lowered.contains("immediately") || lowered.contains("within") {
                Severity::High
            } else {
                Severity::Medium
            }
        }
        LegalSectionType::Right | LegalSectionType::Definition => Severity::Low,
        LegalSectionType::Risk | LegalSectionType::Deadline => Severity::High,
        LegalSectionType::Clause => Severity::Medium,
    }
}

/// Tags every non-blank line against each rule independently
pub fn analyze(text: &str) -> LegalAnalysis {
    let mut sections = Vec::new();

    for line in content_lines(text) {
        let lowered = line.to_lowercase();
        for rule in RULES {
            if rule.keywords.iter().any(|keyword| lowered.contains(keyword)) {
                sections.push(LegalSection {
                    id: format!("legal-{}", sections.len()),
                    section_type: rule.section_type,
                    content: line.to_string(),
                    severity: severity_for(rule.section_type, &lowered),
                    explanation: rule.explanation.to_string(),
                });
            }
        }
    }

    let high_risk_count = sections
        .iter()
        .filter(|section| section.severity == Severity::High)
        .count();
    let obligation_count = sections
        .iter()
        .filter(|section| section.section_type == LegalSectionType::Obligation)
        .count();

    LegalAnalysis {
        sections,
        high_risk_count,
        obligation_count,
    }
}
