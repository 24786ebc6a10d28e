use serde::{Deserialize, Serialize};

use super::content_lines;
use mindloom_shared::truncate_chars;

const MAX_QUESTIONS: usize = 3;
const QUESTION_EXCERPT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Heading,
    Keypoint,
    Definition,
    Example,
    Question,
}

impl NoteType {
    pub fn is_checkable(&self) -> bool {
        matches!(self, NoteType::Keypoint | NoteType::Question)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyNote {
    pub id: String,
    #[serde(rename = "type")]
    pub note_type: NoteType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyNotes {
    pub title: String,
    pub notes: Vec<StudyNote>,
}

impl StudyNotes {
    /// Flip completion on a checkable note; returns false for unknown ids
    pub fn toggle(&mut self, id: &str) -> bool {
        match self
            .notes
            .iter_mut()
            .find(|note| note.id == id && note.note_type.is_checkable())
        {
            Some(note) => {
                note.completed = Some(!note.completed.unwrap_or(false));
                true
            }
            None => false,
        }
    }

    /// Percentage of checkable notes marked completed
    pub fn progress(&self) -> f64 {
        let checkable = self
            .notes
            .iter()
            .filter(|note| note.note_type.is_checkable())
            .count();
        if checkable == 0 {
            return 0.0;
        }
        let completed = self
            .notes
            .iter()
            .filter(|note| note.completed == Some(true))
            .count();
        completed as f64 / checkable as f64 * 100.0
    }
}

fn classify(line: &str) -> Option<(NoteType, String)> {
    let length = line.chars().count();

    if line.starts_with("##") || line.starts_with("**") {
        let heading: String = line.chars().filter(|c| !matches!(c, '#' | '*')).collect();
        Some((NoteType::Heading, heading.trim().to_string()))
    } else if line.contains(':') && length < 100 {
        Some((NoteType::Definition, line.to_string()))
    } else if let Some(rest) = line.strip_prefix('-').or_else(|| line.strip_prefix('•')) {
        Some((NoteType::Keypoint, rest.trim_start().to_string()))
    } else if length > 20 && length < 200 {
        Some((NoteType::Example, line.to_string()))
    } else {
        None
    }
}

pub fn generate(text: &str, title: &str) -> StudyNotes {
    let mut notes = vec![StudyNote {
        id: "note-0".to_string(),
        note_type: NoteType::Heading,
        content: title.to_string(),
        completed: None,
    }];

    for line in content_lines(text) {
        if let Some((note_type, content)) = classify(line) {
            let completed = (note_type == NoteType::Keypoint).then_some(false);
            notes.push(StudyNote {
                id: format!("note-{}", notes.len()),
                note_type,
                content,
                completed,
            });
        }
    }

    let questions: Vec<String> = notes
        .iter()
        .filter(|note| note.note_type == NoteType::Keypoint)
        .take(MAX_QUESTIONS)
        .map(|point| {
            format!(
                "What is the significance of: {}...?",
                truncate_chars(&point.content, QUESTION_EXCERPT_CHARS)
            )
        })
        .collect();

    for content in questions {
        notes.push(StudyNote {
            id: format!("note-{}", notes.len()),
            note_type: NoteType::Question,
            content,
            completed: Some(false),
        });
    }

    StudyNotes {
        title: title.to_string(),
        notes,
    }
}
