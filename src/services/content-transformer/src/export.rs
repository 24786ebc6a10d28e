//! Downloadable renderings of analyzer output

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzers::legal::LegalAnalysis;
use crate::analyzers::mindmap::MindMap;
use crate::analyzers::study_notes::{NoteType, StudyNotes};
use crate::translation::Translation;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const SVG_LABEL_CHARS: usize = 15;
const NODE_WIDTH: f64 = 120.0;
const NODE_HEIGHT: f64 = 40.0;

const CENTRAL_FILL: &str = "#7c3aed";
const CENTRAL_TEXT: &str = "#ffffff";
const BRANCH_FILL: &str = "#fde047";
const BRANCH_TEXT: &str = "#111827";
const OUTLINE: &str = "#111827";

/// A rendered file ready to be sent as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

/// `<title>_<suffix>` with whitespace runs in the title replaced by `_`
pub fn export_file_name(title: &str, suffix: &str) -> String {
    format!("{}_{}", WHITESPACE.replace_all(title, "_"), suffix)
}

pub fn notes_markdown(notes: &StudyNotes) -> String {
    notes
        .notes
        .iter()
        .map(|note| match note.note_type {
            NoteType::Heading => format!("# {}\n", note.content),
            NoteType::Keypoint => format!("- {}\n", note.content),
            NoteType::Definition => format!("**{}**\n", note.content),
            NoteType::Example => format!("> {}\n", note.content),
            NoteType::Question => format!("Q: {}\n", note.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_notes(notes: &StudyNotes) -> ExportDocument {
    ExportDocument {
        file_name: export_file_name(&notes.title, "study_notes.md"),
        content_type: "text/markdown",
        body: notes_markdown(notes),
    }
}

pub fn legal_markdown(title: &str, analysis: &LegalAnalysis) -> String {
    let mut out = format!("# Legal Analysis: {}\n\n", title);
    for section in &analysis.sections {
        out.push_str(&format!(
            "## {} {} ({})\n**Content:** {}\n**Explanation:** {}\n\n",
            section.section_type.icon(),
            section.section_type.as_str().to_uppercase(),
            section.severity.as_str().to_uppercase(),
            section.content,
            section.explanation,
        ));
    }
    out
}

pub fn export_legal(title: &str, analysis: &LegalAnalysis) -> ExportDocument {
    ExportDocument {
        file_name: export_file_name(title, "legal_analysis.md"),
        content_type: "text/markdown",
        body: legal_markdown(title, analysis),
    }
}

fn xml_escape(text: &str) -> String {
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

fn svg_label(text: &str) -> String {
    if text.chars().count() > SVG_LABEL_CHARS {
        format!("{}...", text.chars().take(SVG_LABEL_CHARS).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Standalone 800x600 SVG: connectors first, then one labelled box per node
pub fn mindmap_svg(map: &MindMap) -> String {
    let mut svg = String::from(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="800" height="600" viewBox="0 0 800 600">"#,
    );
    svg.push('\n');

    for node in &map.nodes {
        for child_id in &node.children {
            if let Some(child) = map.nodes.iter().find(|n| &n.id == child_id) {
                svg.push_str(&format!(
                    "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"3\"/>\n",
                    node.x, node.y, child.x, child.y, CENTRAL_FILL
                ));
            }
        }
    }

    for node in &map.nodes {
        let (fill, text_fill) = if node.level == 0 {
            (CENTRAL_FILL, CENTRAL_TEXT)
        } else {
            (BRANCH_FILL, BRANCH_TEXT)
        };
        svg.push_str(&format!(
            "  <g id=\"{id}\">\n    <rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w}\" height=\"{h}\" rx=\"4\" fill=\"{fill}\" stroke=\"{OUTLINE}\" stroke-width=\"2\"/>\n    <text x=\"{cx:.2}\" y=\"{ty:.2}\" text-anchor=\"middle\" font-size=\"12\" font-weight=\"bold\" fill=\"{text_fill}\">{label}</text>\n  </g>\n",
            id = xml_escape(&node.id),
            x = node.x - NODE_WIDTH / 2.0,
            y = node.y - NODE_HEIGHT / 2.0,
            w = NODE_WIDTH,
            h = NODE_HEIGHT,
            cx = node.x,
            ty = node.y + 5.0,
            label = xml_escape(&svg_label(&node.text)),
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn export_mindmap(map: &MindMap) -> ExportDocument {
    ExportDocument {
        file_name: export_file_name(&map.title, "mindmap.svg"),
        content_type: "image/svg+xml",
        body: mindmap_svg(map),
    }
}

pub fn export_translation(title: &str, translation: &Translation) -> ExportDocument {
    ExportDocument {
        file_name: export_file_name(
            title,
            &format!("translated_{}.txt", translation.target_language),
        ),
        content_type: "text/plain",
        body: translation.translated_content.clone(),
    }
}
