//! Best-effort text extraction from uploaded bytes
//!
//! PDF and DOCX handling is a pair of regex scans over the raw bytes, not a
//! parser. Compressed PDF streams and zipped DOCX archives usually yield
//! nothing, in which case a descriptive placeholder is returned instead.
//! Media files always get a metadata placeholder.

use mindloom_shared::truncate_chars;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::supabase::FileUploadRow;

/// Upper bound on text handed to the model by the file processor
pub const STORED_EXTRACTION_CHARS: usize = 5000;

static PDF_STREAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"stream([\s\S]*?)endstream").expect("valid stream regex"));
static PDF_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid literal regex"));
static PDF_SHOW_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)\s*Tj").expect("valid Tj regex"));
static DOCX_PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:p[\s\S]*?</w:p>").expect("valid paragraph regex"));
static DOCX_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<w:t[^>]*>([^<]*)</w:t>").expect("valid run regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Text,
    Pdf,
    Word,
    Image,
    Audio,
    Video,
    Other,
}

fn route(mime_type: &str) -> Route {
    let mime = mime_type.to_lowercase();
    if mime.starts_with("text/") || mime.contains("json") {
        Route::Text
    } else if mime.contains("pdf") {
        Route::Pdf
    } else if mime.contains("word") || mime.contains("document") {
        Route::Word
    } else if mime.contains("image") {
        Route::Image
    } else if mime.contains("audio") {
        Route::Audio
    } else if mime.contains("video") {
        Route::Video
    } else {
        Route::Other
    }
}

/// Size in MiB with two decimals
pub fn format_megabytes(size: u64) -> String {
    format!("{:.2}", size as f64 / 1024.0 / 1024.0)
}

fn unescape_pdf_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(escaped @ ('\\' | '(' | ')')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// String literals inside content streams, or bare `Tj` operands when no
/// stream carries any
pub fn pdf_text(data: &[u8]) -> Option<String> {
    let raw = String::from_utf8_lossy(data);

    let mut pieces: Vec<String> = PDF_STREAM
        .captures_iter(&raw)
        .flat_map(|stream| {
            PDF_LITERAL
                .captures_iter(&stream[1])
                .map(|literal| unescape_pdf_literal(&literal[1]))
                .collect::<Vec<_>>()
        })
        .collect();

    if pieces.is_empty() {
        pieces = PDF_SHOW_TEXT
            .captures_iter(&raw)
            .map(|operand| unescape_pdf_literal(&operand[1]))
            .collect();
    }

    let text = pieces.join(" ").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// `<w:t>` runs concatenated per `<w:p>` paragraph, one paragraph per line
pub fn docx_text(data: &[u8]) -> Option<String> {
    let raw = String::from_utf8_lossy(data);

    let paragraphs: Vec<String> = DOCX_PARAGRAPH
        .find_iter(&raw)
        .map(|paragraph| {
            DOCX_RUN
                .captures_iter(paragraph.as_str())
                .map(|run| run[1].to_string())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect();

    let text = paragraphs.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Text for a freshly uploaded file, shown to the user and stored as preview
pub fn extract_upload(file_name: &str, mime_type: &str, data: &[u8]) -> String {
    let size = format_megabytes(data.len() as u64);

    match route(mime_type) {
        Route::Text => String::from_utf8_lossy(data).into_owned(),
        Route::Pdf => pdf_text(data).unwrap_or_else(|| {
            format!(
                "PDF: {} ({} MB)\nBasic extraction - server processing recommended",
                file_name, size
            )
        }),
        Route::Word => docx_text(data).unwrap_or_else(|| {
            format!(
                "DOCX: {} ({} MB)\nBasic extraction - server processing recommended",
                file_name, size
            )
        }),
        Route::Image => format!(
            "Image: {file_name}\nType: {mime_type}\nSize: {size} MB\n\n\
             This image can be processed for:\n\
             • OCR text extraction\n\
             • Visual content analysis\n\
             • Object detection\n\n\
             Upload to enable AI-powered image analysis."
        ),
        Route::Audio => format!(
            "Audio: {file_name}\nType: {mime_type}\nSize: {size} MB\n\n\
             This audio file can be processed for:\n\
             • Speech-to-text transcription\n\
             • Audio content analysis\n\
             • Language detection\n\n\
             Upload to enable AI-powered audio processing."
        ),
        Route::Video => format!(
            "Video: {file_name}\nType: {mime_type}\nSize: {size} MB\n\n\
             This video file can be processed for:\n\
             • Audio transcription\n\
             • Visual content analysis\n\
             • Scene detection\n\n\
             Upload to enable AI-powered video processing."
        ),
        Route::Other => format!(
            "File: {file_name}\nType: {mime_type}\nSize: {size} MB\n\n\
             This file type requires specialized processing. Supported formats:\n\
             • Documents: PDF, DOCX, TXT\n\
             • Media: MP3, MP4, JPG, PNG\n\
             • Data: JSON, CSV"
        ),
    }
}

/// Text for a stored upload about to be sent to the model
pub fn extract_stored(file: &FileUploadRow, data: &[u8]) -> String {
    let name = &file.file_name;
    let mime_type = &file.file_type;
    let size = format_megabytes(file.file_size);
    let preview = file.content_preview.clone().filter(|p| !p.is_empty());
    let kind = route(mime_type);

    match kind {
        Route::Text => String::from_utf8_lossy(data).into_owned(),
        Route::Pdf => pdf_text(data)
            .map(|text| truncate_chars(&text, STORED_EXTRACTION_CHARS))
            .or(preview)
            .unwrap_or_else(|| {
                format!(
                    "PDF file: {name}\nSize: {size} MB\n\n\
                     Unable to extract text content from this PDF. \
                     This may be an image-based PDF that requires OCR processing."
                )
            }),
        Route::Word => docx_text(data)
            .map(|text| truncate_chars(&text, STORED_EXTRACTION_CHARS))
            .or(preview)
            .unwrap_or_else(|| {
                format!(
                    "Word document: {name}\nSize: {size} MB\n\n\
                     Unable to extract text content from this document."
                )
            }),
        Route::Audio | Route::Video => {
            let media = if kind == Route::Audio {
                "audio"
            } else {
                "video"
            };
            format!(
                "Media file: {name}\nSize: {size} MB\nType: {mime_type}\n\
                 Duration: Unknown (transcription service needed)\n\n\
                 This is a {media} file. To get the actual content, we would need to:\n\
                 1. Use a transcription service like OpenAI Whisper API\n\
                 2. Extract audio track if video\n\
                 3. Convert speech to text\n\n\
                 For demonstration purposes, I'll provide a general analysis based on the file metadata."
            )
        }
        Route::Image => format!(
            "Image file: {name}\nSize: {size} MB\nType: {mime_type}\nDimensions: Unknown\n\n\
             This is an image file. To get actual content analysis, we would need to:\n\
             1. Use a vision AI service (GPT-4 Vision, Google Vision API, etc.)\n\
             2. Perform OCR if the image contains text\n\
             3. Analyze visual elements, objects, and scenes\n\n\
             For demonstration purposes, I'll provide a general description based on the file metadata."
        ),
        Route::Other => format!(
            "File: {name}\nType: {mime_type}\nSize: {size} MB\n\n\
             Content extraction not supported for this file type. Supported types include:\n\
             - Text files (.txt, .md, .json)\n\
             - PDF documents\n\
             - Word documents (.docx)\n\
             - Audio files (.mp3, .wav, .m4a)\n\
             - Video files (.mp4, .avi, .mov)\n\
             - Images (.jpg, .png, .gif, .webp)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stored(name: &str, mime: &str, size: u64, preview: Option<&str>) -> FileUploadRow {
        FileUploadRow {
            id: "file-1".into(),
            user_id: Some("user-1".into()),
            file_name: name.into(),
            file_type: mime.into(),
            file_size: size,
            storage_path: "user-1/1.pdf".into(),
            content_preview: preview.map(str::to_string),
            created_at: None,
        }
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(0), "0.00");
        assert_eq!(format_megabytes(1024 * 1024), "1.00");
        assert_eq!(format_megabytes(1_572_864), "1.50");
    }

    #[test]
    fn test_pdf_stream_literals() {
        let pdf = b"%PDF-1.4\n1 0 obj\nstream\nBT (Hello\\nWorld) Tj (\\(again\\)) Tj ET\nendstream\n";
        // a literal ends at the first `)` even when escaped
        assert_eq!(pdf_text(pdf).as_deref(), Some("Hello\nWorld (again\\"));
    }

    #[test]
    fn test_pdf_unescapes_literals() {
        assert_eq!(unescape_pdf_literal(r"a\tb\\c\(d\)"), "a\tb\\c(d)");
        assert_eq!(unescape_pdf_literal(r"keep\x"), r"keep\x");
    }

    #[test]
    fn test_pdf_falls_back_to_show_text_operators() {
        let pdf = b"%PDF-1.4 (Loose text) Tj";
        assert_eq!(pdf_text(pdf).as_deref(), Some("Loose text"));
        assert!(pdf_text(b"%PDF-1.4 binary only").is_none());
    }

    #[test]
    fn test_docx_paragraphs() {
        let xml = br#"<w:document><w:body>
            <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t xml:space="preserve">World</w:t></w:r></w:p>
            <w:p><w:r><w:t>Second line</w:t></w:r></w:p>
        </w:body></w:document>"#;
        assert_eq!(docx_text(xml).as_deref(), Some("Hello World\nSecond line"));
        assert!(docx_text(b"PK\x03\x04 compressed").is_none());
    }

    #[test]
    fn test_extract_upload_by_type() {
        assert_eq!(extract_upload("a.txt", "text/plain", b"plain body"), "plain body");
        assert_eq!(extract_upload("a.csv", "text/csv", b"a,b"), "a,b");
        assert_eq!(
            extract_upload("scan.pdf", "application/pdf", &[0u8; 1024 * 1024]),
            "PDF: scan.pdf (1.00 MB)\nBasic extraction - server processing recommended"
        );

        let image = extract_upload("cat.png", "image/png", &[1u8; 10]);
        assert!(image.starts_with("Image: cat.png\nType: image/png\nSize: 0.00 MB\n\n"));
        assert!(image.ends_with("Upload to enable AI-powered image analysis."));

        let audio = extract_upload("talk.mp3", "audio/mpeg", &[1u8; 10]);
        assert!(audio.contains("• Speech-to-text transcription"));

        let other = extract_upload("data.bin", "application/octet-stream", &[1u8; 10]);
        assert!(other.ends_with("• Data: JSON, CSV"));
    }

    #[test]
    fn test_extract_stored_caps_and_falls_back() {
        let long = format!("stream ({}) endstream", "x".repeat(6000));
        let text = extract_stored(
            &stored("big.pdf", "application/pdf", 6000, None),
            long.as_bytes(),
        );
        assert_eq!(text.chars().count(), STORED_EXTRACTION_CHARS);

        let preview = extract_stored(
            &stored("scan.pdf", "application/pdf", 10, Some("cached preview")),
            b"%PDF-1.4",
        );
        assert_eq!(preview, "cached preview");

        let placeholder = extract_stored(&stored("scan.pdf", "application/pdf", 10, None), b"%PDF");
        assert!(placeholder.starts_with("PDF file: scan.pdf\nSize: 0.00 MB\n\nUnable to extract"));
    }

    #[test]
    fn test_extract_stored_media() {
        let video = extract_stored(&stored("clip.mp4", "video/mp4", 0, None), b"");
        assert!(video.starts_with("Media file: clip.mp4\nSize: 0.00 MB\nType: video/mp4\n"));
        assert!(video.contains("This is a video file."));

        let json = extract_stored(&stored("a.json", "application/json", 2, None), b"{}");
        assert_eq!(json, "{}");
    }
}
