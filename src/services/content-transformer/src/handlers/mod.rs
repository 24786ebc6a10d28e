//! HTTP handlers
//!
//! `edge` speaks the edge-function contracts; the rest are the service's own
//! JSON endpoints.

pub mod analysis;
pub mod edge;
pub mod files;
pub mod history;
pub mod system;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::export::ExportDocument;

fn content_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename=\"{}\"",
        file_name.replace(['"', '\\'], "_")
    )
}

impl IntoResponse for ExportDocument {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, self.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    content_disposition(&self.file_name),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_quotes_name() {
        assert_eq!(
            content_disposition("My_\"Doc\"_mindmap.svg"),
            "attachment; filename=\"My__Doc__mindmap.svg\""
        );
    }

    #[test]
    fn test_export_document_headers() {
        let response = ExportDocument {
            file_name: "Lesson_study_notes.md".into(),
            content_type: "text/markdown",
            body: "# Lesson\n".into(),
        }
        .into_response();

        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/markdown");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Lesson_study_notes.md\""
        );
    }
}
