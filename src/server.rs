//! HTTP boundary: the single upload route.
//!
//! Thin wrapper around [`Engine::process`] — multipart extraction, the
//! 400/500 error split, and the attachment response. No pipeline logic
//! lives here.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::caption::Caption;
use crate::pipeline::{suggested_filename, Engine};
use crate::Error;

/// Generous cap for photo uploads; modern phone JPEGs run 10-15 MB.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build the application router around a shared engine.
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/", get(form).post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(engine)
}

async fn form() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn upload(
    State(engine): State<Arc<Engine>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut photo: Option<(String, Vec<u8>)> = None;
    let mut fields: [Option<String>; 7] = Default::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "photo" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            photo = Some((filename, bytes.to_vec()));
        } else if let Some(idx) = field_index(&name) {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields[idx] = Some(value);
        }
    }

    let (filename, bytes) = photo.ok_or(AppError::MissingFile)?;
    if filename.is_empty() {
        return Err(AppError::EmptyFilename);
    }

    tracing::info!(filename = %filename, size = bytes.len(), "processing upload");
    let jpeg = engine.process(&bytes, &Caption::new(fields))?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        suggested_filename(&filename)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/jpeg".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        jpeg,
    )
        .into_response())
}

/// Map a form field name (`text1`..`text7`) to its caption slot.
fn field_index(name: &str) -> Option<usize> {
    let n: usize = name.strip_prefix("text")?.parse().ok()?;
    (1..=7).contains(&n).then(|| n - 1)
}

/// Boundary-level errors mapped onto HTTP status codes.
#[derive(Debug)]
enum AppError {
    MissingFile,
    EmptyFilename,
    BadRequest(String),
    Pipeline(Error),
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Pipeline(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MissingFile => (StatusCode::BAD_REQUEST, "No file part".to_string()),
            AppError::EmptyFilename => (StatusCode::BAD_REQUEST, "No selected file".to_string()),
            AppError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "malformed upload request");
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::Pipeline(err) => match err {
                Error::TooNarrow { width, min_width } => {
                    tracing::warn!(width, min_width, "upload below minimum width");
                    (StatusCode::BAD_REQUEST, "Error: Image too small".to_string())
                }
                Error::Decode(e) => {
                    tracing::warn!(error = %e, "unrecognized image data");
                    (StatusCode::BAD_REQUEST, "Error: Invalid image file".to_string())
                }
                other => {
                    tracing::error!(error = %other, "processing failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {other}"))
                }
            },
        };
        (status, body).into_response()
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>geostamp</title></head>
<body>
  <h1>Upload survey photo</h1>
  <form method="post" enctype="multipart/form-data">
    <p><input type="file" name="photo"></p>
    <p><label>Latitude <input type="text" name="text1"></label></p>
    <p><label>Longitude <input type="text" name="text2"></label></p>
    <p><label>Elevation <input type="text" name="text3"></label></p>
    <p><label>Accuracy <input type="text" name="text4"></label></p>
    <p><label>Time <input type="text" name="text5"></label></p>
    <p><label>Note <input type="text" name="text6"></label></p>
    <p><label>Extra <input type="text" name="text7"></label></p>
    <p><button type="submit">Process</button></p>
  </form>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_index_accepts_text1_through_text7() {
        assert_eq!(field_index("text1"), Some(0));
        assert_eq!(field_index("text7"), Some(6));
    }

    #[test]
    fn field_index_rejects_other_names() {
        assert_eq!(field_index("text0"), None);
        assert_eq!(field_index("text8"), None);
        assert_eq!(field_index("photo"), None);
        assert_eq!(field_index("textx"), None);
    }

    #[test]
    fn error_mapping_matches_status_codes() {
        let cases: [(AppError, StatusCode); 4] = [
            (AppError::MissingFile, StatusCode::BAD_REQUEST),
            (AppError::EmptyFilename, StatusCode::BAD_REQUEST),
            (
                AppError::Pipeline(Error::TooNarrow {
                    width: 799,
                    min_width: 800,
                }),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Pipeline(Error::Io(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
