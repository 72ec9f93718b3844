use axum::{
    extract::multipart::MultipartError,
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::EngagementMetrics;
use crate::extract::{ExtractError, ExtractionResult, SourceKind, NO_TEXT_WARNING};

#[derive(Debug, Deserialize)]
pub struct ApiTextRequest {
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

impl ApiTextRequest {
    /// The trimmed text, or `None` when it is missing, not a string, or blank.
    pub fn into_text(self) -> Option<String> {
        let text = match self.text? {
            serde_json::Value::String(text) => text,
            _ => return None,
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// `{}` on the wire.
#[derive(Debug, Serialize)]
pub struct EmptyMetrics {}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiMetrics {
    Full(Box<EngagementMetrics>),
    Empty(EmptyMetrics),
}

#[derive(Debug, Serialize)]
pub struct ApiAnalysisResponse {
    pub source: String,
    pub extracted_text: String,
    pub metrics: ApiMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ApiAnalysisResponse {
    pub fn analyzed(source: SourceKind, text: String, metrics: EngagementMetrics) -> Self {
        Self {
            source: source.label().to_string(),
            extracted_text: text,
            metrics: ApiMetrics::Full(Box::new(metrics)),
            warning: None,
        }
    }

    pub fn no_text(extraction: ExtractionResult) -> Self {
        Self {
            source: extraction.source_kind.label().to_string(),
            extracted_text: String::new(),
            metrics: ApiMetrics::Empty(EmptyMetrics {}),
            warning: extraction
                .warning
                .or_else(|| Some(NO_TEXT_WARNING.to_string())),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NoText,
    NoFilePart,
    NoSelectedFile,
    UnsupportedFileType,
    /// The request body could not be read, e.g. a truncated multipart stream
    /// or a body over the upload limit.
    BadBody { status: StatusCode, message: String },
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NoText | ApiError::NoFilePart | ApiError::NoSelectedFile => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UnsupportedFileType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::BadBody { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::NoText => "No text provided".to_string(),
            ApiError::NoFilePart => "No file part named 'file'".to_string(),
            ApiError::NoSelectedFile => "No selected file".to_string(),
            ApiError::UnsupportedFileType => "Unsupported file type".to_string(),
            ApiError::BadBody { message, .. } | ApiError::Internal(message) => message.clone(),
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadBody {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        ApiError::BadBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message() }));
        (self.status(), body).into_response()
    }
}
