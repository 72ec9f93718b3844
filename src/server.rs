use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{any::Any, net::SocketAddr, sync::Arc};
use tokio::sync::Semaphore;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
};
use tracing::{error, info, warn};

use crate::analysis::Analyzer;
use crate::api::{ApiAnalysisResponse, ApiError, ApiTextRequest};
use crate::config::ServiceConfig;
use crate::extract::{ExtractError, Extractor, SourceKind};
use crate::fingerprint;

#[derive(Clone)]
pub struct AppState {
    analyzer: Analyzer,
    extractor: Extractor,
    jobs: Arc<Semaphore>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, extractor: Extractor, max_concurrent_jobs: usize) -> Self {
        Self {
            analyzer,
            extractor,
            jobs: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
        }
    }
}

struct Upload {
    filename: String,
    kind: SourceKind,
    data: Bytes,
}

/// Routes are served both at the root and under `/api`.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze_handler));

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: ServiceConfig) -> Result<(), String> {
    let extractor = Extractor::from_config(&config.extraction)
        .map_err(|err| format!("failed to initialise extractor: {}", err))?;
    let state = AppState::new(
        Analyzer::with_vader(),
        extractor,
        config.extraction.max_concurrent_jobs,
    );

    let mut app = router(state, config.server.max_upload_bytes);
    if let Some(web_root) = config.server.web_root.as_deref() {
        let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
        let static_service =
            ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));
        app = app.fallback_service(static_service);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;

    info!(
        %addr,
        max_upload_bytes = config.server.max_upload_bytes,
        max_concurrent_jobs = config.extraction.max_concurrent_jobs,
        "Listening"
    );
    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn analyze_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ApiAnalysisResponse>, ApiError> {
    let response = if is_json_request(request.headers()) {
        let body = Bytes::from_request(request, &state).await?;
        analyze_json(&state, &body)?
    } else {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|_| ApiError::NoFilePart)?;
        let upload = read_upload(multipart).await?;
        analyze_upload(&state, upload).await?
    };
    Ok(Json(response))
}

fn analyze_json(state: &AppState, body: &[u8]) -> Result<ApiAnalysisResponse, ApiError> {
    let text = serde_json::from_slice::<ApiTextRequest>(body)
        .ok()
        .and_then(ApiTextRequest::into_text)
        .ok_or(ApiError::NoText)?;

    let metrics = state.analyzer.analyze(&text);
    info!(
        source = SourceKind::RawText.label(),
        fingerprint = %fingerprint(text.as_bytes()),
        words = metrics.word_count,
        "Analysis complete"
    );
    Ok(ApiAnalysisResponse::analyzed(SourceKind::RawText, text, metrics))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        // Parts without a filename are plain form fields, not files.
        let is_file_part = field.name() == Some("file") && field.file_name().is_some();
        if !is_file_part {
            field.bytes().await?;
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();

        if filename.is_empty() {
            return Err(ApiError::NoSelectedFile);
        }
        let kind = SourceKind::from_filename(&filename).ok_or_else(|| {
            warn!(%filename, "Rejected upload with unsupported extension");
            ApiError::UnsupportedFileType
        })?;
        let data = field.bytes().await?;
        return Ok(Upload {
            filename,
            kind,
            data,
        });
    }

    Err(ApiError::NoFilePart)
}

async fn analyze_upload(state: &AppState, upload: Upload) -> Result<ApiAnalysisResponse, ApiError> {
    let permit = state
        .jobs
        .clone()
        .acquire_owned()
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let extractor = state.extractor.clone();
    let analyzer = state.analyzer.clone();
    let Upload {
        filename,
        kind,
        data,
    } = upload;
    let doc_fingerprint = fingerprint(&data);

    let (extraction, metrics) = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let extraction = extractor.extract(&data, kind)?;
        let metrics = if extraction.is_empty() {
            None
        } else {
            Some(analyzer.analyze(&extraction.text))
        };
        Ok::<_, ExtractError>((extraction, metrics))
    })
    .await
    .map_err(|err| ApiError::Internal(format!("extraction worker failed: {}", err)))?
    .map_err(|err| {
        error!(%filename, fingerprint = %doc_fingerprint, %err, "Extraction failed");
        ApiError::from(err)
    })?;

    match metrics {
        Some(metrics) => {
            info!(
                source = kind.label(),
                %filename,
                fingerprint = %doc_fingerprint,
                words = metrics.word_count,
                "Analysis complete"
            );
            Ok(ApiAnalysisResponse::analyzed(kind, extraction.text, metrics))
        }
        None => {
            info!(
                source = kind.label(),
                %filename,
                fingerprint = %doc_fingerprint,
                "No text detected"
            );
            Ok(ApiAnalysisResponse::no_text(extraction))
        }
    }
}

fn is_json_request(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = err.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = err.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "internal server error".to_string()
    };
    error!(%message, "Request handler panicked");
    ApiError::Internal(message).into_response()
}
