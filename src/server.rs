//! HTTP surface: two multipart upload endpoints behind an API-key check.
//!
//! | Route | Success body |
//! |-------|--------------|
//! | `POST /extract-all-tables/` | `{"topics": {five sections}}` |
//! | `POST /extract-topics-covered/` | `{"topics_covered": [rows]}` |
//! | `GET /health` | `{"status": "ok", "version": "..."}` |
//!
//! The upload field is `pdf_file`. Both POST routes require an `X-API-Key`
//! header; the check runs as route middleware, before the multipart body is
//! read. Errors are `{"detail": "..."}` with the status from
//! [`MomExtractError::status_code`]; the internal cause only goes to the log.

use crate::config::ServerConfig;
use crate::error::MomExtractError;
use crate::extractor::MomExtractor;
use crate::output::{AllTablesResponse, ErrorResponse, TopicsCoveredResponse};
use crate::pipeline::upload::{validate_pdf_filename, UploadedDocument};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Multipart field holding the PDF.
pub const UPLOAD_FIELD: &str = "pdf_file";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    extractor: MomExtractor,
    api_key: Arc<str>,
}

/// Error wrapper that renders as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError(pub MomExtractError);

impl From<MomExtractError> for ApiError {
    fn from(e: MomExtractError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(kind = self.0.kind(), "Request failed: {}", self.0);
        } else {
            warn!(kind = self.0.kind(), "Request rejected: {}", self.0);
        }

        let body = ErrorResponse {
            detail: self.0.public_detail(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router.
pub fn build_router(extractor: MomExtractor, config: &ServerConfig) -> Router {
    let state = AppState {
        extractor,
        api_key: Arc::from(config.api_key.as_str()),
    };

    let protected = Router::new()
        .route("/extract-all-tables/", post(extract_all_tables))
        .route("/extract-topics-covered/", post(extract_topics_covered))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject the request unless `X-API-Key` matches the configured secret.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if key_matches(key, &state.api_key) => Ok(next.run(request).await),
        _ => Err(MomExtractError::AuthFailure.into()),
    }
}

/// Constant-time byte comparison; only a length mismatch returns early.
fn key_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Body-limit overruns become 413; anything else is a malformed request.
fn multipart_error(context: &str, e: MultipartError) -> MomExtractError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MomExtractError::UploadTooLarge(e.body_text())
    } else {
        MomExtractError::InvalidRequest(format!("{context}: {}", e.body_text()))
    }
}

/// Pull the `pdf_file` field out of the multipart body.
///
/// The filename is validated before the field's bytes are read, so a
/// non-PDF upload is rejected without buffering it. A body that is not
/// `multipart/form-data` at all is reported the same way as a bad part.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadedDocument, MomExtractError> {
    let mut multipart =
        multipart.map_err(|rejection| MomExtractError::InvalidRequest(rejection.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Multipart error", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        validate_pdf_filename(&filename)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file", e))?;
        info!("Received '{}' ({} bytes)", filename, bytes.len());
        return Ok(UploadedDocument::new(filename, bytes.to_vec()));
    }

    Err(MomExtractError::InvalidRequest(format!(
        "Field '{UPLOAD_FIELD}' is required"
    )))
}

async fn extract_all_tables(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AllTablesResponse>, ApiError> {
    let doc = read_upload(multipart).await?;
    let topics = state.extractor.extract_all_tables(doc).await?;
    Ok(Json(AllTablesResponse { topics }))
}

async fn extract_topics_covered(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TopicsCoveredResponse>, ApiError> {
    let doc = read_upload(multipart).await?;
    let topics_covered = state.extractor.extract_topics_covered(doc).await?;
    Ok(Json(TopicsCoveredResponse { topics_covered }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
