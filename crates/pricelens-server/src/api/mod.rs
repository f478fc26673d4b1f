use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricelens_compare::{ComparisonEngine, ComparisonReport, CompareError};
use pricelens_scraper::ExtractError;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ComparisonEngine>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "unsupported_platform" | "invalid_url" | "bad_request" => StatusCode::BAD_REQUEST,
            "product_unavailable" => StatusCode::NOT_FOUND,
            "bot_detection" | "page_structure_changed" | "extraction_incomplete"
            | "navigation_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a fatal comparison failure onto a typed API error so callers can
/// tell a bad link from a bot wall from a stale selector table.
fn map_compare_error(request_id: String, error: &CompareError) -> ApiError {
    tracing::warn!(error = %error, "comparison failed");
    match error {
        CompareError::UnsupportedPlatform { .. } => ApiError::new(
            request_id,
            "unsupported_platform",
            "the link must point to a product on Amazon, Flipkart, or Myntra",
        ),
        CompareError::SourceExtraction(extract) => match extract {
            ExtractError::InvalidUrl { reason, .. } => {
                ApiError::new(request_id, "invalid_url", reason.clone())
            }
            ExtractError::BotDetection { platform } => ApiError::new(
                request_id,
                "bot_detection",
                format!(
                    "{} blocked the request with a bot challenge; try again later",
                    platform.retailer_name()
                ),
            ),
            ExtractError::ProductUnavailable { platform } => ApiError::new(
                request_id,
                "product_unavailable",
                format!("the product is unavailable on {}", platform.retailer_name()),
            ),
            ExtractError::PageStructureChanged { platform, context } => ApiError::new(
                request_id,
                "page_structure_changed",
                format!(
                    "{} changed its page layout ({context})",
                    platform.retailer_name()
                ),
            ),
            ExtractError::ExtractionIncomplete { platform } => ApiError::new(
                request_id,
                "extraction_incomplete",
                format!(
                    "could not read enough product data from {}",
                    platform.retailer_name()
                ),
            ),
            ExtractError::Session(session) => ApiError::new(
                request_id,
                "navigation_failed",
                format!("could not load the product page: {session}"),
            ),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
}

async fn health(Extension(RequestId(request_id)): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(request_id),
    })
}

async fn compare(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Json(body): Json<CompareRequest>,
) -> Result<Json<ApiResponse<ComparisonReport>>, ApiError> {
    let url = body.url.trim();
    if url.is_empty() {
        return Err(ApiError::new(
            request_id,
            "bad_request",
            "url must not be empty",
        ));
    }

    let report = state
        .engine
        .compare(url)
        .await
        .map_err(|err| map_compare_error(request_id.clone(), &err))?;
    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(request_id),
    }))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/compare", post(compare))
        .layer(axum::middleware::from_fn(request_id))
        .layer(build_cors())
        .with_state(state)
}

// -------------------------------------------------------------------------
// tests
// -------------------------------------------------------------------------
