//! HTTP surface: routes, CORS and error mapping.

use crate::api::{CriticService, ReadmeRequest, RoastRequest};
use crate::error::CriticError;
use axum::{
    extract::{Json, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Request orchestrator
    pub service: CriticService,
}

/// Builds the router with CORS restricted to `allowed_origins`
pub fn create_app(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/analyze-repo", post(analyze_repo))
        .route("/generate-readme", post(generate_readme))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Credentialed CORS for an explicit origin list. Methods and headers are
/// mirrored since wildcards are not allowed together with credentials.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// [`CriticError`] rendered as `{"detail": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub CriticError);

impl From<CriticError> for ApiError {
    fn from(e: CriticError) -> Self {
        Self(e)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error
    pub fn status(&self) -> StatusCode {
        match self.0 {
            CriticError::Validation(_) => StatusCode::BAD_REQUEST,
            CriticError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self.0 {
            CriticError::Validation(msg) => msg.clone(),
            CriticError::NotFound(_) => "Repository not found".to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, ResponseJson(json!({ "detail": detail }))).into_response()
    }
}

async fn index() -> ResponseJson<Value> {
    ResponseJson(json!({
        "service": "codecritic",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Roast GitHub repositories and generate READMEs",
        "endpoints": {
            "health": "/health",
            "roast": "/analyze-repo",
            "readme": "/generate-readme"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> ResponseJson<Value> {
    let generator = state.service.generator();
    ResponseJson(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "api_keys": generator.credential_count(),
        "current_key_index": generator.current_index(),
    }))
}

async fn analyze_repo(
    State(state): State<AppState>,
    Json(request): Json<RoastRequest>,
) -> Result<ResponseJson<Value>, ApiError> {
    info!("Roast requested for {}", request.repo_url);
    let response = state.service.roast(&request).await?;
    Ok(ResponseJson(json!(response)))
}

async fn generate_readme(
    State(state): State<AppState>,
    Json(request): Json<ReadmeRequest>,
) -> Result<ResponseJson<Value>, ApiError> {
    info!("README requested for {}", request.repo_url);
    let response = state.service.readme(&request).await?;
    Ok(ResponseJson(json!(response)))
}
