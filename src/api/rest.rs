//! REST API Handlers
//!
//! Implements the `/api/v1/vlans` CRUD endpoints, health and metrics.
//! Every failure leaves as an [`ApiErrorResponse`] with a stable `error`
//! code; domain errors map to status codes by kind only.

use crate::domain::vlan::{FieldError, NewVlan, VlanPatch, VlanRecord};
use crate::error::Error;
use crate::service::VlanService;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Json, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

// =============================================================================
// Response Types
// =============================================================================

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error leaving a handler, rendered as status plus [`ApiErrorResponse`]
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse {
                error: error.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.body.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// 422 carrying a list of `{loc, type, msg}` entries
    fn request_validation(errors: Vec<Value>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "REQUEST_VALIDATION_ERROR",
            "Request validation failed",
        )
        .with_details(json!({ "errors": errors }))
    }

    fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "HTTP method not allowed for this endpoint",
        )
    }
}

fn field_detail(e: &FieldError) -> Value {
    json!({
        "loc": ["body", e.field],
        "type": e.code,
        "msg": e.message,
    })
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match &e {
            Error::Validation(errors) => {
                Self::request_validation(errors.iter().map(field_detail).collect())
            }
            Error::GatewayNotInSubnet { .. } => Self::request_validation(vec![json!({
                "loc": ["body", "gateway"],
                "type": "gateway_not_in_subnet",
                "msg": e.to_string(),
            })]),
            Error::VlanConflict { vlan_id } => {
                Self::new(StatusCode::CONFLICT, "VLAN_CONFLICT", e.to_string())
                    .with_details(json!({ "vlan_id": vlan_id }))
            }
            Error::NotFound { id } => {
                Self::new(StatusCode::NOT_FOUND, "VLAN_NOT_FOUND", e.to_string())
                    .with_details(json!({ "vlan_id": id }))
            }
            _ if e.is_storage() => {
                warn!("Storage failure surfaced to client: {}", e);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_ERROR",
                    "Storage system error occurred",
                )
            }
            _ => {
                error!("Unexpected error: {}", e);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                )
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request payload is too large",
            );
        }
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                "Content-Type must be application/json",
            ),
            JsonRejection::JsonDataError(e) => Self::request_validation(vec![json!({
                "loc": ["body"],
                "type": "invalid_body",
                "msg": e.body_text(),
            })]),
            JsonRejection::JsonSyntaxError(e) => Self::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.body_text(),
            ),
            other => Self::new(other.status(), "VALIDATION_ERROR", other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::request_validation(vec![json!({
            "loc": ["path", "vlan_id"],
            "type": "int_parsing",
            "msg": rejection.body_text(),
        })])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// =============================================================================
// REST Router
// =============================================================================

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST API router builder
pub struct RestRouter {
    service: Arc<VlanService>,
    max_body_size: usize,
    request_timeout: Duration,
}

impl RestRouter {
    /// Create a new REST router
    pub fn new(service: Arc<VlanService>) -> Self {
        Self {
            service,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Reject bodies larger than `bytes` with 413
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the Axum router
    pub fn build(self) -> Router {
        let state = AppState {
            service: self.service,
        };

        Router::new()
            // VLAN endpoints
            .route(
                "/api/v1/vlans",
                allow(get(list_vlans).post(create_vlan)),
            )
            .route(
                "/api/v1/vlans/:id",
                allow(get(get_vlan).put(update_vlan).delete(delete_vlan)),
            )
            // Health and metrics
            .route("/health", allow(get(health_check)))
            .route("/metrics", allow(get(metrics)))
            .fallback(not_found)
            .with_state(state)
            .layer(DefaultBodyLimit::max(self.max_body_size))
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }
}

/// Answer unrouted methods with a JSON 405
fn allow(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(|| async { ApiError::method_not_allowed() })
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: Arc<VlanService>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List all VLANs
async fn list_vlans(State(state): State<AppState>) -> ApiResult<Json<Vec<VlanRecord>>> {
    let records = state.service.list().await?;
    debug!("Listed {} VLANs", records.len());
    Ok(Json(records))
}

/// Create a VLAN
async fn create_vlan(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewVlan>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<VlanRecord>)> {
    let Json(request) = body?;
    let created = state.service.create(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a VLAN by id
async fn get_vlan(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<VlanRecord>> {
    let Path(id) = id?;
    Ok(Json(state.service.get(id).await?))
}

/// Update a VLAN; only supplied fields change
async fn update_vlan(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
    body: std::result::Result<Json<VlanPatch>, JsonRejection>,
) -> ApiResult<Json<VlanRecord>> {
    let Path(id) = id?;
    let Json(patch) = body?;
    Ok(Json(state.service.update(id, patch).await?))
}

/// Delete a VLAN
async fn delete_vlan(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check
async fn health_check(State(state): State<AppState>) -> Response {
    let report = state.service.health().await;
    if report.is_healthy() {
        (StatusCode::OK, Json(report)).into_response()
    } else {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNHEALTHY",
            "Storage system is not accessible",
        )
        .with_details(json!({ "storage_healthy": false }))
        .into_response()
    }
}

/// Prometheus metrics
async fn metrics(State(state): State<AppState>) -> ApiResult<Response> {
    let body = state.service.metrics().render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
}
