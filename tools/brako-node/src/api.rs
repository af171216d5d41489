//! HTTP surface of the shipment service.
//!
//! Admin routes require `Authorization: Bearer <token>` from `/api/login`;
//! the [`Admin`] extractor rejects the request before any handler runs.
//! `/api/track/{code}` and `/health` are public.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use brako_common::bulk::{BulkStatusReport, BulkStatusUpdate};
use brako_common::report::{ReportRow, HEADERS};
use brako_common::shipment::{Shipment, ShipmentId, ShipmentInput, TrackingInfo};
use brako_common::stats::ShipmentStats;
use brako_common::ValidationError;

use crate::error::{ShipmentError, ShipmentResult};
use crate::repository::ShipmentRepository;
use crate::session::{AdminCapability, SessionStore};
use crate::store::TableCounts;

pub struct AppState {
    pub repository: ShipmentRepository,
    pub sessions: SessionStore,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn shared(repository: ShipmentRepository, sessions: SessionStore) -> SharedState {
        Arc::new(Self {
            repository,
            sessions,
        })
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ShipmentError {
    fn status_code(&self) -> StatusCode {
        match self {
            ShipmentError::Validation(_) => StatusCode::BAD_REQUEST,
            ShipmentError::NotFound(_) | ShipmentError::UnknownTrackingCode(_) => {
                StatusCode::NOT_FOUND
            }
            ShipmentError::Unauthorized => StatusCode::UNAUTHORIZED,
            ShipmentError::Persistence(_) | ShipmentError::Corrupt(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ShipmentError {
    fn into_response(self) -> Response {
        // Store details stay in the log.
        let error = if self.is_internal() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (self.status_code(), Json(ErrorResponse { error })).into_response()
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ShipmentResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ValidationError::Malformed(rejection.body_text()).into())
}

// ─── Auth ────────────────────────────────────────────────────────────────────

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// A request carrying a live admin session.
pub struct Admin(pub AdminCapability);

impl FromRequestParts<SharedState> for Admin {
    type Rejection = ShipmentError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ShipmentError::Unauthorized)?;
        state.sessions.authorize(token).map(Admin)
    }
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn login(
    State(state): State<SharedState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    match state.sessions.login(&request.username, &request.password) {
        Ok(token) => Json(LoginResponse {
            success: true,
            token: Some(token),
            message: None,
        })
        .into_response(),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                token: None,
                message: Some("Invalid username or password".into()),
            }),
        )
            .into_response(),
    }
}

#[derive(Serialize)]
struct SuccessResponse {
    success: bool,
}

async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Json<SuccessResponse> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.logout(token);
    }
    Json(SuccessResponse { success: true })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthStatus {
    is_authenticated: bool,
}

async fn auth_status(State(state): State<SharedState>, headers: HeaderMap) -> Json<AuthStatus> {
    let is_authenticated = bearer_token(&headers)
        .map(|token| state.sessions.is_authenticated(token))
        .unwrap_or(false);
    Json(AuthStatus { is_authenticated })
}

// ─── Shipments ───────────────────────────────────────────────────────────────

async fn list_shipments(
    State(state): State<SharedState>,
    Admin(cap): Admin,
) -> ShipmentResult<Json<Vec<Shipment>>> {
    Ok(Json(state.repository.list(&cap).await?))
}

async fn create_shipment(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    payload: Result<Json<ShipmentInput>, JsonRejection>,
) -> ShipmentResult<(StatusCode, Json<Shipment>)> {
    let input = json_body(payload)?;
    let shipment = state.repository.create(&cap, input).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

async fn get_shipment(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    Path(id): Path<i64>,
) -> ShipmentResult<Json<Shipment>> {
    Ok(Json(state.repository.get(&cap, ShipmentId(id)).await?))
}

async fn update_shipment(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    Path(id): Path<i64>,
    payload: Result<Json<ShipmentInput>, JsonRejection>,
) -> ShipmentResult<Json<Shipment>> {
    let input = json_body(payload)?;
    Ok(Json(
        state.repository.update(&cap, ShipmentId(id), input).await?,
    ))
}

async fn delete_shipment(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    Path(id): Path<i64>,
) -> ShipmentResult<StatusCode> {
    state.repository.delete(&cap, ShipmentId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
}

async fn search_shipments(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ShipmentResult<Json<Vec<Shipment>>> {
    let request = json_body(payload)?;
    Ok(Json(state.repository.search(&cap, &request.query).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkStatusResponse {
    success: bool,
    updated: usize,
    #[serde(flatten)]
    report: BulkStatusReport,
}

async fn update_status(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    payload: Result<Json<BulkStatusUpdate>, JsonRejection>,
) -> ShipmentResult<Json<BulkStatusResponse>> {
    let request = json_body(payload)?;
    let report = state.repository.bulk_update_status(&cap, &request).await?;
    Ok(Json(BulkStatusResponse {
        success: true,
        updated: report.updated_count(),
        report,
    }))
}

#[derive(Deserialize)]
struct ReportRequest {
    ids: Vec<ShipmentId>,
}

#[derive(Serialize)]
struct ReportResponse {
    headers: [&'static str; 21],
    rows: Vec<ReportRow>,
}

async fn report(
    State(state): State<SharedState>,
    Admin(cap): Admin,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> ShipmentResult<Json<ReportResponse>> {
    let request = json_body(payload)?;
    let rows = state.repository.report(&cap, &request.ids).await?;
    Ok(Json(ReportResponse {
        headers: HEADERS,
        rows,
    }))
}

async fn stats(
    State(state): State<SharedState>,
    Admin(cap): Admin,
) -> ShipmentResult<Json<ShipmentStats>> {
    Ok(Json(state.repository.stats(&cap).await?))
}

// ─── Public ──────────────────────────────────────────────────────────────────

async fn track(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> ShipmentResult<Json<TrackingInfo>> {
    Ok(Json(state.repository.track(&code).await?))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    tables: TableCounts,
}

async fn health(State(state): State<SharedState>) -> ShipmentResult<Json<HealthResponse>> {
    let tables = state.repository.counts().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        tables,
    }))
}

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/auth_status", get(auth_status))
        .route("/api/shipments", get(list_shipments).post(create_shipment))
        .route("/api/shipments/search", post(search_shipments))
        .route("/api/shipments/update_status", post(update_status))
        .route("/api/shipments/report", post(report))
        .route(
            "/api/shipments/{id}",
            get(get_shipment).put(update_shipment).delete(delete_shipment),
        )
        .route("/api/stats", get(stats))
        .route("/api/track/{code}", get(track))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}
