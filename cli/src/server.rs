use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::classifier::IntentClassifier;
use carechat_core::glucose::{GlucoseStatus, check_range};
use carechat_core::insights::Insights;
use carechat_core::models::{LogEntry, LogType, NewLogEntry, UserProfile, validate_log_type};
use carechat_core::service::HealthService;

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB
const SERVICE_NAME: &str = "healthcare-multi-agent";

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<HealthService>>,
    classifier: Arc<dyn IntentClassifier>,
}

impl AppState {
    /// Run `f` with the service locked. The guard never outlives the call.
    fn with_service<T>(&self, f: impl FnOnce(&HealthService) -> T) -> T {
        let service = self
            .service
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&service)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct AgentRequest {
    message: String,
    user_id: Option<i64>,
    session_id: Option<String>,
}

#[derive(Serialize)]
struct AgentResponse {
    response: String,
    status: &'static str,
    data: Option<Value>,
}

#[derive(Deserialize)]
struct LogQuery {
    user_id: Option<i64>,
    log_type: Option<String>,
    value: Option<String>,
}

#[derive(Deserialize)]
struct LogBody {
    user_id: Option<i64>,
    log_type: Option<String>,
    value: Option<Value>,
}

#[derive(Deserialize)]
struct LogsQuery {
    log_type: Option<String>,
    limit: Option<i64>,
}

/// A log entry as served over HTTP; `cgm` entries carry their range status.
#[derive(Serialize)]
struct LogView {
    #[serde(flatten)]
    entry: LogEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    glucose_status: Option<GlucoseStatus>,
}

impl From<LogEntry> for LogView {
    fn from(entry: LogEntry) -> Self {
        let glucose_status = entry.glucose().map(|g| check_range(g).status);
        Self {
            entry,
            glucose_status,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Downstream(anyhow::Error),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Downstream(err) => {
                error!("Agent execution failed: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Agent execution failed: {err:#}"),
                )
            }
            Self::Internal(err) => {
                error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { detail: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn ag_ui_agent(
    State(state): State<AppState>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Ok(Json(AgentResponse {
            response: "Please enter a message.".to_string(),
            status: "error",
            data: None,
        }));
    }

    // Classify before touching the store so no lock is held across the await.
    let routed = state
        .classifier
        .classify(&req.message, req.user_id)
        .await
        .map_err(ApiError::Downstream)?;
    info!(
        classifier = state.classifier.name(),
        intent = routed.intent.name(),
        user_id = ?routed.user_id,
        "routed chat message"
    );

    let reply = state
        .with_service(|s| s.dispatch(&routed))
        .context("failed to run tool")?;

    Ok(Json(AgentResponse {
        response: reply.text,
        status: "success",
        data: Some(json!({
            "user_id": reply.user_id,
            "session_id": req.session_id,
            "intent": reply.intent,
        })),
    }))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .with_service(|s| s.get_profile(user_id))
        .context("database error")?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Fields from the query string win over the same fields in a JSON body.
fn merge_log_fields(query: LogQuery, body: &Bytes) -> Result<LogQuery, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(query);
    }
    let body: LogBody = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
    Ok(LogQuery {
        user_id: query.user_id.or(body.user_id),
        log_type: query.log_type.or(body.log_type),
        value: query.value.or_else(|| body.value.map(value_to_string)),
    })
}

fn missing(field: &str) -> ApiError {
    ApiError::BadRequest(format!("Missing required field: {field}"))
}

async fn create_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let fields = merge_log_fields(query, &body)?;
    let user_id = fields.user_id.ok_or_else(|| missing("user_id"))?;
    let log_type = fields.log_type.ok_or_else(|| missing("log_type"))?;
    let value = fields.value.ok_or_else(|| missing("value"))?;

    let log_type = validate_log_type(&log_type).map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ApiError::BadRequest("value must not be empty".to_string()));
    }
    if log_type == LogType::Cgm && value.parse::<i64>().is_err() {
        return Err(ApiError::BadRequest(format!(
            "Invalid glucose value '{value}'. Use a whole number in mg/dL"
        )));
    }

    let entry = state.with_service(|s| -> Result<Option<LogEntry>, ApiError> {
        if s.get_profile(user_id).context("database error")?.is_none() {
            return Ok(None);
        }
        let entry = s
            .append_log(&NewLogEntry::now(user_id, log_type, value))
            .context("failed to insert log entry")?;
        Ok(Some(entry))
    })?;
    let entry = entry.ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("{log_type} logged for user {user_id}"),
        "log_id": entry.log_id,
    })))
}

async fn get_user_logs(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<LogsQuery>,
) -> Result<Json<Vec<LogView>>, ApiError> {
    let log_type = params
        .log_type
        .as_deref()
        .map(validate_log_type)
        .transpose()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    if params.limit.is_some_and(|l| l < 0) {
        return Err(ApiError::BadRequest(
            "limit must not be negative".to_string(),
        ));
    }

    let entries = state
        .with_service(|s| s.get_logs(user_id, log_type, params.limit))
        .context("database error")?;
    Ok(Json(entries.into_iter().map(LogView::from).collect()))
}

async fn get_insights(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Insights>, ApiError> {
    let insights = state.with_service(|s| -> Result<Option<Insights>, ApiError> {
        if s.get_profile(user_id).context("database error")?.is_none() {
            return Ok(None);
        }
        Ok(Some(s.insights(user_id).context("database error")?))
    })?;
    insights
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ag-ui-agent", post(ag_ui_agent))
        .route("/users/{user_id}", get(get_user))
        .route("/users/{user_id}/logs", get(get_user_logs))
        .route("/users/{user_id}/insights", get(get_insights))
        .route("/logs", post(create_log))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                        let status = res.status();
                        let latency_ms = latency.as_millis();
                        if status.is_server_error() {
                            error!(%status, latency_ms, "response");
                        } else {
                            info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    service: HealthService,
    classifier: Arc<dyn IntentClassifier>,
    port: u16,
    bind: &str,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        classifier,
    };

    if bind != "127.0.0.1" && bind != "localhost" {
        warn!("Listening on {bind} with no authentication. Any device on your network can access this API.");
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    info!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
