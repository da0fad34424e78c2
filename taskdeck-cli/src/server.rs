//! HTTP interface
//!
//! Form posts and link-style GET mutations answer with `303 See Other`
//! redirects; reads answer with JSON. Every handler is a thin translation
//! onto a [`TaskStore`] call, run on the blocking pool since a save
//! writes the task file.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use taskdeck_core::date::parse_iso_date;
use taskdeck_core::{CoreError, Priority, Stats, TaskDraft, TaskFilter, TaskStore, TaskView};

use crate::error::{CliError, Result};

// =============================================================================
// Errors
// =============================================================================

/// JSON body of an error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Offending field for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Status code plus error body
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<CoreError> for ApiErrorResponse {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, message } => Self {
                status: StatusCode::BAD_REQUEST,
                error: ApiError {
                    code: "VALIDATION_ERROR".to_string(),
                    message,
                    field: Some(field),
                },
            },
            CoreError::TaskNotFound(id) => Self {
                status: StatusCode::NOT_FOUND,
                error: ApiError {
                    code: "NOT_FOUND".to_string(),
                    message: format!("Task #{} not found", id),
                    field: None,
                },
            },
            // Storage details stay in the log
            err @ CoreError::Storage { .. } => {
                error!(error = %err, "storage failure while handling request");
                Self::internal()
            }
        }
    }
}

impl ApiErrorResponse {
    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError {
                code: "INTERNAL_ERROR".to_string(),
                message: "An internal error occurred".to_string(),
                field: None,
            },
        }
    }
}

type ApiResult<T> = std::result::Result<T, ApiErrorResponse>;

// =============================================================================
// Request / response shapes
// =============================================================================

/// Query parameters of the list view
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

/// The filter as understood, echoed back to the client
#[derive(Debug, Serialize)]
pub struct FilterEcho {
    pub category: String,
    pub priority: String,
    pub status: &'static str,
    pub search: String,
    pub sort: &'static str,
}

impl From<&TaskFilter> for FilterEcho {
    fn from(filter: &TaskFilter) -> Self {
        Self {
            category: filter.category.clone().unwrap_or_else(|| "all".to_string()),
            priority: filter.priority.clone().unwrap_or_else(|| "all".to_string()),
            status: filter.status.as_str(),
            search: filter.search.clone().unwrap_or_default(),
            sort: filter.sort.as_str(),
        }
    }
}

/// Response of the list view
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<TaskView>,
    pub stats: Stats,
    pub categories: Vec<String>,
    pub filter: FilterEcho,
}

/// Create/update form fields
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
}

impl TaskForm {
    /// Check required fields, parse the priority and require ISO due dates
    fn into_draft(self) -> taskdeck_core::Result<TaskDraft> {
        let title = self
            .title
            .ok_or_else(|| CoreError::validation("title", "Title is required"))?;
        let description = self
            .desc
            .ok_or_else(|| CoreError::validation("desc", "Description is required"))?;

        let priority = match self.priority.as_deref().map(str::trim) {
            Some(p) if !p.is_empty() => Some(p.parse::<Priority>()?),
            _ => None,
        };

        let due_date = self.due_date.as_deref().map(parse_iso_date).transpose()?.flatten();

        Ok(TaskDraft {
            title,
            description,
            category: self.category,
            priority,
            due_date: due_date.map(|d| d.format("%Y-%m-%d").to_string()),
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

type AppState = Arc<TaskStore>;

/// Run a store call on the blocking pool
async fn with_store<T, F>(store: AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&TaskStore) -> taskdeck_core::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| {
            error!(error = %e, "store call did not complete");
            ApiErrorResponse::internal()
        })?
        .map_err(ApiErrorResponse::from)
}

async fn list_tasks(
    State(store): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    let filter = TaskFilter::from_params(
        params.category.as_deref(),
        params.priority.as_deref(),
        params.status.as_deref(),
        params.search.as_deref(),
        params.sort.as_deref(),
    );

    let query = filter.clone();
    let result = with_store(store, move |store| store.query(&query)).await?;

    Ok(Json(ListResponse {
        items: result.views(),
        stats: result.stats,
        categories: result.categories,
        filter: FilterEcho::from(&filter),
    }))
}

async fn create_task(
    State(store): State<AppState>,
    Form(form): Form<TaskForm>,
) -> ApiResult<Redirect> {
    let draft = form.into_draft()?;
    with_store(store, move |store| store.create(&draft)).await?;
    Ok(Redirect::to("/"))
}

async fn edit_task(State(store): State<AppState>, Path(id): Path<u32>) -> ApiResult<Json<TaskView>> {
    let view = with_store(store, move |store| store.view(id)).await?;
    Ok(Json(view))
}

async fn update_task(
    State(store): State<AppState>,
    Path(id): Path<u32>,
    Form(form): Form<TaskForm>,
) -> ApiResult<Redirect> {
    let draft = form.into_draft()?;
    with_store(store, move |store| store.update(id, &draft)).await?;
    Ok(Redirect::to("/"))
}

async fn delete_task(State(store): State<AppState>, Path(id): Path<u32>) -> ApiResult<Redirect> {
    with_store(store, move |store| store.delete(id)).await?;
    Ok(Redirect::to("/"))
}

async fn toggle_task(
    State(store): State<AppState>,
    Path(id): Path<u32>,
    headers: HeaderMap,
) -> ApiResult<Redirect> {
    with_store(store, move |store| store.toggle(id)).await?;

    let back = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("/");
    Ok(Redirect::to(back))
}

async fn delete_completed(State(store): State<AppState>) -> ApiResult<Redirect> {
    with_store(store, |store| store.delete_all_completed()).await?;
    Ok(Redirect::to("/"))
}

async fn stats(State(store): State<AppState>) -> ApiResult<Json<Stats>> {
    let stats = with_store(store, |store| Ok(store.stats())).await?;
    Ok(Json(stats))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// =============================================================================
// Router
// =============================================================================

/// Build the router over a shared store
pub fn router(store: Arc<TaskStore>) -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/update/{id}", get(edit_task).post(update_task))
        .route("/delete/{id}", get(delete_task))
        .route("/toggle/{id}", get(toggle_task))
        .route("/delete_completed", get(delete_completed))
        .route("/api/stats", get(stats))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(store: Arc<TaskStore>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CliError::io(format!("Failed to bind {}", addr), e))?;

    info!(%addr, "taskdeck listening");

    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CliError::server_with_source("Server stopped unexpectedly", e))?;

    info!("taskdeck stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }
}
