use crate::activity::ActivityEntry;
use crate::client::ClientError;
use crate::fleet::{NewTask, ValidationError};
use crate::poll::{CreateTaskError, DashboardView, PollOrchestrator};
use crate::stats::{filter_tasks, filter_units, StateFilter, TaskView, UnitView};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

/// Shared state for the dashboard API
pub struct DashboardAppState {
    pub orchestrator: Arc<PollOrchestrator>,
}

/// Query parameters for unit and task listing
#[derive(Deserialize)]
pub struct FilterParams {
    /// "all" or a category label such as "in-mission"
    pub state: Option<String>,
}

impl FilterParams {
    fn filter(&self) -> Result<StateFilter, DashboardError> {
        match self.state.as_deref() {
            None => Ok(StateFilter::All),
            Some(raw) => raw.parse().map_err(DashboardError::BadFilter),
        }
    }
}

/// Body of a successful create
#[derive(Serialize)]
pub struct MissionCreated {
    pub id: i64,
    pub status: Option<String>,
}

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create dashboard API router
pub fn create_dashboard_router(state: Arc<DashboardAppState>) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/units", get(list_units))
        .route("/api/tasks", get(list_tasks))
        .route("/api/activity", get(list_activity).delete(clear_activity))
        .route("/api/refresh", post(refresh))
        .route("/api/missions", post(create_mission))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /api/dashboard - Everything the dashboard renders
async fn get_dashboard(State(state): State<Arc<DashboardAppState>>) -> Json<DashboardView> {
    Json(state.orchestrator.context().view())
}

/// GET /api/units?state=<filter>
async fn list_units(
    State(state): State<Arc<DashboardAppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<UnitView>>, DashboardError> {
    let filter = params.filter()?;
    let snapshot = state.orchestrator.context().snapshots().current();
    let units = filter_units(&snapshot.units, filter);
    Ok(Json(units.iter().map(UnitView::from).collect()))
}

/// GET /api/tasks?state=<filter>
async fn list_tasks(
    State(state): State<Arc<DashboardAppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<TaskView>>, DashboardError> {
    let filter = params.filter()?;
    let snapshot = state.orchestrator.context().snapshots().current();
    let tasks = filter_tasks(&snapshot.tasks, filter);
    Ok(Json(tasks.iter().map(TaskView::from).collect()))
}

/// GET /api/activity - Newest first
async fn list_activity(State(state): State<Arc<DashboardAppState>>) -> Json<Vec<ActivityEntry>> {
    Json(state.orchestrator.context().activity())
}

/// DELETE /api/activity
async fn clear_activity(State(state): State<Arc<DashboardAppState>>) -> StatusCode {
    state.orchestrator.context().clear_activity();
    debug!("Activity log cleared");
    StatusCode::NO_CONTENT
}

/// POST /api/refresh - Runs a manual cycle in the background
async fn refresh(State(state): State<Arc<DashboardAppState>>) -> StatusCode {
    let orchestrator = Arc::clone(&state.orchestrator);
    tokio::spawn(async move {
        orchestrator.refresh_manual().await;
    });
    StatusCode::ACCEPTED
}

/// POST /api/missions - Create a task; the dashboard reloads before responding
async fn create_mission(
    State(state): State<Arc<DashboardAppState>>,
    Json(task): Json<NewTask>,
) -> Result<(StatusCode, Json<MissionCreated>), DashboardError> {
    let id = task.id;
    let ack = state.orchestrator.create_task(task).await?;
    info!(task_id = id, "Mission created via API");

    Ok((
        StatusCode::CREATED,
        Json(MissionCreated {
            id: ack.id.unwrap_or(id),
            status: ack.status,
        }),
    ))
}

/// Dashboard API error types
#[derive(Debug)]
enum DashboardError {
    BadFilter(String),
    Invalid(ValidationError),
    Upstream(ClientError),
}

impl From<CreateTaskError> for DashboardError {
    fn from(e: CreateTaskError) -> Self {
        match e {
            CreateTaskError::Invalid(e) => DashboardError::Invalid(e),
            CreateTaskError::Client(e) => DashboardError::Upstream(e),
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            DashboardError::BadFilter(msg) => (StatusCode::BAD_REQUEST, msg),
            DashboardError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            DashboardError::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
