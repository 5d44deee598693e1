use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AssemblyOutcome, DecodeOptions, NewProject, ProjectPlan, ProjectRecord, ProjectStore,
    Schedule, ScheduleAssembler, ScheduleError, ScheduleSummary, load_schedule_from_xml,
    parse_model_response,
};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ProjectStore>,
    assembler: Arc<ScheduleAssembler>,
    decode_options: DecodeOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn ProjectStore>, assembler: ScheduleAssembler) -> Self {
        Self {
            store,
            assembler: Arc::new(assembler),
            decode_options: DecodeOptions::default(),
        }
    }

    pub fn with_decode_options(mut self, decode_options: DecodeOptions) -> Self {
        self.decode_options = decode_options;
        self
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        match value {
            ScheduleError::Validation(_) | ScheduleError::CycleOrOrdering { .. } => {
                ApiError::Invalid(value.to_string())
            }
            ScheduleError::NotFound(_) => ApiError::NotFound(value.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectPayload {
    pub project_name: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub overview_file: Option<String>,
    /// Already structured plan; takes precedence over `model_response`.
    #[serde(default)]
    pub plan: Option<ProjectPlan>,
    /// Raw language-model output.
    #[serde(default)]
    pub model_response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    owner_id: Option<String>,
}

/// A stored project with its decoded schedule, or the reason it could not
/// be decoded.
#[derive(Debug, Serialize)]
pub struct ProjectDetail {
    pub record: ProjectRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScheduleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project))
        .route("/projects/:id/document", get(download_document))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProjectRecord>>, ApiError> {
    let records = match query.owner_id {
        Some(owner_id) => state.store.list_by_owner(&owner_id)?,
        None => state.store.list()?,
    };
    Ok(Json(records))
}

async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<CreateProjectPayload>,
) -> Result<(StatusCode, Json<ProjectRecord>), ApiError> {
    let plan = match (payload.plan, payload.model_response) {
        (Some(plan), _) => plan,
        (None, Some(response)) => parse_model_response(&response).plan,
        (None, None) => ProjectPlan::default_plan(),
    };
    let project = NewProject {
        project_name: payload.project_name,
        owner_id: payload.owner_id,
        overview_file: payload.overview_file,
    };

    let store = state.store.clone();
    let assembler = state.assembler.clone();
    let (record, _) =
        tokio::task::spawn_blocking(move || assembler.register(store.as_ref(), project, &plan))
            .await
            .map_err(|err| ApiError::internal(format!("assembly task failed: {err}")))??;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let record = state
        .store
        .get(&id)?
        .ok_or_else(|| ApiError::not_found(format!("project {id} not found")))?;

    let decoded = match &record.document {
        AssemblyOutcome::Local { path } => load_schedule_from_xml(path, &state.decode_options)
            .map_err(|err| err.to_string()),
        AssemblyOutcome::Remote { project_id } => Err(format!(
            "schedule is hosted remotely as {project_id}; no local document"
        )),
    };
    let detail = match decoded {
        Ok(schedule) => ProjectDetail {
            summary: Some(schedule.summary()),
            schedule: Some(schedule),
            error: None,
            record,
        },
        Err(message) => {
            tracing::warn!(project = %id, error = %message, "project document unavailable");
            ProjectDetail {
                record,
                schedule: None,
                summary: None,
                error: Some(message),
            }
        }
    };
    Ok(Json(detail))
}

async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let record = state
        .store
        .get(&id)?
        .ok_or_else(|| ApiError::not_found(format!("project {id} not found")))?;
    let path = record
        .document
        .local_path()
        .ok_or_else(|| ApiError::not_found(format!("project {id} has no local document")))?;
    let xml = match std::fs::read_to_string(path) {
        Ok(xml) => xml,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found(format!("document for project {id} is missing")));
        }
        Err(err) => return Err(ApiError::internal(err.to_string())),
    };
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{id}.xml"));
    Ok((
        [
            (header::CONTENT_TYPE, "application/xml".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        xml,
    )
        .into_response())
}
