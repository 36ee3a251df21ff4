//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use learning_path_core::progress::{has_milestone, summarize};
use learning_path_core::{
    JobMarketData, LearningPath, PathRequest, ProgressSummary, ResearchSummary, SavedPath,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_path_handler,
        list_paths_handler,
        get_path_handler,
        record_progress_handler,
        archive_path_handler,
        delete_path_handler,
        ask_handler,
        job_market_handler,
    ),
    components(
        schemas(
            CreatePathRequest,
            SavedPathResponse,
            PathSummaryResponse,
            ListPathsResponse,
            ProgressView,
            ProgressUpdate,
            ArchiveRequest,
            AskRequest,
        )
    ),
    tags(
        (name = "Learning Path API", description = "Generate, save and track personalized learning paths.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// What a learner asks for when generating a new path.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePathRequest {
    pub topic: String,
    #[serde(default = "default_level")]
    pub expertise_level: String,
    #[serde(default = "default_style")]
    pub learning_style: String,
    #[serde(default = "default_commitment")]
    pub time_commitment: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

fn default_level() -> String {
    "beginner".to_string()
}

fn default_style() -> String {
    "visual".to_string()
}

fn default_commitment() -> String {
    "moderate".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProgressView {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

impl From<ProgressSummary> for ProgressView {
    fn from(summary: ProgressSummary) -> Self {
        Self {
            completed: summary.completed,
            total: summary.total,
            percentage: summary.percentage,
        }
    }
}

/// A saved path together with the learner's progress on it.
#[derive(Debug, Serialize, ToSchema)]
pub struct SavedPathResponse {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub progress: ProgressView,
    #[schema(value_type = Object)]
    pub path: LearningPath,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PathSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub topic: String,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub progress: ProgressView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListPathsResponse {
    pub paths: Vec<PathSummaryResponse>,
    /// Progress across every listed path.
    pub overall: ProgressView,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPathsQuery {
    /// List archived paths instead of active ones.
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressUpdate {
    /// Title of the milestone being updated.
    pub milestone: String,
    #[serde(default = "default_true")]
    pub completed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ArchiveRequest {
    #[serde(default = "default_true")]
    pub archived: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    pub question: String,
    /// Reference material the answer should draw on.
    #[serde(default)]
    pub context: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobMarketQuery {
    /// The skill or role to look up.
    pub skill: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Reads the caller's identity from the `x-user-id` header.
fn user_id_from(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let user_id_str = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("x-user-id header is required".to_string()))?;

    Uuid::parse_str(user_id_str.trim())
        .map_err(|_| ApiError::BadRequest("Invalid x-user-id format".to_string()))
}

async fn progress_of(app_state: &AppState, saved: &SavedPath) -> Result<ProgressSummary, ApiError> {
    let entries = app_state.repository.get_progress(saved.id).await?;
    Ok(summarize(&saved.path, &entries))
}

fn summary_response(saved: &SavedPath, progress: ProgressSummary) -> PathSummaryResponse {
    PathSummaryResponse {
        id: saved.id,
        title: saved.title.clone(),
        topic: saved.topic.clone(),
        is_archived: saved.is_archived,
        created_at: saved.created_at,
        progress: progress.into(),
    }
}

fn saved_response(saved: SavedPath, progress: ProgressSummary) -> SavedPathResponse {
    SavedPathResponse {
        id: saved.id,
        title: saved.title,
        topic: saved.topic,
        is_archived: saved.is_archived,
        created_at: saved.created_at,
        progress: progress.into(),
        path: saved.path,
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a learning path and save it for the caller.
#[utoipa::path(
    post,
    path = "/paths",
    request_body = CreatePathRequest,
    responses(
        (status = 201, description = "Path generated and saved", body = SavedPathResponse),
        (status = 400, description = "Bad request (e.g., missing header or unknown choice)"),
        (status = 502, description = "The model failed to produce a valid path")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_path_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreatePathRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id_from(&headers)?;
    let request = PathRequest::parse(
        &payload.topic,
        &payload.expertise_level,
        &payload.learning_style,
        &payload.time_commitment,
    )?
    .with_goals(payload.goals)
    .with_additional_info(payload.additional_info);

    let path = app_state.planner.generate_path(&request).await?;
    let saved = app_state.repository.save_path(user_id, &path).await?;
    info!(%user_id, path_id = %saved.id, "Saved generated learning path");

    let progress = ProgressSummary::new(0, saved.path.milestones.len());
    Ok((StatusCode::CREATED, Json(saved_response(saved, progress))))
}

/// List the caller's paths, newest first.
#[utoipa::path(
    get,
    path = "/paths",
    responses(
        (status = 200, description = "The caller's paths", body = ListPathsResponse),
        (status = 400, description = "Missing or invalid x-user-id header")
    ),
    params(
        ListPathsQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_paths_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListPathsQuery>,
) -> Result<Json<ListPathsResponse>, ApiError> {
    let user_id = user_id_from(&headers)?;
    let saved = app_state
        .repository
        .list_paths(user_id, query.archived)
        .await?;

    let mut paths = Vec::with_capacity(saved.len());
    let mut summaries = Vec::with_capacity(saved.len());
    for path in &saved {
        let progress = progress_of(&app_state, path).await?;
        paths.push(summary_response(path, progress));
        summaries.push(progress);
    }

    Ok(Json(ListPathsResponse {
        paths,
        overall: ProgressSummary::overall(&summaries).into(),
    }))
}

/// Fetch one saved path with its progress.
#[utoipa::path(
    get,
    path = "/paths/{id}",
    responses(
        (status = 200, description = "The saved path", body = SavedPathResponse),
        (status = 404, description = "No such path for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The saved path ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_path_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(path_id): Path<Uuid>,
) -> Result<Json<SavedPathResponse>, ApiError> {
    let user_id = user_id_from(&headers)?;
    let saved = app_state.repository.get_path(user_id, path_id).await?;
    let progress = progress_of(&app_state, &saved).await?;
    Ok(Json(saved_response(saved, progress)))
}

/// Mark a milestone of a saved path as completed or not.
#[utoipa::path(
    post,
    path = "/paths/{id}/progress",
    request_body = ProgressUpdate,
    responses(
        (status = 200, description = "Updated progress", body = ProgressView),
        (status = 400, description = "The path has no such milestone"),
        (status = 404, description = "No such path for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The saved path ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn record_progress_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(path_id): Path<Uuid>,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<ProgressView>, ApiError> {
    let user_id = user_id_from(&headers)?;
    let saved = app_state.repository.get_path(user_id, path_id).await?;
    if !has_milestone(&saved.path, &update.milestone) {
        return Err(ApiError::BadRequest(format!(
            "Path {} has no milestone named '{}'",
            path_id, update.milestone
        )));
    }

    app_state
        .repository
        .record_progress(path_id, &update.milestone, update.completed)
        .await?;
    let progress = progress_of(&app_state, &saved).await?;
    info!(%path_id, milestone = %update.milestone, completed = update.completed, "Recorded progress");
    Ok(Json(progress.into()))
}

/// Archive or restore a saved path.
#[utoipa::path(
    post,
    path = "/paths/{id}/archive",
    request_body = ArchiveRequest,
    responses(
        (status = 204, description = "Archive flag updated"),
        (status = 404, description = "No such path for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The saved path ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn archive_path_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(path_id): Path<Uuid>,
    Json(request): Json<ArchiveRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = user_id_from(&headers)?;
    app_state
        .repository
        .set_archived(user_id, path_id, request.archived)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a saved path and its progress.
#[utoipa::path(
    delete,
    path = "/paths/{id}",
    responses(
        (status = 204, description = "Path deleted"),
        (status = 404, description = "No such path for this user")
    ),
    params(
        ("id" = Uuid, Path, description = "The saved path ID."),
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn delete_path_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(path_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = user_id_from(&headers)?;
    app_state.repository.delete_path(user_id, path_id).await?;
    info!(%user_id, %path_id, "Deleted learning path");
    Ok(StatusCode::NO_CONTENT)
}

/// Ask an open question about a topic and get a structured summary back.
#[utoipa::path(
    post,
    path = "/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "A structured answer", body = Object),
        (status = 400, description = "Empty question"),
        (status = 502, description = "The model call failed")
    )
)]
pub async fn ask_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<ResearchSummary>, ApiError> {
    if request.question.trim().is_empty() {
        return Err(ApiError::BadRequest("A question is required".to_string()));
    }
    let summary = app_state
        .planner
        .research(&request.question, &request.context)
        .await?;
    Ok(Json(summary))
}

/// Current job market snapshot for a skill or role.
#[utoipa::path(
    get,
    path = "/job-market",
    responses(
        (status = 200, description = "Market snapshot; carries `error` when defaults were used", body = Object),
        (status = 400, description = "Missing skill")
    ),
    params(JobMarketQuery)
)]
pub async fn job_market_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<JobMarketQuery>,
) -> Result<Json<JobMarketData>, ApiError> {
    let skill = query.skill.trim();
    if skill.is_empty() {
        return Err(ApiError::BadRequest("A skill is required".to_string()));
    }

    let mut data = match app_state.job_market.market_snapshot(skill).await {
        Ok(data) => data,
        Err(e) => {
            warn!(%skill, error = %e, "Job market lookup failed, using fallback snapshot");
            JobMarketData::fallback_snapshot(e.to_string())
        }
    };
    data.region = Some(app_state.config.default_region.clone());
    data.related_roles = match app_state.job_market.related_roles(&[skill.to_string()]).await {
        Ok(roles) => roles,
        Err(e) => {
            warn!(%skill, error = %e, "Related role lookup failed");
            Vec::new()
        }
    };
    Ok(Json(data))
}
