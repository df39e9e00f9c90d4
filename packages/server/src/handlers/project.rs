use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Identity;
use crate::extractors::form::FormSubmission;
use crate::models::project::*;
use crate::models::shared::MutationResponse;
use crate::services::listing;
use crate::services::project::ProjectService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List projects, newest first",
    description = "Every project with the number of works in it. Database failures yield an empty list.",
    responses(
        (status = 200, description = "Projects", body = Vec<ProjectListItem>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<ProjectListItem>> {
    Json(listing::list_projects(&state.db).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project with its works", body = ProjectDetail),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(project_id = id))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectDetail>, AppError> {
    Ok(Json(listing::get_project(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a project",
    description = "Multipart form: `name` (required), `description`, optional `mainImage` cover.",
    request_body(content_type = "multipart/form-data", description = "Project fields and cover"),
    responses(
        (status = 201, description = "Project created", body = MutationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not the administrator (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, identity, multipart))]
pub async fn create_project(
    identity: Option<Identity>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    state.gate.require_admin(identity.as_ref())?;

    let form = FormSubmission::read(&mut multipart, state.guard.max_size()).await?;
    let form = ProjectForm::parse(form)?;
    let model = ProjectService::from_state(&state).create_project(form).await?;

    Ok((StatusCode::CREATED, Json(MutationResponse::created(model.id))))
}

#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    operation_id = "updateProject",
    summary = "Update a project",
    description = "Replaces name and description. A new `mainImage` replaces the cover; the old cover \
        is deleted from storage after the change is saved.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body(content_type = "multipart/form-data", description = "Project fields and cover"),
    responses(
        (status = 200, description = "Project updated", body = MutationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not the administrator (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, identity, multipart), fields(project_id = id))]
pub async fn update_project(
    identity: Option<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<MutationResponse>, AppError> {
    state.gate.require_admin(identity.as_ref())?;

    let form = FormSubmission::read(&mut multipart, state.guard.max_size()).await?;
    let form = ProjectForm::parse(form)?;
    ProjectService::from_state(&state).update_project(id, form).await?;

    Ok(Json(MutationResponse::ok()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project",
    description = "Deletes the project and its cover. Works in the project are kept and detached.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = MutationResponse),
        (status = 401, description = "Not the administrator (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, identity), fields(project_id = id))]
pub async fn delete_project(
    identity: Option<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MutationResponse>, AppError> {
    state.gate.require_admin(identity.as_ref())?;

    ProjectService::from_state(&state).delete_project(id).await?;
    Ok(Json(MutationResponse::ok()))
}
