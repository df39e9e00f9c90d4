use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Identity;
use crate::extractors::form::FormSubmission;
use crate::models::shared::MutationResponse;
use crate::models::work::*;
use crate::services::gallery::GalleryService;
use crate::services::listing::{self, DEFAULT_PAGE_SIZE, WorkFilter};
use crate::state::AppState;

/// Room for a main image plus several sub-images at the per-file limit.
pub fn work_form_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

#[utoipa::path(
    get,
    path = "/api/v1/works",
    tag = "Works",
    operation_id = "listWorks",
    summary = "List works, newest first",
    description = "Returns one page of works with their tag names, sub-image ids and project. \
        Optional `search` matches title or kit name case-insensitively; `genre` and `tag` match exactly. \
        Database failures yield an empty page rather than an error.",
    params(WorkListQuery),
    responses(
        (status = 200, description = "Page of works", body = WorkListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_works(
    State(state): State<AppState>,
    Query(query): Query<WorkListQuery>,
) -> Json<WorkListResponse> {
    let filter = WorkFilter {
        search: query.search,
        genre: query.genre,
        tag: query.tag,
    };
    Json(
        listing::list_works(
            &state.db,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            &filter,
        )
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/api/v1/works/{id}",
    tag = "Works",
    operation_id = "getWork",
    summary = "Get a work",
    description = "Returns a work with its images sorted by display order, its tags and its project.",
    params(("id" = i32, Path, description = "Work ID")),
    responses(
        (status = 200, description = "Work detail", body = WorkDetail),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(work_id = id))]
pub async fn get_work(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<WorkDetail>, AppError> {
    Ok(Json(listing::get_work(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/works",
    tag = "Works",
    operation_id = "createWork",
    summary = "Create a work",
    description = "Multipart form. Fields: `title` (required), `kitName`, `maker`, `scale`, `genre`, \
        `paints`, `description`, `tags` (comma-separated), `projectId`, `endDate` (YYYY-MM-DD). \
        Files: `mainImage` (required) and repeated `subImages`, each JPEG, PNG or WebP up to the \
        configured size. Sub-images are ordered by submission.",
    request_body(content_type = "multipart/form-data", description = "Work fields and photos"),
    responses(
        (status = 201, description = "Work created", body = MutationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not the administrator (UNAUTHORIZED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, identity, multipart))]
pub async fn create_work(
    identity: Option<Identity>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    state.gate.require_admin(identity.as_ref())?;

    let form = FormSubmission::read(&mut multipart, state.guard.max_size()).await?;
    let form = CreateWorkForm::parse(form)?;
    let model = GalleryService::from_state(&state).create_work(form).await?;

    Ok((StatusCode::CREATED, Json(MutationResponse::created(model.id))))
}

#[utoipa::path(
    put,
    path = "/api/v1/works/{id}",
    tag = "Works",
    operation_id = "updateWork",
    summary = "Update a work",
    description = "Multipart form with the same fields as create; all scalar fields and tags are replaced. \
        Optional `mainImage` replaces the cover. Repeated `deleteImageUrls` remove this work's images. \
        New `subImages` are appended and `imageOrder`, a JSON array of `{\"id\": n}` or \
        `{\"isNew\": true}`, sets the final sequence; `isNew` entries bind to uploads in submission order.",
    params(("id" = i32, Path, description = "Work ID")),
    request_body(content_type = "multipart/form-data", description = "Work fields, photos and ordering"),
    responses(
        (status = 200, description = "Work updated", body = MutationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Not the administrator (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, identity, multipart), fields(work_id = id))]
pub async fn update_work(
    identity: Option<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<MutationResponse>, AppError> {
    state.gate.require_admin(identity.as_ref())?;

    let form = FormSubmission::read(&mut multipart, state.guard.max_size()).await?;
    let form = UpdateWorkForm::parse(form)?;
    GalleryService::from_state(&state).update_work(id, form).await?;

    Ok(Json(MutationResponse::ok()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/works/{id}",
    tag = "Works",
    operation_id = "deleteWork",
    summary = "Delete a work",
    description = "Removes the work, its images and tag links, then deletes its photos from storage. \
        Storage failures are logged and do not fail the request.",
    params(("id" = i32, Path, description = "Work ID")),
    responses(
        (status = 200, description = "Work deleted", body = MutationResponse),
        (status = 401, description = "Not the administrator (UNAUTHORIZED)", body = ErrorBody),
        (status = 404, description = "Work not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, identity), fields(work_id = id))]
pub async fn delete_work(
    identity: Option<Identity>,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MutationResponse>, AppError> {
    state.gate.require_admin(identity.as_ref())?;

    GalleryService::from_state(&state).delete_work(id).await?;
    Ok(Json(MutationResponse::ok()))
}
