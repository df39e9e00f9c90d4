use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::services::listing;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List tag names",
    description = "Every tag name in ascending order. Database failures yield an empty list.",
    responses(
        (status = 200, description = "Tag names", body = Vec<String>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(listing::list_tags(&state.db).await)
}
