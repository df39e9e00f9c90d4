use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/works", work_routes())
        .nest("/projects", project_routes())
        .route("/tags", get(handlers::tag::list_tags))
}

fn work_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::work::list_works).post(handlers::work::create_work),
        )
        .route(
            "/{id}",
            get(handlers::work::get_work)
                .put(handlers::work::update_work)
                .delete(handlers::work::delete_work),
        )
        .layer(handlers::work::work_form_body_limit())
}

fn project_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::project::list_projects).post(handlers::project::create_project),
        )
        .route(
            "/{id}",
            get(handlers::project::get_project)
                .put(handlers::project::update_project)
                .delete(handlers::project::delete_project),
        )
        .layer(handlers::work::work_form_body_limit())
}
