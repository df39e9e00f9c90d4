use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::entity::{image, work};

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Sub-images of one work in display order:
    // SELECT ... FROM image WHERE work_id = ? ORDER BY position, id
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_image_work_position")
        .table(image::Entity)
        .col(image::Column::WorkId)
        .col(image::Column::Position)
        .to_string(PostgresQueryBuilder);
    run_index(db, "idx_image_work_position", &stmt).await;

    // Newest-first listing.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_work_created")
        .table(work::Entity)
        .col(work::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    run_index(db, "idx_work_created", &stmt).await;

    Ok(())
}

async fn run_index(db: &DatabaseConnection, name: &str, stmt: &str) {
    match db.execute_unprepared(stmt).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => warn!("Failed to create index {name}: {e}"),
    }
}
