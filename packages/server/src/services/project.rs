use chrono::Utc;
use gallery_common::ingest::ImageGuard;
use gallery_common::storage::{BlobStore, ImageRole};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::info;

use crate::entity::{project, work};
use crate::error::AppError;
use crate::extractors::form::UploadedFile;
use crate::models::project::ProjectForm;
use crate::services::intake::{self, PendingUpload};
use crate::state::AppState;

/// Project mutations. Same blob discipline as works: covers are stored
/// before the transaction and replaced covers deleted after commit.
pub struct ProjectService<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn BlobStore,
    guard: &'a ImageGuard,
}

impl<'a> ProjectService<'a> {
    pub fn new(db: &'a DatabaseConnection, store: &'a dyn BlobStore, guard: &'a ImageGuard) -> Self {
        Self { db, store, guard }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.db, state.blob_store.as_ref(), &state.guard)
    }

    pub async fn create_project(&self, form: ProjectForm) -> Result<project::Model, AppError> {
        let cover = self.store_cover(form.main_image).await?;

        let now = Utc::now();
        let model = project::ActiveModel {
            name: Set(form.name),
            description: Set(form.description),
            main_image: Set(cover),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db)
        .await?;

        info!(project_id = model.id, "Created project");
        Ok(model)
    }

    pub async fn update_project(
        &self,
        id: i32,
        form: ProjectForm,
    ) -> Result<project::Model, AppError> {
        find_project(self.db, id).await?;
        let new_cover = self.store_cover(form.main_image).await?;

        let txn = self.db.begin().await?;
        let current = find_project_for_update(&txn, id).await?;
        let previous_cover = current.main_image.clone();

        let mut active: project::ActiveModel = current.into();
        active.name = Set(form.name);
        active.description = Set(form.description);
        if let Some(cover) = &new_cover {
            active.main_image = Set(Some(cover.clone()));
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;

        txn.commit().await?;
        info!(project_id = id, replaced_cover = new_cover.is_some(), "Updated project");

        if new_cover.is_some()
            && let Some(old) = previous_cover
        {
            self.store.discard(&old).await;
        }
        Ok(model)
    }

    /// Delete a project. Its works stay, detached.
    pub async fn delete_project(&self, id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let existing = find_project_for_update(&txn, id).await?;

        let detached = work::Entity::update_many()
            .col_expr(work::Column::ProjectId, Expr::value(Option::<i32>::None))
            .filter(work::Column::ProjectId.eq(id))
            .exec(&txn)
            .await?;
        project::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(
            project_id = id,
            detached_works = detached.rows_affected,
            "Deleted project"
        );

        if let Some(cover) = existing.main_image {
            self.store.discard(&cover).await;
        }
        Ok(())
    }

    async fn store_cover(&self, file: Option<UploadedFile>) -> Result<Option<String>, AppError> {
        let Some(file) = file else {
            return Ok(None);
        };
        let accepted = intake::accept_all(
            self.guard,
            vec![PendingUpload::new(file, ImageRole::Project, "mainImage")],
            Utc::now(),
        )
        .await?;
        let references = intake::store_all(self.store, &accepted).await?;
        Ok(references.into_iter().next())
    }
}

pub(crate) async fn find_project<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

async fn find_project_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<project::Model, AppError> {
    project::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}
