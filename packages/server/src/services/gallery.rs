//! Transactional create/update/delete of works.
//!
//! Blob writes happen before the transaction opens and blob deletions only
//! after it commits, so a committed row never points at a missing blob.
//! Failures before commit may leave unreferenced blobs behind, except when
//! the referenced project disappears before the transaction locks it; those
//! blobs are deleted again.

use chrono::Utc;
use gallery_common::ingest::ImageGuard;
use gallery_common::storage::{BlobStore, ImageRole};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::info;

use crate::entity::{image, project, work, work_tag};
use crate::error::AppError;
use crate::models::work::{CreateWorkForm, OrderEntry, UpdateWorkForm, WorkFields};
use crate::services::intake::{self, PendingUpload};
use crate::state::AppState;
use crate::utils::tags;

/// Order value of images not yet placed by an `imageOrder` walk.
///
/// Must stay above any real position, i.e. above
/// [`MAX_ORDER_ENTRIES`](crate::models::work::MAX_ORDER_ENTRIES).
pub const UNPOSITIONED_TAIL: i32 = 999;

pub struct GalleryService<'a> {
    db: &'a DatabaseConnection,
    store: &'a dyn BlobStore,
    guard: &'a ImageGuard,
}

impl<'a> GalleryService<'a> {
    pub fn new(db: &'a DatabaseConnection, store: &'a dyn BlobStore, guard: &'a ImageGuard) -> Self {
        Self { db, store, guard }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(&state.db, state.blob_store.as_ref(), &state.guard)
    }

    /// Store the photos, then insert the work with its images and tags.
    pub async fn create_work(&self, form: CreateWorkForm) -> Result<work::Model, AppError> {
        let CreateWorkForm {
            fields,
            main_image,
            sub_images,
        } = form;
        ensure_project_exists(self.db, fields.project_id).await?;

        let mut uploads = vec![PendingUpload::new(main_image, ImageRole::Main, "mainImage")];
        uploads.extend(
            sub_images
                .into_iter()
                .enumerate()
                .map(|(i, file)| PendingUpload::new(file, ImageRole::Sub(i), "subImages")),
        );
        let accepted = intake::accept_all(self.guard, uploads, Utc::now()).await?;
        let mut references = intake::store_all(self.store, &accepted).await?.into_iter();
        let main_image = references
            .next()
            .ok_or_else(|| AppError::Internal("main image reference missing".into()))?;
        let sub_urls: Vec<String> = references.collect();

        let txn = self.db.begin().await?;
        if let Err(e) = lock_project(&txn, fields.project_id).await {
            drop(txn);
            for url in std::iter::once(&main_image).chain(&sub_urls) {
                self.store.discard(url).await;
            }
            return Err(e);
        }

        let now = Utc::now();
        let mut active = work::ActiveModel {
            main_image: Set(main_image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        apply_fields(&mut active, &fields);
        let model = active.insert(&txn).await?;

        for (index, url) in sub_urls.iter().enumerate() {
            image::ActiveModel {
                url: Set(url.clone()),
                work_id: Set(model.id),
                position: Set(position_of(index)?),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        tags::connect_tags(&txn, model.id, &fields.tags).await?;

        txn.commit().await?;
        info!(
            work_id = model.id,
            images = sub_urls.len(),
            tags = fields.tags.len(),
            "Created work"
        );
        Ok(model)
    }

    /// Reconcile a work with an edit submission.
    ///
    /// Inside one transaction: scalar fields and tags are replaced, listed
    /// images owned by this work are removed, uploads are attached at
    /// [`UNPOSITIONED_TAIL`], then `image_order` assigns final positions.
    /// Blobs of removed images and a replaced main image are deleted after
    /// commit, best-effort.
    pub async fn update_work(&self, id: i32, form: UpdateWorkForm) -> Result<work::Model, AppError> {
        let UpdateWorkForm {
            fields,
            main_image,
            sub_images,
            delete_image_urls,
            image_order,
        } = form;

        find_work(self.db, id).await?;
        ensure_project_exists(self.db, fields.project_id).await?;

        let replaces_main = main_image.is_some();
        let mut uploads: Vec<PendingUpload> = main_image
            .into_iter()
            .map(|file| PendingUpload::new(file, ImageRole::Main, "mainImage"))
            .collect();
        uploads.extend(
            sub_images
                .into_iter()
                .enumerate()
                .map(|(i, file)| PendingUpload::new(file, ImageRole::Sub(i), "subImages")),
        );
        let accepted = intake::accept_all(self.guard, uploads, Utc::now()).await?;
        let mut references = intake::store_all(self.store, &accepted).await?.into_iter();
        let new_main = if replaces_main {
            references.next()
        } else {
            None
        };
        let new_urls: Vec<String> = references.collect();

        let txn = self.db.begin().await?;
        if let Err(e) = lock_project(&txn, fields.project_id).await {
            drop(txn);
            for url in new_main.iter().chain(&new_urls) {
                self.store.discard(url).await;
            }
            return Err(e);
        }
        let current = find_work_for_update(&txn, id).await?;
        let previous_main = current.main_image.clone();

        let mut active: work::ActiveModel = current.into();
        apply_fields(&mut active, &fields);
        if let Some(url) = &new_main {
            active.main_image = Set(url.clone());
        }
        active.updated_at = Set(Utc::now());
        let model = active.update(&txn).await?;

        tags::replace_tags(&txn, id, &fields.tags).await?;

        let removed = delete_owned_images(&txn, id, &delete_image_urls).await?;
        let inserted = insert_unpositioned(&txn, id, &new_urls).await?;
        for (image_id, position) in plan_positions(&image_order, &inserted) {
            image::Entity::update_many()
                .filter(image::Column::Id.eq(image_id))
                .filter(image::Column::WorkId.eq(id))
                .col_expr(image::Column::Position, Expr::value(position))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        info!(
            work_id = id,
            removed = removed.len(),
            added = inserted.len(),
            replaced_main = new_main.is_some(),
            "Updated work"
        );

        for url in &removed {
            self.store.discard(url).await;
        }
        if new_main.is_some() {
            self.store.discard(&previous_main).await;
        }

        Ok(model)
    }

    /// Remove a work, its images and tag links, then its blobs.
    pub async fn delete_work(&self, id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let existing = find_work_for_update(&txn, id).await?;

        let image_urls: Vec<String> = image::Entity::find()
            .filter(image::Column::WorkId.eq(id))
            .select_only()
            .column(image::Column::Url)
            .into_tuple::<String>()
            .all(&txn)
            .await?;

        work_tag::Entity::delete_many()
            .filter(work_tag::Column::WorkId.eq(id))
            .exec(&txn)
            .await?;
        image::Entity::delete_many()
            .filter(image::Column::WorkId.eq(id))
            .exec(&txn)
            .await?;
        work::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(work_id = id, images = image_urls.len(), "Deleted work");

        self.store.discard(&existing.main_image).await;
        for url in &image_urls {
            self.store.discard(url).await;
        }
        Ok(())
    }
}

fn apply_fields(active: &mut work::ActiveModel, fields: &WorkFields) {
    active.title = Set(fields.title.clone());
    active.kit_name = Set(fields.kit_name.clone());
    active.maker = Set(fields.maker.clone());
    active.scale = Set(fields.scale.clone());
    active.genre = Set(fields.genre.clone());
    active.paints = Set(fields.paints.clone());
    active.description = Set(fields.description.clone());
    active.project_id = Set(fields.project_id);
    active.end_date = Set(fields.end_date);
}

fn position_of(index: usize) -> Result<i32, AppError> {
    i32::try_from(index).map_err(|_| AppError::Validation("Too many images".into()))
}

/// Pair each `image_order` slot with the image it positions.
///
/// `New` slots consume `inserted` in upload order. Slots beyond the uploads
/// are skipped; uploads beyond the slots keep [`UNPOSITIONED_TAIL`].
pub fn plan_positions(order: &[OrderEntry], inserted: &[i32]) -> Vec<(i32, i32)> {
    let mut fresh = inserted.iter().copied();
    order
        .iter()
        .zip(0i32..)
        .filter_map(|(entry, position)| {
            let image_id = match entry {
                OrderEntry::Existing(id) => Some(*id),
                OrderEntry::New => fresh.next(),
            }?;
            Some((image_id, position))
        })
        .collect()
}

pub(crate) async fn find_work<C: ConnectionTrait>(db: &C, id: i32) -> Result<work::Model, AppError> {
    work::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Work not found".into()))
}

async fn find_work_for_update(txn: &DatabaseTransaction, id: i32) -> Result<work::Model, AppError> {
    work::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Work not found".into()))
}

async fn ensure_project_exists<C: ConnectionTrait>(
    db: &C,
    project_id: Option<i32>,
) -> Result<(), AppError> {
    let Some(project_id) = project_id else {
        return Ok(());
    };
    let found = project::Entity::find_by_id(project_id).count(db).await?;
    if found == 0 {
        return Err(AppError::field("projectId", "Project not found"));
    }
    Ok(())
}

/// Re-check the project inside the transaction and keep it from being
/// deleted until commit.
async fn lock_project(txn: &DatabaseTransaction, project_id: Option<i32>) -> Result<(), AppError> {
    let Some(project_id) = project_id else {
        return Ok(());
    };
    project::Entity::find_by_id(project_id)
        .lock(LockType::Share)
        .one(txn)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::field("projectId", "Project not found"))
}

/// Delete the listed images that belong to `work_id` and return their urls.
/// Urls of other works' images, or of nothing, are ignored.
async fn delete_owned_images<C: ConnectionTrait>(
    conn: &C,
    work_id: i32,
    urls: &[String],
) -> Result<Vec<String>, DbErr> {
    if urls.is_empty() {
        return Ok(Vec::new());
    }

    let doomed: Vec<(i32, String)> = image::Entity::find()
        .filter(image::Column::WorkId.eq(work_id))
        .filter(image::Column::Url.is_in(urls.iter().cloned()))
        .select_only()
        .column(image::Column::Id)
        .column(image::Column::Url)
        .into_tuple()
        .all(conn)
        .await?;
    if doomed.is_empty() {
        return Ok(Vec::new());
    }

    image::Entity::delete_many()
        .filter(image::Column::Id.is_in(doomed.iter().map(|(id, _)| *id)))
        .exec(conn)
        .await?;

    Ok(doomed.into_iter().map(|(_, url)| url).collect())
}

/// Attach new images at the tail, returning their ids in upload order.
async fn insert_unpositioned<C: ConnectionTrait>(
    conn: &C,
    work_id: i32,
    urls: &[String],
) -> Result<Vec<i32>, DbErr> {
    let mut ids = Vec::with_capacity(urls.len());
    for url in urls {
        let model = image::ActiveModel {
            url: Set(url.clone()),
            work_id: Set(work_id),
            position: Set(UNPOSITIONED_TAIL),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        ids.push(model.id);
    }
    Ok(ids)
}
