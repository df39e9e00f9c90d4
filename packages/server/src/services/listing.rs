//! Read side of the gallery.
//!
//! Collection reads never fail the page: a database error is logged and an
//! empty result returned. Single-record reads report `NotFound`.

use std::collections::HashMap;

use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr, Query as SeaQuery};
use sea_orm::*;
use tracing::{debug, error};

use crate::entity::{image, project, tag, work, work_tag};
use crate::error::AppError;
use crate::models::project::{ProjectDetail, ProjectListItem};
use crate::models::shared::escape_like;
use crate::models::work::{
    ImageResponse, ProjectRef, TagSummary, WorkDetail, WorkListItem, WorkListResponse,
};
use crate::services::gallery::find_work;
use crate::services::project::find_project;

pub const DEFAULT_PAGE_SIZE: u64 = 8;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Default, Clone)]
pub struct WorkFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub tag: Option<String>,
}

/// One page of works, newest first.
///
/// `page` is 1-based; 0 is treated as 1. `page_size` is clamped to
/// `1..=MAX_PAGE_SIZE`.
pub async fn list_works<C: ConnectionTrait>(
    db: &C,
    page: u64,
    page_size: u64,
    filter: &WorkFilter,
) -> WorkListResponse {
    let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
    let Some(skip) = page_offset(page, page_size) else {
        debug!(page, page_size, "Page beyond any result");
        return WorkListResponse::empty();
    };
    match try_list_works(db, skip, page_size, filter).await {
        Ok(response) => response,
        Err(e) => {
            error!("Failed to list works: {e}");
            WorkListResponse::empty()
        }
    }
}

/// Rows to skip for a 1-based `page`; `None` when that is past `u64::MAX`.
fn page_offset(page: u64, page_size: u64) -> Option<u64> {
    (std::cmp::Ord::max(page, 1) - 1).checked_mul(page_size)
}

async fn try_list_works<C: ConnectionTrait>(
    db: &C,
    skip: u64,
    page_size: u64,
    filter: &WorkFilter,
) -> Result<WorkListResponse, DbErr> {
    let mut select = work::Entity::find();

    if let Some(ref search) = filter.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(work::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(work::Column::KitName)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    if let Some(genre) = filter.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        select = select.filter(work::Column::Genre.eq(genre));
    }

    if let Some(name) = filter.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        select = select.filter(
            work::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(work_tag::Column::WorkId)
                    .from(work_tag::Entity)
                    .and_where(
                        work_tag::Column::TagId.in_subquery(
                            SeaQuery::select()
                                .column(tag::Column::Id)
                                .from(tag::Entity)
                                .and_where(tag::Column::Name.eq(name))
                                .to_owned(),
                        ),
                    )
                    .to_owned(),
            ),
        );
    }

    let total = select.clone().count(db).await?;

    let works = select
        .order_by_desc(work::Column::CreatedAt)
        .order_by_desc(work::Column::Id)
        .offset(Some(skip))
        .limit(Some(page_size))
        .all(db)
        .await?;

    let works = summarize(db, works).await?;
    let has_more = skip.saturating_add(works.len() as u64) < total;

    Ok(WorkListResponse {
        works,
        has_more,
        total,
    })
}

/// Every tag name, ascending.
pub async fn list_tags<C: ConnectionTrait>(db: &C) -> Vec<String> {
    let result = tag::Entity::find()
        .select_only()
        .column(tag::Column::Name)
        .order_by_asc(tag::Column::Name)
        .into_tuple::<String>()
        .all(db)
        .await;

    result.unwrap_or_else(|e| {
        error!("Failed to list tags: {e}");
        Vec::new()
    })
}

/// Every project, newest first, with its work count.
pub async fn list_projects<C: ConnectionTrait>(db: &C) -> Vec<ProjectListItem> {
    match try_list_projects(db).await {
        Ok(projects) => projects,
        Err(e) => {
            error!("Failed to list projects: {e}");
            Vec::new()
        }
    }
}

async fn try_list_projects<C: ConnectionTrait>(db: &C) -> Result<Vec<ProjectListItem>, DbErr> {
    let projects = project::Entity::find()
        .order_by_desc(project::Column::CreatedAt)
        .order_by_desc(project::Column::Id)
        .all(db)
        .await?;

    let memberships: Vec<Option<i32>> = work::Entity::find()
        .filter(work::Column::ProjectId.is_not_null())
        .select_only()
        .column(work::Column::ProjectId)
        .into_tuple()
        .all(db)
        .await?;
    let mut counts: HashMap<i32, u64> = HashMap::new();
    for project_id in memberships.into_iter().flatten() {
        *counts.entry(project_id).or_default() += 1;
    }

    Ok(projects
        .into_iter()
        .map(|p| ProjectListItem {
            work_count: counts.get(&p.id).copied().unwrap_or(0),
            id: p.id,
            name: p.name,
            description: p.description,
            main_image: p.main_image,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect())
}

/// A work with its images in display order, tags and project.
pub async fn get_work<C: ConnectionTrait>(db: &C, id: i32) -> Result<WorkDetail, AppError> {
    let work = find_work(db, id).await?;

    let images = image::Entity::find()
        .filter(image::Column::WorkId.eq(id))
        .order_by_asc(image::Column::Position)
        .order_by_asc(image::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|img| ImageResponse {
            id: img.id,
            url: img.url,
            order: img.position,
        })
        .collect();

    let mut tags = load_tags(db, &[id]).await?;
    let project = match work.project_id {
        Some(project_id) => load_project_refs(db, &[project_id]).await?.remove(&project_id),
        None => None,
    };

    Ok(WorkDetail {
        id: work.id,
        title: work.title,
        kit_name: work.kit_name,
        maker: work.maker,
        scale: work.scale,
        genre: work.genre,
        paints: work.paints,
        description: work.description,
        main_image: work.main_image,
        end_date: work.end_date,
        project,
        tags: tags.remove(&id).unwrap_or_default(),
        images,
        created_at: work.created_at,
        updated_at: work.updated_at,
    })
}

/// A project with its works, newest first.
pub async fn get_project<C: ConnectionTrait>(db: &C, id: i32) -> Result<ProjectDetail, AppError> {
    let project = find_project(db, id).await?;

    let works = work::Entity::find()
        .filter(work::Column::ProjectId.eq(id))
        .order_by_desc(work::Column::CreatedAt)
        .order_by_desc(work::Column::Id)
        .all(db)
        .await?;
    let works = summarize(db, works).await?;

    Ok(ProjectDetail {
        id: project.id,
        name: project.name,
        description: project.description,
        main_image: project.main_image,
        works,
        created_at: project.created_at,
        updated_at: project.updated_at,
    })
}

/// Attach image ids, tags and project names to a page of works, keeping
/// the page's order. Three batched queries regardless of page size.
async fn summarize<C: ConnectionTrait>(
    db: &C,
    works: Vec<work::Model>,
) -> Result<Vec<WorkListItem>, DbErr> {
    if works.is_empty() {
        return Ok(Vec::new());
    }
    let work_ids: Vec<i32> = works.iter().map(|w| w.id).collect();

    let image_rows: Vec<(i32, i32)> = image::Entity::find()
        .filter(image::Column::WorkId.is_in(work_ids.clone()))
        .select_only()
        .column(image::Column::WorkId)
        .column(image::Column::Id)
        .order_by_asc(image::Column::Position)
        .order_by_asc(image::Column::Id)
        .into_tuple()
        .all(db)
        .await?;
    let mut image_ids: HashMap<i32, Vec<i32>> = HashMap::new();
    for (work_id, image_id) in image_rows {
        image_ids.entry(work_id).or_default().push(image_id);
    }

    let mut tags = load_tags(db, &work_ids).await?;

    let project_ids: Vec<i32> = works.iter().filter_map(|w| w.project_id).collect();
    let projects = load_project_refs(db, &project_ids).await?;

    Ok(works
        .into_iter()
        .map(|w| WorkListItem {
            image_ids: image_ids.remove(&w.id).unwrap_or_default(),
            tags: tags.remove(&w.id).unwrap_or_default(),
            project: w.project_id.and_then(|pid| projects.get(&pid).cloned()),
            id: w.id,
            title: w.title,
            kit_name: w.kit_name,
            maker: w.maker,
            scale: w.scale,
            genre: w.genre,
            main_image: w.main_image,
            end_date: w.end_date,
            created_at: w.created_at,
            updated_at: w.updated_at,
        })
        .collect())
}

/// Tags per work, each list sorted by name.
async fn load_tags<C: ConnectionTrait>(
    db: &C,
    work_ids: &[i32],
) -> Result<HashMap<i32, Vec<TagSummary>>, DbErr> {
    let links: Vec<(i32, i32)> = work_tag::Entity::find()
        .filter(work_tag::Column::WorkId.is_in(work_ids.iter().copied()))
        .select_only()
        .column(work_tag::Column::WorkId)
        .column(work_tag::Column::TagId)
        .into_tuple()
        .all(db)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let names: HashMap<i32, String> = tag::Entity::find()
        .filter(tag::Column::Id.is_in(links.iter().map(|(_, tag_id)| *tag_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();

    let mut by_work: HashMap<i32, Vec<TagSummary>> = HashMap::new();
    for (work_id, tag_id) in links {
        if let Some(name) = names.get(&tag_id) {
            by_work.entry(work_id).or_default().push(TagSummary {
                id: tag_id,
                name: name.clone(),
            });
        }
    }
    for tags in by_work.values_mut() {
        tags.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(by_work)
}

async fn load_project_refs<C: ConnectionTrait>(
    db: &C,
    project_ids: &[i32],
) -> Result<HashMap<i32, ProjectRef>, DbErr> {
    if project_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let projects = project::Entity::find()
        .filter(project::Column::Id.is_in(project_ids.iter().copied()))
        .all(db)
        .await?;
    Ok(projects
        .into_iter()
        .map(|p| {
            (
                p.id,
                ProjectRef {
                    id: p.id,
                    name: p.name,
                },
            )
        })
        .collect())
}
