use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One catalogued build.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub kit_name: Option<String>,
    pub maker: Option<String>,
    pub scale: Option<String>,
    pub genre: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub paints: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>, // in Markdown

    /// Blob reference of the cover photo. Always points at a stored blob.
    pub main_image: String,

    pub project_id: Option<i32>,
    #[sea_orm(belongs_to, from = "project_id", to = "id")]
    pub project: HasOne<super::project::Entity>,

    pub end_date: Option<Date>,

    #[sea_orm(has_many)]
    pub images: HasMany<super::image::Entity>,

    #[sea_orm(has_many, via = "work_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
