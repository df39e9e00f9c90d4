use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named series of works. Deleting it leaves the works in place.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Optional cover photo blob reference.
    pub main_image: Option<String>,

    #[sea_orm(has_many)]
    pub works: HasMany<super::work::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
