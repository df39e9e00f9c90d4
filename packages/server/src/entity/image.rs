use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A gallery photo owned by exactly one work.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Blob reference.
    pub url: String,

    pub work_id: i32,
    #[sea_orm(belongs_to, from = "work_id", to = "id")]
    pub work: HasOne<super::work::Entity>,

    /// Display sort key; ties fall back to id. Gaps are allowed.
    #[sea_orm(default_value = 0)]
    pub position: i32,
}

impl ActiveModelBehavior for ActiveModel {}
