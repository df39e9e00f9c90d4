use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::extractors::form::{FormSubmission, UploadedFile};

use super::shared::FormErrors;
use super::work::WorkListItem;

/// Create and update share one form; an absent cover keeps the current one.
pub struct ProjectForm {
    pub name: String,
    pub description: Option<String>,
    pub main_image: Option<UploadedFile>,
}

impl ProjectForm {
    pub fn parse(mut form: FormSubmission) -> Result<Self, AppError> {
        let mut errors = FormErrors::default();
        let name = errors.required("name", "Name", form.text("name"), 100);
        let description =
            errors.optional("description", "Description", form.text("description"), 2000);
        errors.into_result()?;

        Ok(Self {
            name,
            description,
            main_image: form.take_file("mainImage"),
        })
    }
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListItem {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub main_image: Option<String>,
    pub work_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub main_image: Option<String>,
    /// Newest first.
    pub works: Vec<WorkListItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
