use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::form::{FormSubmission, UploadedFile};
use crate::utils::tags::normalize_tags;

use super::shared::FormErrors;

/// Longest accepted `imageOrder` list.
pub const MAX_ORDER_ENTRIES: usize = 256;

/// Scalar fields shared by the create and update forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkFields {
    pub title: String,
    pub kit_name: Option<String>,
    pub maker: Option<String>,
    pub scale: Option<String>,
    pub genre: Option<String>,
    pub paints: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub project_id: Option<i32>,
    pub end_date: Option<NaiveDate>,
}

impl WorkFields {
    fn parse(form: &FormSubmission, errors: &mut FormErrors) -> Self {
        let title = errors.required("title", "Title", form.text("title"), 100);
        let kit_name = errors.optional("kitName", "Kit name", form.text("kitName"), 100);
        let maker = errors.optional("maker", "Maker", form.text("maker"), 100);
        let scale = errors.optional("scale", "Scale", form.text("scale"), 50);
        let genre = errors.optional("genre", "Genre", form.text("genre"), 50);
        let paints = errors.optional("paints", "Paints", form.text("paints"), 1000);
        let description =
            errors.optional("description", "Description", form.text("description"), 5000);

        let project_id = match form.text("projectId").map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("projectId", "Invalid project");
                    None
                }
            },
        };

        let end_date = match form.text("endDate").map(str::trim) {
            None | Some("") => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("endDate", "Completion date must be YYYY-MM-DD");
                    None
                }
            },
        };

        Self {
            title,
            kit_name,
            maker,
            scale,
            genre,
            paints,
            description,
            tags: normalize_tags(form.text("tags").unwrap_or_default()),
            project_id,
            end_date,
        }
    }
}

pub struct CreateWorkForm {
    pub fields: WorkFields,
    pub main_image: UploadedFile,
    pub sub_images: Vec<UploadedFile>,
}

impl CreateWorkForm {
    pub fn parse(mut form: FormSubmission) -> Result<Self, AppError> {
        let mut errors = FormErrors::default();
        let fields = WorkFields::parse(&form, &mut errors);
        let main_image = form.take_file("mainImage");
        if main_image.is_none() {
            errors.add("mainImage", "Main image is required");
        }
        let sub_images = form.take_files("subImages");

        errors.into_result()?;
        let main_image = main_image.ok_or_else(|| AppError::field("mainImage", "Main image is required"))?;

        Ok(Self {
            fields,
            main_image,
            sub_images,
        })
    }
}

/// One slot of the requested final image sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEntry {
    /// An image already attached to the work.
    Existing(i32),
    /// The next not-yet-positioned upload from this submission.
    New,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderEntry {
    id: Option<i32>,
    #[serde(default)]
    is_new: bool,
}

/// Parse the `imageOrder` JSON array.
pub fn parse_image_order(raw: &str) -> Result<Vec<OrderEntry>, String> {
    let entries: Vec<RawOrderEntry> =
        serde_json::from_str(raw).map_err(|_| "Image order is malformed".to_string())?;
    if entries.len() > MAX_ORDER_ENTRIES {
        return Err(format!(
            "Image order may list at most {MAX_ORDER_ENTRIES} images"
        ));
    }

    entries
        .into_iter()
        .map(|entry| match (entry.is_new, entry.id) {
            (true, _) => Ok(OrderEntry::New),
            (false, Some(id)) => Ok(OrderEntry::Existing(id)),
            (false, None) => Err("Image order entries need an id or isNew".to_string()),
        })
        .collect()
}

pub struct UpdateWorkForm {
    pub fields: WorkFields,
    pub main_image: Option<UploadedFile>,
    pub sub_images: Vec<UploadedFile>,
    pub delete_image_urls: Vec<String>,
    pub image_order: Vec<OrderEntry>,
}

impl UpdateWorkForm {
    pub fn parse(mut form: FormSubmission) -> Result<Self, AppError> {
        let mut errors = FormErrors::default();
        let fields = WorkFields::parse(&form, &mut errors);

        let delete_image_urls = form
            .texts("deleteImageUrls")
            .iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();

        let image_order = match form.text("imageOrder").map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) => parse_image_order(raw).unwrap_or_else(|message| {
                errors.add("imageOrder", message);
                Vec::new()
            }),
        };

        errors.into_result()?;

        Ok(Self {
            fields,
            main_image: form.take_file("mainImage"),
            sub_images: form.take_files("subImages"),
            delete_image_urls,
            image_order,
        })
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkListQuery {
    /// 1-based page number (default 1).
    pub page: Option<u64>,
    /// Works per page (default 8, at most 100).
    pub page_size: Option<u64>,
    /// Case-insensitive substring of the title or kit name.
    pub search: Option<String>,
    pub genre: Option<String>,
    /// Exact tag name.
    pub tag: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct TagSummary {
    pub id: i32,
    pub name: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct ProjectRef {
    pub id: i32,
    pub name: String,
}

#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkListItem {
    pub id: i32,
    pub title: String,
    pub kit_name: Option<String>,
    pub maker: Option<String>,
    pub scale: Option<String>,
    pub genre: Option<String>,
    pub main_image: String,
    pub end_date: Option<NaiveDate>,
    pub project: Option<ProjectRef>,
    pub tags: Vec<TagSummary>,
    /// Sub-image ids in display order.
    pub image_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkListResponse {
    pub works: Vec<WorkListItem>,
    pub has_more: bool,
    pub total: u64,
}

impl WorkListResponse {
    pub fn empty() -> Self {
        Self {
            works: Vec::new(),
            has_more: false,
            total: 0,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, utoipa::ToSchema)]
pub struct ImageResponse {
    pub id: i32,
    pub url: String,
    pub order: i32,
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkDetail {
    pub id: i32,
    pub title: String,
    pub kit_name: Option<String>,
    pub maker: Option<String>,
    pub scale: Option<String>,
    pub genre: Option<String>,
    pub paints: Option<String>,
    pub description: Option<String>,
    pub main_image: String,
    pub end_date: Option<NaiveDate>,
    pub project: Option<ProjectRef>,
    pub tags: Vec<TagSummary>,
    /// Sub-images sorted by `(order, id)`.
    pub images: Vec<ImageResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
