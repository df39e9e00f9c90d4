use serde::Serialize;

use crate::error::{AppError, FieldErrors};

/// Body returned by every successful mutation.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MutationResponse {
    #[schema(example = true)]
    pub success: bool,
    /// Id of the created record, when one was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl MutationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            id: None,
        }
    }

    pub fn created(id: i32) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Collects field-level messages so a form reports every problem at once.
#[derive(Debug, Default)]
pub struct FormErrors(FieldErrors);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Required text: trimmed, 1..=`max` characters.
    pub fn required(&mut self, field: &str, label: &str, value: Option<&str>, max: usize) -> String {
        let value = value.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            self.add(field, format!("{label} is required"));
        } else if value.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
        value.to_string()
    }

    /// Optional text: trimmed, blank becomes `None`, at most `max` characters.
    pub fn optional(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        max: usize,
    ) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        if value.chars().count() > max {
            self.add(field, format!("{label} must be at most {max} characters"));
        }
        Some(value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidFields(self.0))
        }
    }
}

impl From<FormErrors> for FieldErrors {
    fn from(errors: FormErrors) -> Self {
        errors.0
    }
}
