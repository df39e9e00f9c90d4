use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::AppError;

/// One file part of a multipart submission.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A fully buffered `multipart/form-data` submission.
///
/// File parts with no bytes are dropped: browsers send them for file inputs
/// left empty.
#[derive(Debug, Default)]
pub struct FormSubmission {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<UploadedFile>>,
}

impl FormSubmission {
    /// Buffer every part. A file part larger than `max_file_size` is rejected
    /// as soon as it crosses the limit.
    pub async fn read(multipart: &mut Multipart, max_file_size: u64) -> Result<Self, AppError> {
        let mut form = FormSubmission::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let mut data = Vec::new();
                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
                    {
                        if (data.len() + chunk.len()) as u64 > max_file_size {
                            return Err(AppError::field(&name, too_large_message(max_file_size)));
                        }
                        data.extend_from_slice(&chunk);
                    }

                    if data.is_empty() {
                        continue;
                    }
                    form.files.entry(name).or_default().push(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
                    form.texts.entry(name).or_default().push(text);
                }
            }
        }

        Ok(form)
    }

    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a repeated text field, in submission order.
    pub fn texts(&self, name: &str) -> &[String] {
        self.texts.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.take_files(name).into_iter().next()
    }

    /// All files submitted under `name`, in submission order.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        self.files.remove(name).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.texts
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    #[cfg(test)]
    pub fn with_file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.files
            .entry(name.to_string())
            .or_default()
            .push(UploadedFile {
                file_name: file_name.to_string(),
                content_type: None,
                data: data.to_vec(),
            });
        self
    }
}

pub fn too_large_message(limit: u64) -> String {
    format!("File must be {}MB or smaller", limit.div_ceil(1024 * 1024))
}
