use std::collections::HashMap;

use axum::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    storage::{MAX_UPLOAD_BYTES, Upload},
};

/// A parsed multipart form: the `file` part plus any text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Upload>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn require_file(&mut self) -> AppResult<Upload> {
        self.file
            .take()
            .ok_or_else(|| AppError::BadRequest("missing `file` part".into()))
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if bytes.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::BadRequest("file exceeds 5 MiB".into()));
            }
            form.file = Some(Upload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Documents the multipart body accepted by upload endpoints.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct FileUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Free-text notes, only read by prescription uploads.
    pub notes: Option<String>,
}
