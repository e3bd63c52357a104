use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Maximum accepted upload size, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];
pub const PRESCRIPTION_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "application/pdf"];

/// A file received from a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub url: String,
    pub path: PathBuf,
}

/// Writes uploads under `root/<folder>/` and hands out URLs under `public_base`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    root: PathBuf,
    public_base: String,
}

impl UploadStore {
    pub fn new(root: impl AsRef<Path>, public_base: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.as_ref().to_path_buf(),
                public_base: public_base.trim_end_matches('/').to_string(),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    pub async fn save(
        &self,
        folder: &str,
        upload: &Upload,
        allowed: &[&str],
    ) -> AppResult<StoredFile> {
        let ext = check_upload(upload, allowed)?;

        let dir = self.inner.root.join(folder);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let name = format!("{}.{ext}", Uuid::new_v4());
        let path = dir.join(&name);
        fs::write(&path, &upload.bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        tracing::debug!(path = %path.display(), bytes = upload.bytes.len(), "upload stored");

        Ok(StoredFile {
            url: format!("{}/{folder}/{name}", self.inner.public_base),
            path,
        })
    }

    /// Removes a file previously returned by [`UploadStore::save`]. Unknown
    /// URLs and already-missing files are ignored.
    pub async fn remove(&self, url: &str) {
        let Some(relative) = url
            .strip_prefix(&self.inner.public_base)
            .map(|rest| rest.trim_start_matches('/'))
        else {
            return;
        };
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            return;
        }
        let path = self.inner.root.join(relative);
        if let Err(err) = fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %path.display(), "failed to remove upload");
            }
        }
    }
}

/// Validates size and content type, returning the file extension to store under.
pub fn check_upload(upload: &Upload, allowed: &[&str]) -> AppResult<&'static str> {
    if upload.bytes.is_empty() {
        return Err(AppError::BadRequest("file is empty".into()));
    }
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("file exceeds 5 MiB".into()));
    }
    if !allowed.contains(&upload.content_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "unsupported file type {}",
            upload.content_type
        )));
    }
    let ext = match upload.content_type.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        other => {
            return Err(AppError::BadRequest(format!("unsupported file type {other}")));
        }
    };
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, len: usize) -> Upload {
        Upload {
            file_name: "scan".into(),
            content_type: content_type.into(),
            bytes: vec![7; len],
        }
    }

    #[test]
    fn rejects_empty_oversized_and_unknown_types() {
        assert!(check_upload(&upload("image/png", 0), IMAGE_TYPES).is_err());
        assert!(check_upload(&upload("image/png", MAX_UPLOAD_BYTES + 1), IMAGE_TYPES).is_err());
        assert!(check_upload(&upload("application/pdf", 10), IMAGE_TYPES).is_err());
        assert_eq!(
            check_upload(&upload("application/pdf", 10), PRESCRIPTION_TYPES).ok(),
            Some("pdf")
        );
    }

    #[tokio::test]
    async fn save_then_remove_round_trips_through_disk() {
        let root = std::env::temp_dir().join(format!("pharmacy-uploads-{}", Uuid::new_v4()));
        let store = UploadStore::new(&root, "/uploads/");

        let stored = store
            .save("prescriptions", &upload("image/jpeg", 32), PRESCRIPTION_TYPES)
            .await
            .expect("save");
        assert!(stored.url.starts_with("/uploads/prescriptions/"));
        assert!(stored.url.ends_with(".jpg"));
        assert!(stored.path.starts_with(store.root()));
        assert!(stored.path.exists());

        store.remove(&stored.url).await;
        assert!(!stored.path.exists());

        let _ = std::fs::remove_dir_all(root);
    }
}
