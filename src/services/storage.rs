use std::path::{Path, PathBuf};

use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use uuid::Uuid;

use crate::config::{S3Config, StorageBackendConfig};
use crate::error::{AppError, AppResult};

/// Image extensions accepted for avatars and post images.
const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Media storage backend: local `uploads/` directory or an
/// S3-compatible bucket. `store` returns the public path/URL persisted
/// on the owning document.
pub enum MediaStorage {
    Local(LocalStorage),
    S3(S3Storage),
}

impl MediaStorage {
    pub async fn from_config(config: &StorageBackendConfig) -> AppResult<Self> {
        match config {
            StorageBackendConfig::Local { upload_dir } => {
                let storage = LocalStorage::new(PathBuf::from(upload_dir));
                storage.ensure_dir().await?;
                Ok(MediaStorage::Local(storage))
            }
            StorageBackendConfig::S3(s3) => Ok(MediaStorage::S3(S3Storage::new(s3).await?)),
        }
    }

    /// Store image bytes under a fresh name derived from the original
    /// filename's extension. Rejects non-image extensions.
    pub async fn store_image(&self, original_filename: &str, bytes: Vec<u8>) -> AppResult<String> {
        let extension = sanitize_extension(original_filename).ok_or_else(|| {
            AppError::BadRequest("Only .jpg, .jpeg, .png files are allowed".to_string())
        })?;
        let stored_name = format!("{}.{}", Uuid::new_v4(), extension);

        match self {
            MediaStorage::Local(local) => local.put(&stored_name, bytes).await,
            MediaStorage::S3(s3) => s3.put(&stored_name, bytes, &extension).await,
        }
    }

    /// Root directory for locally stored files, when applicable.
    pub fn local_root(&self) -> Option<&Path> {
        match self {
            MediaStorage::Local(local) => Some(&local.root),
            MediaStorage::S3(_) => None,
        }
    }
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("failed to create upload dir: {e}")))
    }

    async fn put(&self, name: &str, bytes: Vec<u8>) -> AppResult<String> {
        let path = self.root.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("failed to write {}: {e}", path.display())))?;
        Ok(format!("/uploads/{name}"))
    }
}

pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Build an S3 client from the provided configuration.
    pub async fn new(config: &S3Config) -> AppResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "ripple-api",
        );

        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn put(&self, name: &str, bytes: Vec<u8>, extension: &str) -> AppResult<String> {
        let content_type = match extension {
            "png" => mime::IMAGE_PNG,
            _ => mime::IMAGE_JPEG,
        };

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(content_type.as_ref())
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        Ok(format!("{}/{}", self.public_base_url, name))
    }
}

/// Extract and validate the extension of an uploaded filename.
/// Returns the lowercase extension, or `None` for anything that is not
/// an accepted image type.
pub fn sanitize_extension(filename: &str) -> Option<String> {
    let extension = Path::new(filename).extension()?.to_str()?.to_lowercase();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Some(extension)
    } else {
        None
    }
}

/// A filename is servable when it cannot escape the upload directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && sanitize_extension(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_extensions_case_insensitively() {
        assert_eq!(sanitize_extension("a.JPG").as_deref(), Some("jpg"));
        assert_eq!(sanitize_extension("b.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(sanitize_extension("c.png").as_deref(), Some("png"));
    }

    #[test]
    fn rejects_non_image_extensions() {
        assert!(sanitize_extension("evil.exe").is_none());
        assert!(sanitize_extension("noext").is_none());
        assert!(sanitize_extension("archive.tar.gz").is_none());
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(!is_safe_filename("../secret.png"));
        assert!(!is_safe_filename("a/b.png"));
        assert!(!is_safe_filename(""));
        assert!(is_safe_filename("avatar.png"));
    }

    #[tokio::test]
    async fn local_storage_writes_and_returns_public_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = MediaStorage::Local(LocalStorage::new(dir.path().to_path_buf()));

        let path = storage
            .store_image("photo.png", vec![1, 2, 3])
            .await
            .expect("store");
        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with(".png"));

        let name = path.trim_start_matches("/uploads/");
        let on_disk = tokio::fs::read(dir.path().join(name)).await.expect("read");
        assert_eq!(on_disk, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn local_storage_rejects_disallowed_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = MediaStorage::Local(LocalStorage::new(dir.path().to_path_buf()));

        let err = storage
            .store_image("script.js", vec![1])
            .await
            .expect_err("should reject");
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
