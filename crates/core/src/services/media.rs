//! External media host client.
//!
//! Uploads are delegated to a third-party asset host which stores the blob
//! and returns a public URL plus the canonical file name it assigned.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use snapfeed_common::{AppError, AppResult, IdGenerator, config::MediaConfig};

/// Result of a successful upload to the media host.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    /// Public URL of the stored asset.
    pub url: String,
    /// Canonical file name assigned by the host.
    pub file_name: String,
}

/// Media host contract.
///
/// Any non-success response from the host is an [`AppError::Upload`];
/// callers must not persist a post in that case.
#[async_trait::async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload a blob, returning its public URL and canonical name.
    async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> AppResult<MediaUpload>;
}

/// Wire shape of the host's upload response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
    name: String,
}

/// HTTP client for the configured asset host.
#[derive(Clone)]
pub struct RemoteMediaHost {
    http_client: reqwest::Client,
    upload_url: String,
    api_key: Option<String>,
}

impl RemoteMediaHost {
    /// Create a client from the media configuration.
    #[must_use]
    #[allow(clippy::expect_used)] // Client build only fails with incompatible TLS settings
    pub fn new(config: &MediaConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            upload_url: config.upload_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait::async_trait]
impl MediaHost for RemoteMediaHost {
    async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        content_type: &str,
    ) -> AppResult<MediaUpload> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::BadRequest(format!("Invalid content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("fileName", file_name.to_string())
            .text("useUniqueFileName", "true");

        let mut request = self.http_client.post(&self.upload_url).multipart(form);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Media host unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!(
                "Media host returned {status}: {body}"
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid media host response: {e}")))?;

        Ok(MediaUpload {
            url: parsed.url,
            file_name: parsed.name,
        })
    }
}

/// A scratch file staged on local disk for the duration of one upload.
///
/// The file is removed when the guard is dropped, so every exit path
/// (success, host failure, I/O error) releases the temporary storage.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Spool `data` into `dir` under a random name, keeping the extension
    /// of the client-supplied file name.
    pub async fn spool(dir: &Path, file_name: &str, data: &[u8]) -> AppResult<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let path = dir.join(format!("upload-{}{ext}", IdGenerator::new().generate_token()));

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write scratch file: {e}")))?;

        Ok(Self { path })
    }

    /// Path of the staged file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the staged bytes back.
    pub async fn read(&self) -> AppResult<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read scratch file: {e}")))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
            }
        }
    }
}
