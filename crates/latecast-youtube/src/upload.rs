use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use latecast_scheduler::{PublishError, PublishRequest, Publisher};

const UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=multipart&part=snippet,status";

/// Multipart uploader against the Data API videos.insert endpoint.
pub struct YouTubeUploader {
    client: reqwest::Client,
    privacy: String,
}

impl YouTubeUploader {
    /// `privacy` becomes the privacyStatus of every upload.
    pub fn new(privacy: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            privacy: privacy.into(),
        }
    }
}

#[async_trait]
impl Publisher for YouTubeUploader {
    async fn publish(
        &self,
        request: &PublishRequest,
        token: &str,
    ) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(&request.source_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PublishError::SourceMissing(request.source_path.clone())
                }
                _ => PublishError::Network(format!(
                    "cannot read {}: {e}",
                    request.source_path
                )),
            })?;
        debug!(path = %request.source_path, bytes = bytes.len(), "artifact loaded");

        let metadata = serde_json::json!({
            "snippet": {
                "title": request.title,
                "description": request.description,
                "categoryId": "22",
            },
            "status": {
                "privacyStatus": self.privacy,
            },
        });

        let form = multipart::Form::new()
            .part(
                "metadata",
                multipart::Part::text(metadata.to_string())
                    .mime_str("application/json")
                    .map_err(|e| PublishError::Network(e.to_string()))?,
            )
            .part(
                "media",
                multipart::Part::bytes(bytes)
                    .mime_str("application/octet-stream")
                    .map_err(|e| PublishError::Network(e.to_string()))?,
            );

        let response = self
            .client
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Unauthorized(format!("{status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected(format!("{status}: {body}")));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Rejected(format!("unparseable upload response: {e}")))?;
        info!(video_ref = %body.id, "upload accepted by YouTube");
        Ok(body.id)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}
