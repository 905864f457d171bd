//! HTTP client for the ImageKit media API.
//!
//! Uploads go to `{upload_url}/files/upload` as multipart forms, deletes to
//! `DELETE {api_url}/files/{id}`. Both authenticate with HTTP basic auth using the
//! private key as user name and an empty password.

use async_trait::async_trait;
use reqwest::{multipart::Form, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::{DeleteOutcome, ImageStore, ImageStoreError};
use crate::config::ImageKitConfig;
use crate::models::ImageRef;

/// Message ImageKit returns when deleting an id it does not know.
const FILE_NOT_FOUND_MESSAGE: &str = "The requested file does not exist.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: String,
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Clone)]
pub struct ImageKitClient {
    client: reqwest::Client,
    private_key: String,
    upload_url: String,
    api_url: String,
}

impl ImageKitClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ImageStoreError::Transport` if the underlying HTTP client cannot be built.
    pub fn new(config: &ImageKitConfig) -> Result<Self, ImageStoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &ImageKitConfig) -> Self {
        Self {
            client,
            private_key: config.private_key.clone(),
            upload_url: config.upload_url.trim_end_matches('/').to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }
}

async fn api_error(response: Response) -> ImageStoreError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    ImageStoreError::Api { status, message }
}

#[async_trait]
impl ImageStore for ImageKitClient {
    async fn upload(
        &self,
        file: &str,
        file_name: &str,
        folder: &str,
    ) -> Result<ImageRef, ImageStoreError> {
        let form = Form::new()
            .text("file", file.to_string())
            .text("fileName", file_name.to_string())
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(format!("{}/files/upload", self.upload_url))
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let uploaded: UploadResponse = response.json().await?;
        log::debug!("uploaded {} to {} as {}", file_name, folder, uploaded.file_id);
        Ok(ImageRef {
            id: uploaded.file_id,
            path: uploaded.file_path,
        })
    }

    async fn delete(&self, file_id: &str) -> Result<DeleteOutcome, ImageStoreError> {
        let response = self
            .client
            .delete(format!("{}/files/{}", self.api_url, file_id))
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(DeleteOutcome::Deleted);
        }

        let not_found_status = response.status() == StatusCode::NOT_FOUND;
        match api_error(response).await {
            ImageStoreError::Api { message, .. }
                if not_found_status || message == FILE_NOT_FOUND_MESSAGE =>
            {
                Ok(DeleteOutcome::NotFound)
            }
            error => Err(error),
        }
    }
}
