//! Uploading images to the remote asset host.
//!
//! [`Uploader`] is the seam; [`CloudinaryUploader`] is the production
//! implementation, posting an unsigned multipart upload and reading
//! `secure_url` out of the JSON reply.
//!
//! There is no rollback. Once the host has accepted a file it keeps it, even
//! if something later in the same batch fails.

use crate::config::UploadConfig;
use crate::types::ImageAsset;
use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Per-file upload failure. Recorded by the orchestrator; never aborts a batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rejected by host (HTTP {status}): {message}")]
    RejectedByHost { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum UploaderSetupError {
    #[error("missing upload credential: {0}")]
    MissingCredential(&'static str),
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Trait for asset hosts.
///
/// `Sync` because uploads run in parallel on the rayon pool.
pub trait Uploader: Sync {
    /// Send one file and return its durable URL.
    fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Deserialize)]
struct HostErrorBody {
    error: HostErrorMessage,
}

#[derive(Deserialize)]
struct HostErrorMessage {
    message: String,
}

/// Classify a host reply.
///
/// - non-2xx → [`UploadError::RejectedByHost`], using the host's
///   `{"error":{"message":…}}` when present, else the raw body
/// - 2xx without JSON or without a non-empty `secure_url` →
///   [`UploadError::MalformedResponse`]
pub fn parse_upload_response(status: u16, body: &str) -> Result<String, UploadError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<HostErrorBody>(body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        return Err(UploadError::RejectedByHost { status, message });
    }

    let parsed: UploadResponse = serde_json::from_str(body)
        .map_err(|e| UploadError::MalformedResponse(format!("invalid JSON: {e}")))?;
    match parsed.secure_url {
        Some(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(UploadError::MalformedResponse(
            "response has no secure_url".into(),
        )),
    }
}

fn network_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        UploadError::Network(format!("timed out: {err}"))
    } else {
        UploadError::Network(err.to_string())
    }
}

/// Unsigned uploads to a Cloudinary-style endpoint.
#[derive(Debug, Clone)]
pub struct CloudinaryUploader {
    client: Client,
    url: String,
    upload_preset: String,
}

impl CloudinaryUploader {
    /// Build from config. Both the cloud name and the upload preset are required.
    pub fn new(config: &UploadConfig) -> Result<Self, UploaderSetupError> {
        if config.cloud_name.trim().is_empty() {
            return Err(UploaderSetupError::MissingCredential(
                "upload.cloud_name (or CLOUDINARY_CLOUD_NAME)",
            ));
        }
        if config.upload_preset.trim().is_empty() {
            return Err(UploaderSetupError::MissingCredential(
                "upload.upload_preset (or CLOUDINARY_UPLOAD_PRESET)",
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Use a preconfigured client (proxies, custom TLS, tests).
    pub fn with_client(client: Client, config: &UploadConfig) -> Self {
        Self {
            client,
            url: upload_url(&config.endpoint, &config.cloud_name),
            upload_preset: config.upload_preset.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn upload_url(endpoint: &str, cloud_name: &str) -> String {
    format!(
        "{}/{}/image/upload",
        endpoint.trim_end_matches('/'),
        cloud_name.trim()
    )
}

impl Uploader for CloudinaryUploader {
    fn upload(&self, asset: &ImageAsset) -> Result<String, UploadError> {
        let file = multipart::Part::bytes(asset.bytes.clone()).file_name(asset.filename.clone());
        let form = multipart::Form::new()
            .part("file", file)
            .text("upload_preset", self.upload_preset.clone());

        tracing::debug!(file = %asset.filename, bytes = asset.len(), url = %self.url, "uploading");
        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .map_err(network_error)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(network_error)?;

        let url = parse_upload_response(status, &body)?;
        tracing::debug!(file = %asset.filename, %url, "uploaded");
        Ok(url)
    }
}
