use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::collection::{RemoteObject, SourceBytes};
use crate::error::StorageError;

/// Pre-signed upload URLs are only valid for a short window.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Short-lived permission to PUT one object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadSlot {
    pub upload_url: String,
    pub public_url: String,
    pub key: Option<String>,
}

impl UploadSlot {
    /// Object key as reported by the signer, or else the path of the public URL.
    pub fn storage_key(&self) -> String {
        if let Some(key) = &self.key {
            return key.clone();
        }
        Url::parse(&self.public_url)
            .map(|url| url.path().trim_start_matches('/').to_string())
            .unwrap_or_else(|_| self.public_url.clone())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotRequest<'a> {
    file_name: &'a str,
    file_type: &'a str,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    upload_url: Option<String>,
    #[serde(default, alias = "imageUrl")]
    public_url: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SlotResponse {
    pub fn into_slot(self) -> Result<UploadSlot, StorageError> {
        let message = self.message.unwrap_or_else(|| "no upload URL returned".to_string());
        if self.success == Some(false) {
            return Err(StorageError::SlotRejected(message));
        }
        match (self.upload_url, self.public_url) {
            (Some(upload_url), Some(public_url)) => Ok(UploadSlot {
                upload_url,
                public_url,
                key: self.key,
            }),
            _ => Err(StorageError::SlotRejected(message)),
        }
    }
}

/// Object storage reached through pre-signed URLs.
pub trait StorageService: Send + Sync {
    fn request_upload_slot(&self, file_name: &str, mime: &str) -> Result<UploadSlot, StorageError>;

    fn upload(&self, slot: &UploadSlot, source: &SourceBytes) -> Result<(), StorageError>;

    /// Requests a slot, uploads the bytes and reports where they ended up.
    fn store(&self, file_name: &str, source: &SourceBytes) -> Result<RemoteObject, StorageError> {
        let slot = self.request_upload_slot(file_name, &source.mime)?;
        self.upload(&slot, source)?;
        Ok(RemoteObject {
            storage_key: slot.storage_key(),
            remote_url: slot.public_url,
        })
    }
}

/// Talks to an HTTP signer that answers `{fileName, fileType}` with
/// `{uploadUrl, publicUrl | imageUrl, key?}`.
pub struct PresignedStorage {
    client: Client,
    endpoint: Url,
}

impl PresignedStorage {
    pub fn new(endpoint: Url) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(StorageError::Client)?;
        Ok(Self { client, endpoint })
    }
}

impl StorageService for PresignedStorage {
    fn request_upload_slot(&self, file_name: &str, mime: &str) -> Result<UploadSlot, StorageError> {
        debug!(file_name, mime, endpoint = %self.endpoint, "requesting upload slot");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SlotRequest {
                file_name,
                file_type: mime,
            })
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(StorageError::Slot)?;
        let body: SlotResponse = response.json().map_err(StorageError::Slot)?;
        body.into_slot()
    }

    fn upload(&self, slot: &UploadSlot, source: &SourceBytes) -> Result<(), StorageError> {
        let response = self
            .client
            .put(&slot.upload_url)
            .header(CONTENT_TYPE, source.mime.as_str())
            .body(source.bytes.to_vec())
            .send()
            .map_err(StorageError::Upload)?;
        if !response.status().is_success() {
            return Err(StorageError::UploadRejected(response.status().as_u16()));
        }
        info!(public_url = %slot.public_url, bytes = source.len(), "uploaded image");
        Ok(())
    }
}
