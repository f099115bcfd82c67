//! Presigned-URL object storage.
//!
//! Large job documents live in object storage as a zip archive holding a
//! single JSON file named `<stem>.json`. Downloads are plain `GET`s of a
//! presigned URL; uploads are multipart `POST`s carrying the presigned form
//! fields followed by the archive as the `file` part.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::config::OqtopusConfig;
use crate::error::{OqtopusResult, StorageError};

/// A JSON object as stored in one archive.
pub type JsonObject = serde_json::Map<String, Value>;

/// Default transfer timeout.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);

/// Presigned `POST` target: URL plus the form fields that authorize it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    /// Upload URL.
    pub url: String,
    /// Form fields to send with the file.
    pub fields: PresignedFields,
}

/// Presigned form fields.
///
/// Field names follow the storage service's wire names, which are not valid
/// Rust identifiers; serde restores them on (de)serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedFields {
    /// Object key, e.g. `job_id/input.zip`.
    pub key: String,
    #[serde(rename = "AWSAccessKeyId", default, skip_serializing_if = "Option::is_none")]
    pub aws_access_key_id: Option<String>,
    #[serde(rename = "x-amz-security-token", default, skip_serializing_if = "Option::is_none")]
    pub x_amz_security_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Any other field, sent verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PresignedFields {
    /// Fields keyed by their wire names.
    pub fn to_form(&self) -> BTreeMap<String, String> {
        let mut form = self.extra.clone();
        form.insert("key".into(), self.key.clone());
        let optional = [
            ("AWSAccessKeyId", &self.aws_access_key_id),
            ("x-amz-security-token", &self.x_amz_security_token),
            ("policy", &self.policy),
            ("signature", &self.signature),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                form.insert(name.into(), value.clone());
            }
        }
        form
    }

    /// Archive file name: the last path segment of the key.
    pub fn file_name(&self) -> String {
        Path::new(&self.key)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.key.clone())
    }
}

/// Transfer of single-document archives.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download and unpack the object behind a presigned URL.
    async fn download(&self, url: &str, timeout: Duration) -> OqtopusResult<JsonObject>;

    /// Pack and upload an object to a presigned target.
    async fn upload(
        &self,
        target: &PresignedUpload,
        data: &JsonObject,
        timeout: Duration,
    ) -> OqtopusResult<()>;
}

/// HTTP implementation of [`ObjectStore`].
#[derive(Debug, Clone, Default)]
pub struct OqtopusStorage {
    client: Client,
}

impl OqtopusStorage {
    /// Storage helper with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage helper honouring the configured proxy.
    pub fn from_config(config: &OqtopusConfig) -> OqtopusResult<Self> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
        if let Some(proxy) = config.proxy() {
            let proxy = reqwest::Proxy::all(proxy).map_err(|source| StorageError::Network {
                operation: "client setup",
                source,
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(|source| StorageError::Network {
            operation: "client setup",
            source,
        })?;
        Ok(Self { client })
    }

    /// Storage helper reusing an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for OqtopusStorage {
    #[instrument(skip(self))]
    async fn download(&self, url: &str, timeout: Duration) -> OqtopusResult<JsonObject> {
        debug!("Downloading object");
        let network = |source| StorageError::Network {
            operation: "download",
            source,
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                operation: "download",
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(network)?;
        Ok(extract_json_zip(&body)?)
    }

    #[instrument(skip(self, target, data), fields(key = %target.fields.key))]
    async fn upload(
        &self,
        target: &PresignedUpload,
        data: &JsonObject,
        timeout: Duration,
    ) -> OqtopusResult<()> {
        let network = |source| StorageError::Network {
            operation: "upload",
            source,
        };

        let archive = pack_json_zip(&target.fields.key, data)?;
        debug!("Uploading {} byte archive to {}", archive.len(), target.url);

        let file = Part::bytes(archive)
            .file_name(target.fields.file_name())
            .mime_str("application/zip")
            .map_err(network)?;

        let form = target
            .fields
            .to_form()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part("file", file);

        let response = self
            .client
            .post(&target.url)
            .timeout(timeout)
            .multipart(form)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                operation: "upload",
                status: status.as_u16(),
            }
            .into());
        }
        Ok(())
    }
}

/// Unpack a zip archive holding exactly one JSON object.
pub fn extract_json_zip(bytes: &[u8]) -> Result<JsonObject, StorageError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| StorageError::InvalidZip(e.to_string()))?;

    if archive.len() != 1 {
        return Err(StorageError::EntryCount(archive.len()));
    }

    let mut content = Vec::new();
    archive
        .by_index(0)
        .map_err(|e| StorageError::InvalidZip(e.to_string()))?
        .read_to_end(&mut content)
        .map_err(|e| StorageError::InvalidZip(e.to_string()))?;

    match serde_json::from_slice(&content).map_err(StorageError::InvalidJson)? {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::UnexpectedShape(json_kind(&other))),
    }
}

/// Pack an object as the single entry of a new archive.
///
/// The entry is named after the stem of `key`'s file name
/// (`job/input.zip` → `input.json`).
pub fn pack_json_zip(key: &str, data: &JsonObject) -> Result<Vec<u8>, StorageError> {
    let stem = Path::new(key)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".into());
    let json = serde_json::to_vec(data).map_err(StorageError::InvalidJson)?;

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(format!("{stem}.json"), options)
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;
    writer.write_all(&json)?;
    let cursor = writer
        .finish()
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;
    Ok(cursor.into_inner())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
