use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::classify::{classify_response, parse_retry_after};
use super::types::{
    CopyRequest, DriveConfig, DriveFile, FileList, Spreadsheet, FILE_FIELDS,
};
use crate::credentials::TokenProvider;
use crate::error::{Error, Result};
use crate::service::ConversionService;
use crate::types::{FileMetadata, UploadMetadata, GOOGLE_SHEET_MIME};
use crate::util::sanitize_api_error;

/// Google Drive / Sheets implementation of [`ConversionService`]
pub struct GoogleDriveService {
    client: Client,
    config: DriveConfig,
    tokens: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for GoogleDriveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GoogleDriveService {
    /// Create a new service
    pub fn new(config: DriveConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidRequest(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// Attach the bearer token, send, and classify any failure
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = parse_retry_after(
            response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
        );
        let body = response.text().await.unwrap_or_default();
        Err(classify_response(status.as_u16(), &body, retry_after))
    }

    async fn send_json<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(sanitize_api_error(&e.to_string()))
    } else {
        Error::Network(sanitize_api_error(&e.to_string()))
    }
}

/// Escape a value for use inside a single-quoted Drive query string
pub(crate) fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Build a `multipart/related` body: JSON metadata part, then media part
pub(crate) fn multipart_related(
    metadata: &serde_json::Value,
    content: &[u8],
    content_type: &str,
    boundary: &str,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait::async_trait]
impl ConversionService for GoogleDriveService {
    fn name(&self) -> &str {
        "google-drive"
    }

    #[instrument(skip(self))]
    async fn metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let request = self
            .client
            .get(format!("{}/files/{}", self.config.drive_base_url, file_id))
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")]);
        let file: DriveFile = self.send_json(request).await?;
        Ok(file.into())
    }

    #[instrument(skip(self))]
    async fn spreadsheet_metadata(&self, file_id: &str) -> Result<FileMetadata> {
        let request = self
            .client
            .get(format!(
                "{}/spreadsheets/{}",
                self.config.sheets_base_url, file_id
            ))
            .query(&[("fields", "spreadsheetId,properties.title")]);
        let sheet: Spreadsheet = self.send_json(request).await?;
        Ok(FileMetadata::new(
            sheet.spreadsheet_id,
            sheet.properties.title,
            GOOGLE_SHEET_MIME,
        ))
    }

    #[instrument(skip(self))]
    async fn find_conversion(
        &self,
        base_name: &str,
        parent: Option<&str>,
    ) -> Result<Option<String>> {
        let mut query = format!(
            "name contains '{}' and mimeType = '{}' and trashed = false",
            escape_query_value(base_name),
            GOOGLE_SHEET_MIME
        );
        if let Some(parent) = parent {
            query.push_str(&format!(" and '{}' in parents", escape_query_value(parent)));
        }

        let request = self
            .client
            .get(format!("{}/files", self.config.drive_base_url))
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name,mimeType,parents)"),
                ("orderBy", "createdTime desc"),
                ("pageSize", "1"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]);
        let list: FileList = self.send_json(request).await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    #[instrument(skip(self))]
    async fn convert(&self, file_id: &str, name: &str) -> Result<String> {
        debug!("Requesting server-side conversion");
        let request = self
            .client
            .post(format!(
                "{}/files/{}/copy",
                self.config.drive_base_url, file_id
            ))
            .query(&[("fields", "id,name,mimeType"), ("supportsAllDrives", "true")])
            .json(&CopyRequest {
                name,
                mime_type: GOOGLE_SHEET_MIME,
            });
        let file: DriveFile = self.send_json(request).await?;
        Ok(file.id)
    }

    #[instrument(skip(self))]
    async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let request = self
            .client
            .get(format!("{}/files/{}", self.config.drive_base_url, file_id))
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;
        debug!(bytes = bytes.len(), "Downloaded file content");
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, content), fields(bytes = content.len(), name = %metadata.name))]
    async fn upload(&self, content: &[u8], metadata: &UploadMetadata) -> Result<String> {
        let boundary = format!("sheetbridge-{}", Uuid::new_v4().simple());
        let mut resource = serde_json::json!({
            "name": metadata.name,
            "mimeType": metadata.mime_type,
        });
        if !metadata.parents.is_empty() {
            resource["parents"] = serde_json::json!(metadata.parents);
        }
        let body = multipart_related(&resource, content, &metadata.mime_type, &boundary);

        let request = self
            .client
            .post(format!("{}/files", self.config.upload_base_url))
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id"),
                ("supportsAllDrives", "true"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body);
        let file: DriveFile = self.send_json(request).await?;
        Ok(file.id)
    }

    #[instrument(skip(self))]
    async fn delete(&self, file_id: &str) -> Result<()> {
        let request = self
            .client
            .delete(format!("{}/files/{}", self.config.drive_base_url, file_id))
            .query(&[("supportsAllDrives", "true")]);
        self.send(request).await?;
        Ok(())
    }
}
