//! reqwest-backed `DriveApi` implementation

use std::future::Future;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::DriveApi;
use crate::error::{Error, Result};
use crate::types::{DriveFile, ErrorEnvelope, FileList, ListQuery, NewPermission, Permission};

/// Base URL for Drive API v3.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive client sharing the gateway's connection pool.
#[derive(Debug, Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DriveClient {
    /// `base_url` must be a hierarchical http(s) URL such as [`DRIVE_API_BASE`].
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidResponse(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    #[instrument(skip_all, fields(page_size = query.page_size))]
    async fn list(&self, access_token: &str, query: &ListQuery) -> Result<Vec<DriveFile>> {
        let url = self.endpoint(&["files"])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(&[
                ("pageSize", query.page_size.to_string()),
                ("fields", query.fields.clone()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let list: FileList = read_json(response).await?;
        debug!(files = list.files.len(), "listed files");
        Ok(list.files)
    }

    #[instrument(skip_all, fields(file_id = %file_id))]
    async fn create(
        &self,
        access_token: &str,
        file_id: &str,
        permission: &NewPermission,
    ) -> Result<Permission> {
        let url = self.endpoint(&["files", file_id, "permissions"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .query(&[("fields", "id,role")])
            .json(permission)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    #[instrument(skip_all, fields(file_id = %file_id, permission_id = %permission_id))]
    async fn promote_to_owner(
        &self,
        access_token: &str,
        file_id: &str,
        permission_id: &str,
    ) -> Result<Permission> {
        let url = self.endpoint(&["files", file_id, "permissions", permission_id])?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(access_token)
            .query(&[("transferOwnership", "true"), ("fields", "id,role")])
            .json(&serde_json::json!({ "role": "owner" }))
            .send()
            .await
            .map_err(transport_error)?;

        read_json(response).await
    }

    #[instrument(skip_all, fields(file_id = %file_id, permission_id = %permission_id))]
    async fn delete(&self, access_token: &str, file_id: &str, permission_id: &str) -> Result<()> {
        let url = self.endpoint(&["files", file_id, "permissions", permission_id])?;
        let response = self
            .http
            .delete(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await.map(drop)
    }
}

impl DriveApi for DriveClient {
    fn list_files<'a>(
        &'a self,
        access_token: &'a str,
        query: &'a ListQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DriveFile>>> + Send + 'a>> {
        Box::pin(self.list(access_token, query))
    }

    fn create_permission<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission: &'a NewPermission,
    ) -> Pin<Box<dyn Future<Output = Result<Permission>> + Send + 'a>> {
        Box::pin(self.create(access_token, file_id, permission))
    }

    fn transfer_ownership<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Permission>> + Send + 'a>> {
        Box::pin(self.promote_to_owner(access_token, file_id, permission_id))
    }

    fn delete_permission<'a>(
        &'a self,
        access_token: &'a str,
        file_id: &'a str,
        permission_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.delete(access_token, file_id, permission_id))
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Http("request timeout".into())
    } else if e.is_connect() {
        Error::Http(format!("connection failed: {e}"))
    } else {
        Error::Http(e.to_string())
    }
}

/// Pass 2xx responses through; turn anything else into `Error::Api`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body,
    };
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;
    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("failed to read response: {e}")))?;
    serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
}
