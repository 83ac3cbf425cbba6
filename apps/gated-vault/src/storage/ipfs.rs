// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! IPFS HTTP API client.
//!
//! Speaks the subset of the Kubo RPC API this service needs:
//!
//! - `POST {api}/add` with a multipart `file` field, answering
//!   `{"Name": .., "Hash": .., "Size": ..}` (one JSON object per line)
//! - `POST {api}/cat?arg=<cid>`, answering the raw bytes
//!
//! Hosted pinning services (e.g. Infura) expect project credentials as HTTP
//! basic auth.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use super::{ContentLocator, ContentStore, StorageError, StorageResult};

/// Default IPFS HTTP API endpoint.
pub const DEFAULT_IPFS_API_URL: &str = "https://ipfs.infura.io:5001/api/v0";

/// Project credentials for hosted IPFS APIs.
#[derive(Clone)]
pub struct IpfsCredentials {
    pub project_id: String,
    pub project_secret: String,
}

impl std::fmt::Debug for IpfsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpfsCredentials")
            .field("project_id", &self.project_id)
            .field("project_secret", &"..")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IpfsHttpClient {
    api_url: String,
    credentials: Option<IpfsCredentials>,
    http: Client,
}

impl IpfsHttpClient {
    pub fn new(
        api_url: &str,
        credentials: Option<IpfsCredentials>,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let parsed: url::Url = api_url
            .parse()
            .map_err(|e: url::ParseError| StorageError::Unavailable(format!("invalid IPFS API URL: {e}")))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_url: parsed.as_str().trim_end_matches('/').to_string(),
            credentials,
            http,
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api_url, name)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => request.basic_auth(&creds.project_id, Some(&creds.project_secret)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<Response> {
        let response = self.authorize(request).send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND || body.to_ascii_lowercase().contains("not found") {
            Err(StorageError::NotFound(body))
        } else {
            Err(StorageError::Unavailable(format!("IPFS API returned {status}: {body}")))
        }
    }
}

#[async_trait]
impl ContentStore for IpfsHttpClient {
    async fn add(&self, bytes: Bytes) -> StorageResult<ContentLocator> {
        let size = bytes.len();
        let part = multipart::Part::bytes(bytes.to_vec()).file_name("upload");
        let form = multipart::Form::new().part("file", part);

        let response = self
            .send(self.http.post(self.endpoint("add")).multipart(form))
            .await?;
        let body = response.text().await.map_err(map_transport_error)?;

        // `add` streams one JSON object per added entry; the last one is the root.
        let last_line = body
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| StorageError::InvalidResponse("empty add response".to_string()))?;

        let added: AddResponse = serde_json::from_str(last_line)
            .map_err(|e| StorageError::InvalidResponse(format!("malformed add response: {e}")))?;

        let locator = ContentLocator::parse(&added.hash)
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        info!(
            locator = %locator,
            bytes = size,
            name = ?added.name,
            reported_size = ?added.size,
            "Uploaded content to IPFS"
        );

        Ok(locator)
    }

    async fn get(&self, locator: &ContentLocator) -> StorageResult<Bytes> {
        let response = self
            .send(
                self.http
                    .post(self.endpoint("cat"))
                    .query(&[("arg", locator.as_str())]),
            )
            .await?;

        let content = response.bytes().await.map_err(map_transport_error)?;
        debug!(locator = %locator, bytes = content.len(), "Fetched content from IPFS");
        Ok(content)
    }
}

fn map_transport_error(e: reqwest::Error) -> StorageError {
    if e.is_timeout() {
        StorageError::Timeout
    } else {
        StorageError::Unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_router;
    use axum::{
        extract::Query,
        http::{header, HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use std::collections::HashMap;

    const MOCK_HASH: &str = "QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o";

    fn mock_ipfs_api() -> Router {
        Router::new()
            .route(
                "/api/v0/add",
                post(|headers: HeaderMap, body: Bytes| async move {
                    let content_type = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if !content_type.starts_with("multipart/form-data") || body.is_empty() {
                        return (StatusCode::BAD_REQUEST, "expected multipart".to_string());
                    }
                    (
                        StatusCode::OK,
                        format!(
                            "{{\"Name\":\"upload\",\"Hash\":\"{MOCK_HASH}\",\"Size\":\"{}\"}}\n",
                            body.len()
                        ),
                    )
                }),
            )
            .route(
                "/api/v0/cat",
                post(|Query(params): Query<HashMap<String, String>>| async move {
                    match params.get("arg").map(String::as_str) {
                        Some(MOCK_HASH) => (StatusCode::OK, "stored bytes".to_string()),
                        _ => (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "merkledag: not found".to_string(),
                        ),
                    }
                }),
            )
            .route(
                "/secured/api/v0/add",
                post(|headers: HeaderMap| async move {
                    if headers.contains_key(header::AUTHORIZATION) {
                        (StatusCode::OK, format!("{{\"Hash\":\"{MOCK_HASH}\"}}"))
                    } else {
                        (StatusCode::UNAUTHORIZED, "project id required".to_string())
                    }
                }),
            )
    }

    #[tokio::test]
    async fn add_returns_locator_from_last_line() {
        let base = spawn_router(mock_ipfs_api()).await;
        let client =
            IpfsHttpClient::new(&format!("{base}/api/v0"), None, Duration::from_secs(5)).unwrap();

        let locator = client.add(Bytes::from_static(b"file body")).await.unwrap();
        assert_eq!(locator.as_str(), MOCK_HASH);
    }

    #[tokio::test]
    async fn cat_returns_bytes_and_maps_missing_to_not_found() {
        let base = spawn_router(mock_ipfs_api()).await;
        let client =
            IpfsHttpClient::new(&format!("{base}/api/v0/"), None, Duration::from_secs(5)).unwrap();

        let found = client
            .get(&ContentLocator::parse(MOCK_HASH).unwrap())
            .await
            .unwrap();
        assert_eq!(found, Bytes::from_static(b"stored bytes"));

        let missing = client
            .get(&ContentLocator::parse("QmMissing").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(missing, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn credentials_are_sent_as_basic_auth() {
        let base = spawn_router(mock_ipfs_api()).await;

        let anonymous =
            IpfsHttpClient::new(&format!("{base}/secured/api/v0"), None, Duration::from_secs(5))
                .unwrap();
        let err = anonymous.add(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));

        let authorized = IpfsHttpClient::new(
            &format!("{base}/secured/api/v0"),
            Some(IpfsCredentials {
                project_id: "project".to_string(),
                project_secret: "secret".to_string(),
            }),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            authorized.add(Bytes::from_static(b"x")).await.unwrap().as_str(),
            MOCK_HASH
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_unavailable() {
        // Port 9 (discard) is not listening on loopback in test environments.
        let client =
            IpfsHttpClient::new("http://127.0.0.1:9/api/v0", None, Duration::from_secs(2)).unwrap();
        let err = client.add(Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Unavailable(_) | StorageError::Timeout
        ));
    }

    #[test]
    fn invalid_api_url_is_rejected() {
        assert!(IpfsHttpClient::new("not a url", None, Duration::from_secs(1)).is_err());
    }
}
