// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON/HTTP client for a remote key node.
//!
//! - `GET  {base}/health`
//! - `POST {base}/web/encryption/store`    ([`StoreKeyRequest`] → [`StoreKeyResponse`])
//! - `POST {base}/web/encryption/retrieve` ([`RetrieveKeyRequest`] → [`RetrieveKeyResponse`])

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::{
    GatewayError, KeyNetwork, RetrieveKeyRequest, RetrieveKeyResponse, StoreKeyRequest,
    StoreKeyResponse,
};

const STORE_PATH: &str = "web/encryption/store";
const RETRIEVE_PATH: &str = "web/encryption/retrieve";

#[derive(Debug, Clone)]
pub struct HttpKeyNetwork {
    base_url: String,
    http: Client,
}

impl HttpKeyNetwork {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed: url::Url = base_url
            .parse()
            .map_err(|e: url::ParseError| GatewayError::Unavailable(format!("invalid key node URL: {e}")))?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, GatewayError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let response = check_status(response).await?;
        response
            .json::<Resp>()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("malformed key node response: {e}")))
    }
}

#[async_trait]
impl KeyNetwork for HttpKeyNetwork {
    async fn connect(&self) -> Result<(), GatewayError> {
        let response = self
            .http
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response).await?;

        info!(url = %self.base_url, "Key node is reachable");
        Ok(())
    }

    async fn store_key(&self, request: StoreKeyRequest) -> Result<StoreKeyResponse, GatewayError> {
        let response: StoreKeyResponse = self.post_json(STORE_PATH, &request).await?;
        debug!(chain = %request.chain, "Key node stored symmetric key");
        Ok(response)
    }

    async fn retrieve_key(
        &self,
        request: RetrieveKeyRequest,
    ) -> Result<RetrieveKeyResponse, GatewayError> {
        let response: RetrieveKeyResponse = self.post_json(RETRIEVE_PATH, &request).await?;
        debug!(chain = %request.chain, "Key node released symmetric key");
        Ok(response)
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED => GatewayError::Auth(body),
        StatusCode::FORBIDDEN => GatewayError::PolicyDenied(body),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            GatewayError::InvalidKeyHandle(body)
        }
        _ => GatewayError::Unavailable(format!("key node returned {status}: {body}")),
    })
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(e.to_string())
}
