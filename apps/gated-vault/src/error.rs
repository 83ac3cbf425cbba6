// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::storage::StorageError;
use crate::vault::VaultError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        let status = match &err {
            VaultError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            VaultError::Storage(StorageError::InvalidLocator(_)) => StatusCode::BAD_REQUEST,
            VaultError::Storage(StorageError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            VaultError::Storage(_) => StatusCode::BAD_GATEWAY,
            VaultError::Auth(_) => StatusCode::UNAUTHORIZED,
            VaultError::PolicyDenied(_) => StatusCode::FORBIDDEN,
            VaultError::Encryption(_) | VaultError::Decryption { .. } => StatusCode::BAD_GATEWAY,
            VaultError::StateInvariant { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            VaultError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };

        if let VaultError::StateInvariant { .. } = err {
            error!(error = %err, "Record ledger invariant violated");
        }

        Self::new(status, err.error_code(), err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        VaultError::Storage(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
        });
        (self.status, body).into_response()
    }
}
