// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{error::ApiError, state::AppState, storage::ContentLocator};

/// Fetch the content behind a decrypted locator.
#[utoipa::path(
    get,
    path = "/v1/content/{locator}",
    params(
        ("locator" = String, Path, description = "Content locator returned by a decrypt batch")
    ),
    tag = "Content",
    responses(
        (status = 200, description = "Raw content bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed locator"),
        (status = 404, description = "Unknown locator")
    )
)]
pub async fn get_content(
    Path(locator): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let locator = ContentLocator::parse(&locator)?;
    let content: Bytes = state.vault.fetch_content(&locator).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], content))
}
