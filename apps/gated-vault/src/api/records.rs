// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::ApiError,
    models::{
        DecryptMode, DecryptQuery, DecryptResponse, DecryptedOutputView, RecordView,
        RecordsResponse, SubmitResponse,
    },
    state::AppState,
    vault::DecryptBatch,
};

/// Upload a file and store its encrypted locator.
#[utoipa::path(
    post,
    path = "/v1/records",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    tag = "Records",
    responses(
        (status = 201, body = SubmitResponse),
        (status = 400, description = "Empty upload"),
        (status = 403, description = "Access policy not satisfied"),
        (status = 502, description = "Storage or key network failure"),
        (status = 503, description = "Server shutting down")
    )
)]
pub async fn submit_record(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("Select a file to upload"));
    }

    let vault = &state.vault;
    let record = vault
        .submit_with(body, vault.policy(), &state.shutdown)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/v1/records",
    tag = "Records",
    responses((status = 200, body = RecordsResponse))
)]
pub async fn list_records(State(state): State<AppState>) -> Result<Json<RecordsResponse>, ApiError> {
    let records: Vec<RecordView> = state
        .vault
        .records()
        .await?
        .into_iter()
        .map(RecordView::from)
        .collect();

    Ok(Json(RecordsResponse {
        count: records.len(),
        records,
    }))
}

/// Decrypt every record.
///
/// `mode=all` (default) fails the whole batch on the first failing record by
/// index; `mode=settled` reports every record's outcome.
#[utoipa::path(
    post,
    path = "/v1/records/decrypt",
    params(DecryptQuery),
    tag = "Records",
    responses(
        (status = 200, body = DecryptResponse),
        (status = 403, description = "Access policy not satisfied"),
        (status = 502, description = "Key network failure"),
        (status = 503, description = "Server shutting down")
    )
)]
pub async fn decrypt_records(
    State(state): State<AppState>,
    Query(query): Query<DecryptQuery>,
) -> Result<Json<DecryptResponse>, ApiError> {
    let vault = &state.vault;
    let cancel = &state.shutdown;

    let response = match query.mode {
        DecryptMode::All => match vault.decrypt_all_with(vault.policy(), cancel).await? {
            DecryptBatch::Empty => DecryptResponse::empty(),
            DecryptBatch::Decrypted(outputs) => DecryptResponse::Decrypted {
                outputs: outputs.into_iter().map(DecryptedOutputView::from).collect(),
            },
        },
        DecryptMode::Settled => {
            let results = vault.decrypt_all_settled(vault.policy(), cancel).await?;
            if results.is_empty() {
                DecryptResponse::empty()
            } else {
                DecryptResponse::Decrypted {
                    outputs: results
                        .into_iter()
                        .enumerate()
                        .map(|(index, result)| match result {
                            Ok(output) => output.into(),
                            Err(e) => DecryptedOutputView::failed(index, &e),
                        })
                        .collect(),
                }
            }
        }
    };

    Ok(Json(response))
}
