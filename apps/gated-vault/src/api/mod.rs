// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        DecryptMode, DecryptResponse, DecryptedOutputView, RecordView, RecordsResponse,
        SubmitResponse,
    },
    state::AppState,
};

pub mod content;
pub mod health;
pub mod records;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/records",
            get(records::list_records).post(records::submit_record),
        )
        .route("/records/decrypt", post(records::decrypt_records))
        .route("/content/{locator}", get(content::get_content))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        records::submit_record,
        records::list_records,
        records::decrypt_records,
        content::get_content,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SubmitResponse,
            RecordView,
            RecordsResponse,
            DecryptMode,
            DecryptResponse,
            DecryptedOutputView,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Records", description = "Upload, list and decrypt access-controlled records"),
        (name = "Content", description = "Content retrieval by locator"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
