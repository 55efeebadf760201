// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    hcert::{StageOutcome, StageStatus},
    models::{
        ManifestFile, ManifestRequest, ManifestResponse, QrCodeRequest, ValidateCwtResponse,
        ValidateRequest,
    },
    state::AppState,
};

pub mod ips_json;
pub mod issuance;
pub mod manifests;
pub mod validation;

pub fn router(state: AppState) -> Router {
    let v2_routes = Router::new()
        .route("/vshcIssuance", post(issuance::vshc_issuance))
        .route("/vshcValidation", post(validation::vshc_validation))
        .route("/manifests/{manifest_id}", post(manifests::get_manifest))
        .route("/ips-json/{id}", get(ips_json::get_ips_json))
        .with_state(state);

    Router::new()
        .nest("/v2", v2_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        issuance::vshc_issuance,
        validation::vshc_validation,
        manifests::get_manifest,
        ips_json::get_ips_json
    ),
    components(
        schemas(
            QrCodeRequest,
            ValidateRequest,
            ValidateCwtResponse,
            ManifestRequest,
            ManifestResponse,
            ManifestFile,
            StageOutcome,
            StageStatus
        )
    ),
    tags(
        (name = "Credentials", description = "VSHC issuance and verification"),
        (name = "Manifests", description = "SMART Health Link manifest resolution and document retrieval")
    )
)]
struct ApiDoc;
