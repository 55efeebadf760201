// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    access::AccessGateway,
    error::ApiError,
    models::{ManifestRequest, ManifestResponse},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v2/manifests/{manifestId}",
    params(("manifestId" = String, Path, description = "Manifest identifier")),
    request_body = ManifestRequest,
    tag = "Manifests",
    responses((status = 200, body = ManifestResponse))
)]
pub async fn get_manifest(
    State(state): State<AppState>,
    Path(manifest_id): Path<String>,
    Json(request): Json<ManifestRequest>,
) -> Result<Json<ManifestResponse>, ApiError> {
    let gateway = AccessGateway::new(&state.config, &state.storage, &state.locks);
    let descriptor = gateway
        .resolve_manifest(&manifest_id, request.passcode.as_deref())
        .await?;

    Ok(Json(ManifestResponse::from(descriptor)))
}
