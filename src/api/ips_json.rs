// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    access::{RetrievalResolver, FHIR_JSON_CONTENT_TYPE},
    error::ApiError,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/v2/ips-json/{id}",
    params(("id" = String, Path, description = "Manifest identifier (unprotected) or single-use retrieval identity")),
    tag = "Manifests",
    responses((status = 200, description = "IPS JSON document", body = String))
)]
pub async fn get_ips_json(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let resolver = RetrievalResolver::new(&state.storage, &state.locks);
    let bytes = resolver.retrieve(&id).await?;

    Ok(([(header::CONTENT_TYPE, FHIR_JSON_CONTENT_TYPE)], bytes))
}
