// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    error::ApiError, hcert::CredentialEncoder, models::QrCodeRequest, state::AppState,
};

#[utoipa::path(
    post,
    path = "/v2/vshcIssuance",
    request_body = QrCodeRequest,
    tag = "Credentials",
    responses((status = 200, description = "Signed credential string", body = String))
)]
pub async fn vshc_issuance(
    State(state): State<AppState>,
    Json(request): Json<QrCodeRequest>,
) -> Result<String, ApiError> {
    if request.json_content.is_empty() {
        return Err(ApiError::bad_request("jsonContent is mandatory"));
    }

    let encoder = CredentialEncoder::new(&state.config, &state.storage, &state.signer);
    let credential = encoder.issue(
        &request.json_content,
        request.pass_code,
        request.expires_on.map(|d| d.timestamp_millis()),
    )?;

    Ok(credential)
}
