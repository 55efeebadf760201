// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{
    hcert::CredentialVerifier,
    models::{ValidateCwtResponse, ValidateRequest},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v2/vshcValidation",
    request_body = ValidateRequest,
    tag = "Credentials",
    responses((status = 200, body = ValidateCwtResponse))
)]
pub async fn vshc_validation(
    State(state): State<AppState>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidateCwtResponse> {
    // The pipeline never fails outward; the report is the response.
    let report = CredentialVerifier::new(&state.trust)
        .verify(&request.qr_code_content)
        .await;

    Json(ValidateCwtResponse::from(report))
}
