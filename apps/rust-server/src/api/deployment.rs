// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{models::DeploymentResponse, state::AppState};

#[utoipa::path(
    get,
    path = "/v1/deployment",
    tag = "Deployment",
    responses((status = 200, body = DeploymentResponse))
)]
pub async fn get_deployment(State(state): State<AppState>) -> Json<DeploymentResponse> {
    let network = state.chain.read().await.network();
    Json(DeploymentResponse::new(
        &state.deployment,
        network.chain_id,
        network.name,
    ))
}
