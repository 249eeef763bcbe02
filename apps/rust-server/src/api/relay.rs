// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use super::{identities::module_or_default, params};
use crate::{
    error::ApiError,
    evm::abi::IRelayerModule,
    models::{relay_record, RelayRequest},
    state::AppState,
    storage::RelayRecord,
};

/// Submit a signed identity op.
///
/// Signature, nonce and lock failures reject the whole submission with 422.
/// A failing inner call is still relayed (and refunded): the record reports
/// `success: false` with the decoded revert reason.
#[utoipa::path(
    post,
    path = "/v1/relay",
    tag = "Relay",
    request_body = RelayRequest,
    responses(
        (status = 200, body = RelayRecord),
        (status = 400, description = "Malformed request"),
        (status = 422, description = "Op rejected by the relayer module")
    )
)]
pub async fn relay_op(
    State(state): State<AppState>,
    Json(req): Json<RelayRequest>,
) -> Result<Json<RelayRecord>, ApiError> {
    let identity = params::address("identity", &req.identity)?;
    let module = module_or_default(&state, req.module.as_deref())?;
    let data = params::bytes("data", &req.data)?;
    let gas = params::gas(req.gas.as_ref())?;
    let signatures = params::bytes("signatures", &req.signatures)?;

    let call = IRelayerModule::executeCall {
        identity,
        data,
        gasPrice: gas.price,
        gasLimit: gas.limit,
        refundToken: gas.token,
        refundTo: gas.refund_to,
        signatures,
    };

    let outcome = {
        let mut chain = state.chain.write().await;
        if !chain.has_code(module) {
            return Err(ApiError::bad_request("module must be a deployed contract"));
        }
        state.relayer.relay(&mut chain, module, &call)?
    };

    let record = relay_record(identity, module, &outcome);
    if let Some(journal) = &state.journal {
        journal.record(&record)?;
    }
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/v1/relay/{op_hash}",
    tag = "Relay",
    params(("op_hash" = String, Path, description = "Identity op hash")),
    responses(
        (status = 200, body = RelayRecord),
        (status = 404, description = "Unknown op or journal not configured")
    )
)]
pub async fn get_relayed_op(
    State(state): State<AppState>,
    Path(op_hash): Path<String>,
) -> Result<Json<RelayRecord>, ApiError> {
    let op_hash = params::b256("op_hash", &op_hash)?;
    let journal = state
        .journal
        .as_ref()
        .ok_or_else(|| ApiError::not_found("relay journal is not configured"))?;

    journal
        .get(&op_hash.to_string())?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("op {op_hash} not found")))
}
