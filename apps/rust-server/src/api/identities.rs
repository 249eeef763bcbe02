// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::{Address, B256};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::params;
use crate::{
    contracts::Artifact,
    error::ApiError,
    evm::abi::{IIdentity, ILockManager, IProxy},
    models::{
        hex_address, CreateIdentityRequest, CreateIdentityResponse, GasParamsDto,
        IdentityAddressQuery, IdentityAddressResponse, IdentitySummary, ListOpsQuery,
        ListOpsResponse, OpHashRequest, OpHashResponse,
    },
    relayer::format_balance,
    state::AppState,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

fn random_salt() -> B256 {
    B256::left_padding_from(uuid::Uuid::new_v4().as_bytes())
}

#[utoipa::path(
    get,
    path = "/v1/identities/address",
    tag = "Identities",
    params(IdentityAddressQuery),
    responses(
        (status = 200, body = IdentityAddressResponse),
        (status = 400, description = "Malformed salt")
    )
)]
pub async fn predict_identity_address(
    State(state): State<AppState>,
    Query(query): Query<IdentityAddressQuery>,
) -> Result<Json<IdentityAddressResponse>, ApiError> {
    let salt = params::b256("salt", &query.salt)?;
    let address = state.deployment.identity_address(salt);
    let deployed = state.chain.read().await.has_code(address);

    Ok(Json(IdentityAddressResponse {
        address: hex_address(address),
        salt: salt.to_string(),
        deployed,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/identities",
    tag = "Identities",
    request_body = CreateIdentityRequest,
    responses(
        (status = 201, body = CreateIdentityResponse),
        (status = 400, description = "Malformed request"),
        (status = 409, description = "An identity already exists for this salt"),
        (status = 422, description = "Identity initialization reverted")
    )
)]
pub async fn create_identity(
    State(state): State<AppState>,
    Json(req): Json<CreateIdentityRequest>,
) -> Result<(StatusCode, Json<CreateIdentityResponse>), ApiError> {
    let owner = params::address("owner", &req.owner)?;
    let salt = match req.salt.as_deref() {
        Some(salt) => params::b256("salt", salt)?,
        None => random_salt(),
    };
    let modules = req
        .modules
        .iter()
        .map(|module| params::address("modules", module))
        .collect::<Result<Vec<_>, _>>()?;
    let init = state
        .deployment
        .identity_init(owner, &modules, req.delegate_interfaces);

    let mut chain = state.chain.write().await;
    let predicted = state.deployment.identity_address(salt);
    if chain.has_code(predicted) {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("identity {} already exists", hex_address(predicted)),
        ));
    }

    let (identity, tx_hash) =
        state
            .relayer
            .create_identity(&mut chain, &state.deployment, salt, init)?;
    let module_manager = chain.call(identity, &IIdentity::moduleManagerCall {})?;

    Ok((
        StatusCode::CREATED,
        Json(CreateIdentityResponse {
            address: hex_address(identity),
            owner: hex_address(owner),
            salt: salt.to_string(),
            module_manager: hex_address(module_manager),
            tx_hash: tx_hash.to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/identities/{address}",
    tag = "Identities",
    params(("address" = String, Path, description = "Identity proxy address")),
    responses(
        (status = 200, body = IdentitySummary),
        (status = 404, description = "No identity at this address")
    )
)]
pub async fn get_identity(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<IdentitySummary>, ApiError> {
    let identity = params::address("address", &address)?;
    let chain = state.chain.read().await;
    let not_found = || ApiError::not_found(format!("identity {} not found", hex_address(identity)));

    // Only proxies to the deployed identity implementation count.
    let is_proxy = chain
        .code(identity)
        .is_some_and(|code| code.name == Artifact::Proxy.name());
    let is_identity = is_proxy
        && chain
            .call(identity, &IProxy::implementationCall {})
            .is_ok_and(|implementation| implementation == state.deployment.identity);
    if !is_identity {
        return Err(not_found());
    }
    let owner = chain.call(identity, &IIdentity::ownerCall {})?;
    let module_manager = chain.call(identity, &IIdentity::moduleManagerCall {})?;

    let deployment = &state.deployment;
    let relayer_nonce = state
        .relayer
        .nonce(&chain, deployment.relayer_module, identity)?;
    let locked = chain.call(
        deployment.lock_manager,
        &ILockManager::isIdentityLockedCall { identity },
    )?;
    let lock_expires_at = chain
        .call(
            deployment.lock_manager,
            &ILockManager::getIdentityLockExpireAtCall { identity },
        )?
        .saturating_to::<u64>();
    let balance = chain.balance(identity);

    Ok(Json(IdentitySummary {
        address: hex_address(identity),
        owner: hex_address(owner),
        module_manager: hex_address(module_manager),
        relayer_nonce: relayer_nonce.to_string(),
        locked,
        lock_expires_at,
        balance_wei: balance.to_string(),
        balance: format_balance(balance, 18),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/identities/{address}/op-hash",
    tag = "Identities",
    params(("address" = String, Path, description = "Identity proxy address")),
    request_body = OpHashRequest,
    responses(
        (status = 200, body = OpHashResponse),
        (status = 400, description = "Malformed request"),
        (status = 422, description = "Module rejected the query")
    )
)]
pub async fn get_op_hash(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(req): Json<OpHashRequest>,
) -> Result<Json<OpHashResponse>, ApiError> {
    let identity = params::address("address", &address)?;
    let module = module_or_default(&state, req.module.as_deref())?;
    let data = params::bytes("data", &req.data)?;
    let gas = params::gas(req.gas.as_ref())?;

    let chain = state.chain.read().await;
    if !chain.has_code(module) {
        return Err(ApiError::bad_request("module must be a deployed contract"));
    }
    let nonce = state.relayer.nonce(&chain, module, identity)?;
    let op_hash = state.relayer.op_hash(&chain, module, identity, data, &gas)?;

    Ok(Json(OpHashResponse {
        op_hash: op_hash.to_string(),
        nonce: nonce.to_string(),
        chain_id: chain.chain_id(),
        module: hex_address(module),
        identity: hex_address(identity),
        gas: GasParamsDto::from(&gas),
    }))
}

#[utoipa::path(
    get,
    path = "/v1/identities/{address}/ops",
    tag = "Identities",
    params(
        ("address" = String, Path, description = "Identity proxy address"),
        ListOpsQuery
    ),
    responses(
        (status = 200, body = ListOpsResponse),
        (status = 404, description = "Relay journal not configured")
    )
)]
pub async fn list_identity_ops(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(query): Query<ListOpsQuery>,
) -> Result<Json<ListOpsResponse>, ApiError> {
    let identity = params::address("address", &address)?;
    let journal = state
        .journal
        .as_ref()
        .ok_or_else(|| ApiError::not_found("relay journal is not configured"))?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let (ops, next_cursor) =
        journal.list_by_identity(&hex_address(identity), query.cursor.as_deref(), limit)?;

    Ok(Json(ListOpsResponse { ops, next_cursor }))
}

/// Requested relayer module, or the deployment's own.
pub(super) fn module_or_default(state: &AppState, module: Option<&str>) -> Result<Address, ApiError> {
    match module.filter(|module| !module.trim().is_empty()) {
        Some(module) => params::address("module", module),
        None => Ok(state.deployment.relayer_module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use alloy::sol_types::SolCall;

    use crate::api::testing::{create, owner};
    use crate::evm::abi::IRelayerModule;
    use crate::relayer::IdentityOpBuilder;

    #[tokio::test]
    async fn predicted_address_matches_created_identity() {
        let state = AppState::default();
        let salt = B256::repeat_byte(7).to_string();

        let Json(predicted) = predict_identity_address(
            State(state.clone()),
            Query(IdentityAddressQuery { salt: salt.clone() }),
        )
        .await
        .unwrap();
        assert!(!predicted.deployed);

        let created = create(&state, Some(&salt)).await;
        assert_eq!(created.address, predicted.address);
        assert_eq!(created.owner, hex_address(owner().address()));

        let Json(again) = predict_identity_address(State(state), Query(IdentityAddressQuery { salt }))
            .await
            .unwrap();
        assert!(again.deployed);
    }

    #[tokio::test]
    async fn create_rejects_reused_salt_and_bad_input() {
        let state = AppState::default();
        let salt = B256::repeat_byte(9).to_string();
        create(&state, Some(&salt)).await;

        let request = CreateIdentityRequest {
            owner: hex_address(owner().address()),
            salt: Some(salt),
            modules: Vec::new(),
            delegate_interfaces: true,
        };
        let err = create_identity(State(state.clone()), Json(request.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err = create_identity(
            State(state.clone()),
            Json(CreateIdentityRequest {
                owner: "not an address".to_string(),
                ..request.clone()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = create_identity(
            State(state),
            Json(CreateIdentityRequest {
                owner: hex_address(Address::ZERO),
                salt: None,
                ..request
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message, "I: owner must not be the zero address");
    }

    #[tokio::test]
    async fn create_rejects_unregistered_modules() {
        let state = AppState::default();
        let err = create_identity(
            State(state),
            Json(CreateIdentityRequest {
                owner: hex_address(owner().address()),
                salt: None,
                modules: vec![hex_address(Address::repeat_byte(0x55))],
                delegate_interfaces: false,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn summary_reports_identity_state() {
        let state = AppState::default();
        let created = create(&state, None).await;
        let identity = params::address("address", &created.address).unwrap();
        state
            .chain
            .write()
            .await
            .set_balance(identity, U256::from(1_500_000_000_000_000_000u64));

        let Json(summary) = get_identity(State(state.clone()), Path(created.address.clone()))
            .await
            .unwrap();
        assert_eq!(summary.owner, created.owner);
        assert_eq!(summary.module_manager, created.module_manager);
        assert_eq!(summary.relayer_nonce, "0");
        assert!(!summary.locked);
        assert_eq!(summary.lock_expires_at, 0);
        assert_eq!(summary.balance, "1.5");

        let err = get_identity(State(state.clone()), Path(hex_address(Address::repeat_byte(1))))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        // Contracts that are not identities: an Ownable one, and a proxy to
        // another implementation.
        for other in [created.module_manager.clone(), hex_address(state.deployment.registry)] {
            let err = get_identity(State(state.clone()), Path(other))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn op_hash_matches_local_builder() {
        let state = AppState::default();
        let created = create(&state, None).await;
        let identity = params::address("address", &created.address).unwrap();
        let data = IRelayerModule::pingCall {}.abi_encode();

        let Json(response) = get_op_hash(
            State(state.clone()),
            Path(created.address),
            Json(OpHashRequest {
                data: alloy::hex::encode_prefixed(&data),
                gas: Some(GasParamsDto {
                    price: Some("1000000000".to_string()),
                    limit: Some("0x30d40".to_string()),
                    token: None,
                    refund_to: None,
                }),
                module: None,
            }),
        )
        .await
        .unwrap();

        let expected = IdentityOpBuilder::new(31337, state.deployment.relayer_module, identity)
            .data(data)
            .gas_price(U256::from(1_000_000_000u64))
            .gas_limit(U256::from(200_000u64))
            .build()
            .hash();
        assert_eq!(response.op_hash, expected.to_string());
        assert_eq!(response.nonce, "0");
        assert_eq!(response.gas.limit.as_deref(), Some("200000"));
    }

    #[tokio::test]
    async fn op_hash_rejects_unknown_module() {
        let state = AppState::default();
        let created = create(&state, None).await;
        let err = get_op_hash(
            State(state),
            Path(created.address),
            Json(OpHashRequest {
                data: "0x".to_string(),
                gas: None,
                module: Some(hex_address(Address::repeat_byte(3))),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_ops_requires_a_journal() {
        let state = AppState::default();
        let err = list_identity_ops(
            State(state),
            Path(hex_address(Address::repeat_byte(1))),
            Query(ListOpsQuery {
                cursor: None,
                limit: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
