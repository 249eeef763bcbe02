// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the relayer API. All types derive
//! `Serialize`/`Deserialize` and `ToSchema` for JSON handling and OpenAPI
//! documentation.
//!
//! Addresses, hashes and calldata travel as `0x`-prefixed hex strings;
//! token and wei amounts as decimal strings so they survive JavaScript
//! clients unchanged.
//!
//! ## Model Categories
//!
//! - **Deployment**: addresses of the core contracts
//! - **Identities**: creation, address prediction and state
//! - **Relay**: op hashing, submission and the relay journal

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::contracts::modules::GasParams;
use crate::relayer::{Deployment, RelayOutcome};
use crate::storage::{RefundRecord, RelayRecord};

pub fn hex_address(address: Address) -> String {
    address.to_checksum(None)
}

// =============================================================================
// Deployment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeploymentResponse {
    pub chain_id: u64,
    pub network: String,
    /// Account that deployed the system and relays transactions.
    pub relayer: String,
    pub factory: String,
    pub module_registry: String,
    pub module_manager: String,
    pub lock_manager: String,
    pub identity_implementation: String,
    pub identity_proxy_factory: String,
    pub relayer_module: String,
    /// `RelayerModule` or `ArbRelayerModule`.
    pub relayer_module_kind: String,
    pub delegate_module: String,
}

impl DeploymentResponse {
    pub fn new(deployment: &Deployment, chain_id: u64, network: &str) -> Self {
        Self {
            chain_id,
            network: network.to_string(),
            relayer: hex_address(deployment.owner),
            factory: hex_address(deployment.factory),
            module_registry: hex_address(deployment.registry),
            module_manager: hex_address(deployment.module_manager),
            lock_manager: hex_address(deployment.lock_manager),
            identity_implementation: hex_address(deployment.identity),
            identity_proxy_factory: hex_address(deployment.identity_proxy_factory),
            relayer_module: hex_address(deployment.relayer_module),
            relayer_module_kind: deployment.relayer_artifact.name().to_string(),
            delegate_module: hex_address(deployment.delegate_module),
        }
    }
}

// =============================================================================
// Identities
// =============================================================================

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct IdentityAddressQuery {
    /// 32-byte salt, hex encoded.
    pub salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdentityAddressResponse {
    pub address: String,
    pub salt: String,
    /// Whether a proxy already exists at the address.
    pub deployed: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateIdentityRequest {
    pub owner: String,
    /// 32-byte salt; a random one is used when omitted.
    #[serde(default)]
    pub salt: Option<String>,
    /// Registered modules to enable besides the relayer module.
    #[serde(default)]
    pub modules: Vec<String>,
    /// Enable the delegate module for ERC-165/721/1155/1271 handling.
    #[serde(default = "default_true")]
    pub delegate_interfaces: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CreateIdentityResponse {
    pub address: String,
    pub owner: String,
    pub salt: String,
    pub module_manager: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct IdentitySummary {
    pub address: String,
    pub owner: String,
    pub module_manager: String,
    /// Next relayer nonce.
    pub relayer_nonce: String,
    pub locked: bool,
    /// Unix seconds; `0` when never locked.
    pub lock_expires_at: u64,
    pub balance_wei: String,
    /// Native balance in whole units, at most six decimals.
    pub balance: String,
}

// =============================================================================
// Relay
// =============================================================================

/// Refund terms signed into an op.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GasParamsDto {
    /// Refund gas price in wei (decimal or `0x` hex); `0` disables the refund.
    #[serde(default)]
    pub price: Option<String>,
    /// Refund gas limit (decimal or `0x` hex).
    #[serde(default)]
    pub limit: Option<String>,
    /// ERC-20 token paying the refund; native asset when omitted.
    #[serde(default)]
    pub token: Option<String>,
    /// Refund receiver; the relayer when omitted.
    #[serde(default)]
    pub refund_to: Option<String>,
}

impl From<&GasParams> for GasParamsDto {
    fn from(gas: &GasParams) -> Self {
        Self {
            price: Some(gas.price.to_string()),
            limit: Some(gas.limit.to_string()),
            token: Some(hex_address(gas.token)),
            refund_to: Some(hex_address(gas.refund_to)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpHashRequest {
    /// Calldata the module executes on itself (hex).
    pub data: String,
    #[serde(default)]
    pub gas: Option<GasParamsDto>,
    /// Relayer module; the deployment's relayer module when omitted.
    #[serde(default)]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct OpHashResponse {
    pub op_hash: String,
    pub nonce: String,
    pub chain_id: u64,
    pub module: String,
    pub identity: String,
    pub gas: GasParamsDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RelayRequest {
    pub identity: String,
    pub data: String,
    #[serde(default)]
    pub gas: Option<GasParamsDto>,
    /// Concatenated 65-byte signatures: owner first, then co-signers.
    pub signatures: String,
    #[serde(default)]
    pub module: Option<String>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListOpsQuery {
    /// Cursor from a previous page.
    pub cursor: Option<String>,
    /// Page size (1..=100, default 20).
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListOpsResponse {
    pub ops: Vec<RelayRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Journal record of a relay outcome.
pub fn relay_record(identity: Address, module: Address, outcome: &RelayOutcome) -> RelayRecord {
    let revert_reason = (!outcome.success)
        .then(|| crate::evm::Revert::decode(&outcome.result).message());
    RelayRecord {
        op_hash: outcome.op_hash.to_string(),
        identity: hex_address(identity),
        module: hex_address(module),
        tx_hash: outcome.tx_hash.to_string(),
        block_number: outcome.block_number,
        gas_used: outcome.gas_used,
        success: outcome.success,
        result: outcome.result.to_string(),
        revert_reason,
        refund: outcome.refund.map(|refund| RefundRecord {
            receiver: hex_address(refund.receiver),
            token: hex_address(refund.token),
            amount: refund.amount.to_string(),
        }),
        relayed_at: chrono::DateTime::from_timestamp(outcome.timestamp as i64, 0)
            .unwrap_or_else(chrono::Utc::now),
    }
}
