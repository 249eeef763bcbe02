// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain types: networks, transactions, receipts and errors.

use alloy::primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy::sol_types::{SolEvent, SolValue};

use super::revert::Revert;

/// Network the execution host impersonates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID, mixed into every identity operation hash
    pub chain_id: u64,
    /// Whether gas is billed the Arbitrum way (L1 calldata folded into the
    /// L2 gas price), which selects the flat-refund relayer module.
    pub arbitrum: bool,
}

/// Local development network (hardhat default chain id).
pub const HARDHAT: NetworkConfig = NetworkConfig {
    name: "Hardhat",
    chain_id: 31337,
    arbitrum: false,
};

/// Arbitrum One configuration.
pub const ARBITRUM_ONE: NetworkConfig = NetworkConfig {
    name: "Arbitrum One",
    chain_id: 42161,
    arbitrum: true,
};

/// Arbitrum Goerli testnet configuration.
pub const ARBITRUM_GOERLI: NetworkConfig = NetworkConfig {
    name: "Arbitrum Goerli",
    chain_id: 421613,
    arbitrum: true,
};

/// Avalanche Fuji Testnet configuration.
pub const AVAX_FUJI: NetworkConfig = NetworkConfig {
    name: "Avalanche Fuji Testnet",
    chain_id: 43113,
    arbitrum: false,
};

const KNOWN_NETWORKS: [NetworkConfig; 4] = [HARDHAT, ARBITRUM_ONE, ARBITRUM_GOERLI, AVAX_FUJI];

/// Resolve a chain id to a known network, falling back to an unnamed
/// non-Arbitrum network.
pub fn network_for_chain_id(chain_id: u64) -> NetworkConfig {
    KNOWN_NETWORKS
        .into_iter()
        .find(|network| network.chain_id == chain_id)
        .unwrap_or(NetworkConfig {
            name: "Custom",
            chain_id,
            arbitrum: false,
        })
}

// =============================================================================
// Transactions
// =============================================================================

/// Default gas limit for transactions built with [`Tx::call`] / [`Tx::create`].
pub const DEFAULT_TX_GAS_LIMIT: u64 = 10_000_000;

/// A transaction submitted to the chain.
///
/// Senders are not authenticated: any address can be used as `from`, the
/// same way a development node lets tests impersonate accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub from: Address,
    /// `None` deploys `data` as init code.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: u64,
    pub gas_price: U256,
}

impl Tx {
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to: Some(to),
            value: U256::ZERO,
            data: data.into(),
            gas_limit: DEFAULT_TX_GAS_LIMIT,
            gas_price: U256::ZERO,
        }
    }

    pub fn create(from: Address, init_code: impl Into<Bytes>) -> Self {
        Self {
            to: None,
            ..Self::call(from, Address::ZERO, init_code)
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Deterministic transaction hash for a given sender nonce.
    pub(crate) fn hash(&self, nonce: u64) -> B256 {
        keccak256(
            (
                self.from,
                U256::from(nonce),
                self.to.unwrap_or_default(),
                self.value,
                self.data.clone(),
                U256::from(self.gas_limit),
                self.gas_price,
            )
                .abi_encode_params(),
        )
    }
}

/// Outcome of a successful transaction.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub tx_hash: B256,
    pub block_number: u64,
    pub timestamp: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub effective_gas_price: U256,
    pub output: Bytes,
    pub logs: Vec<Log>,
}

impl Receipt {
    /// All logs of type `E`, in emission order.
    pub fn events<E: SolEvent>(&self) -> Vec<E> {
        self.logs
            .iter()
            .filter(|log| log.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| E::decode_log_data(&log.data).ok())
            .collect()
    }

    /// Logs of type `E` emitted by `address`.
    pub fn events_from<E: SolEvent>(&self, address: Address) -> Vec<E> {
        self.logs
            .iter()
            .filter(|log| log.address == address)
            .filter(|log| log.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| E::decode_log_data(&log.data).ok())
            .collect()
    }
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("execution reverted: {0}")]
    Reverted(#[from] Revert),

    #[error("intrinsic gas too low: need {need}, limit {limit}")]
    IntrinsicGasTooLow { need: u64, limit: u64 },

    #[error("insufficient funds for gas * price + value: have {have}, need {need}")]
    InsufficientFunds { have: U256, need: U256 },

    #[error("abi decoding failed: {0}")]
    Abi(#[from] alloy::sol_types::Error),
}

impl ChainError {
    /// Revert reason, if the transaction was executed and reverted.
    pub fn revert(&self) -> Option<&Revert> {
        match self {
            Self::Reverted(revert) => Some(revert),
            _ => None,
        }
    }
}

pub type ChainResult<T> = Result<T, ChainError>;
