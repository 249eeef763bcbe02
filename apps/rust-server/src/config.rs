// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, their defaults, and [`ServiceConfig`] which
//! reads them once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `CHAIN_ID` | Chain ID of the devnet (42161 / 421613 select the Arbitrum relayer) | `31337` |
//! | `LOCK_PERIOD` | Identity lock duration in seconds | `604800` |
//! | `RELAY_MIN_GAS` | Fixed gas overhead added to relay refunds | `21000` |
//! | `RELAY_REFUND_GAS` | Gas reserved for the refund transfer | `22000` |
//! | `RELAYER_PRIVATE_KEY` | Hex key of the relayer account | hardhat account #0 |
//! | `RELAYER_GAS_PRICE` | Gas price (wei) of relay transactions | `1000000000` |
//! | `DATA_DIR` | Directory of the relay journal; unset keeps no journal | unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::U256;

use crate::relayer::DeployConfig;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const LOCK_PERIOD_ENV: &str = "LOCK_PERIOD";
pub const RELAY_MIN_GAS_ENV: &str = "RELAY_MIN_GAS";
pub const RELAY_REFUND_GAS_ENV: &str = "RELAY_REFUND_GAS";

/// Hex private key of the account that deploys the core contracts, owns the
/// proxy factory and pays for relayed transactions.
///
/// # Default
/// Hardhat account #0. Never use the default outside a devnet.
pub const RELAYER_PRIVATE_KEY_ENV: &str = "RELAYER_PRIVATE_KEY";
pub const RELAYER_GAS_PRICE_ENV: &str = "RELAYER_GAS_PRICE";

/// Environment variable name for the journal directory.
///
/// When set, relayed ops are recorded in `{DATA_DIR}/relay.redb`.
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHAIN_ID: u64 = 31337;
pub const DEFAULT_RELAYER_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEFAULT_RELAYER_GAS_PRICE: u64 = 1_000_000_000;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(()),
        }
    }
}

/// Settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub chain_id: u64,
    pub deploy: DeployConfig,
    pub relayer_private_key: String,
    pub relayer_gas_price: U256,
    pub data_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chain_id: DEFAULT_CHAIN_ID,
            deploy: DeployConfig::default(),
            relayer_private_key: DEFAULT_RELAYER_PRIVATE_KEY.to_string(),
            relayer_gas_price: U256::from(DEFAULT_RELAYER_GAS_PRICE),
            data_dir: None,
            log_format: LogFormat::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset or blank variables
    /// take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            host: var(HOST_ENV).unwrap_or(defaults.host),
            port: parse(PORT_ENV, var(PORT_ENV))?.unwrap_or(defaults.port),
            chain_id: parse(CHAIN_ID_ENV, var(CHAIN_ID_ENV))?.unwrap_or(defaults.chain_id),
            deploy: DeployConfig {
                lock_period: parse(LOCK_PERIOD_ENV, var(LOCK_PERIOD_ENV))?
                    .unwrap_or(defaults.deploy.lock_period),
                relay_min_gas: parse(RELAY_MIN_GAS_ENV, var(RELAY_MIN_GAS_ENV))?
                    .unwrap_or(defaults.deploy.relay_min_gas),
                relay_refund_gas: parse(RELAY_REFUND_GAS_ENV, var(RELAY_REFUND_GAS_ENV))?
                    .unwrap_or(defaults.deploy.relay_refund_gas),
            },
            relayer_private_key: var(RELAYER_PRIVATE_KEY_ENV)
                .unwrap_or(defaults.relayer_private_key),
            relayer_gas_price: parse(RELAYER_GAS_PRICE_ENV, var(RELAYER_GAS_PRICE_ENV))?
                .unwrap_or(defaults.relayer_gas_price),
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            log_format: parse(LOG_FORMAT_ENV, var(LOG_FORMAT_ENV))?.unwrap_or_default(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
