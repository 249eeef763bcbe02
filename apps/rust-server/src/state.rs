// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use alloy::primitives::U256;
use tokio::sync::RwLock;

use crate::config::ServiceConfig;
use crate::contracts::Artifacts;
use crate::evm::{network_for_chain_id, Chain};
use crate::relayer::{signing::signer_from_hex, Deployer, Deployment, Relayer, RelayerError};
use crate::storage::{RelayDbError, RelayJournal, JOURNAL_FILE};

/// Native balance given to an unfunded relayer on the devnet.
const DEVNET_RELAYER_FUNDS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Relayer(#[from] RelayerError),

    #[error("failed to prepare relay journal: {0}")]
    Journal(#[from] RelayDbError),
}

#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<RwLock<Chain>>,
    pub deployment: Deployment,
    pub relayer: Arc<Relayer>,
    /// `None` when `DATA_DIR` is unset.
    pub journal: Option<Arc<RelayJournal>>,
}

impl AppState {
    /// Start a devnet for `config.chain_id`, fund the relayer and deploy the
    /// core contracts from it.
    pub fn bootstrap(config: &ServiceConfig) -> Result<Self, BootstrapError> {
        let network = network_for_chain_id(config.chain_id);
        let mut chain = Chain::new(network, Arc::new(Artifacts));

        let relayer = Relayer::new(
            signer_from_hex(&config.relayer_private_key)?,
            config.relayer_gas_price,
        );
        if chain.balance(relayer.address()).is_zero() {
            let funds = U256::from(DEVNET_RELAYER_FUNDS) * U256::from(10u64).pow(U256::from(18u8));
            chain.set_balance(relayer.address(), funds);
        }

        let deployment = Deployer::new(relayer.address(), config.deploy).deploy(&mut chain)?;

        // The devnet lives in memory, so records from an earlier run describe
        // identities and nonces this chain does not have.
        let journal = match &config.data_dir {
            Some(dir) => {
                let path = dir.join(JOURNAL_FILE);
                let journal = RelayJournal::open(&path)?;
                journal.clear()?;
                tracing::info!(path = %path.display(), "Relay journal reset for new chain session");
                Some(Arc::new(journal))
            }
            None => None,
        };

        tracing::info!(
            network = network.name,
            chain_id = network.chain_id,
            relayer = %relayer.address(),
            journal = journal.is_some(),
            "Relayer state initialized"
        );

        Ok(Self {
            chain: Arc::new(RwLock::new(chain)),
            deployment,
            relayer: Arc::new(relayer),
            journal,
        })
    }
}

#[cfg(test)]
impl Default for AppState {
    fn default() -> Self {
        Self::bootstrap(&ServiceConfig::default()).unwrap()
    }
}
