// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Submitting identity ops and identity creations from the relayer account.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;

use super::{Deployment, RelayerError};
use crate::contracts::modules::GasParams;
use crate::evm::abi::{IIdentityProxyFactory, IRelayerModule};
use crate::evm::{Chain, Tx};

/// Refund paid to the relayer (or the signed receiver) by the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refund {
    pub receiver: Address,
    /// `Address::ZERO` for the native asset.
    pub token: Address,
    pub amount: U256,
}

/// What happened to a relayed op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub op_hash: B256,
    pub tx_hash: B256,
    pub block_number: u64,
    pub timestamp: u64,
    pub gas_used: u64,
    /// Whether the inner call succeeded; the relay transaction itself
    /// succeeds either way once signatures check out.
    pub success: bool,
    /// Inner call return data, or its ABI revert payload.
    pub result: Bytes,
    pub refund: Option<Refund>,
}

/// The relayer's externally owned account.
pub struct Relayer {
    signer: PrivateKeySigner,
    gas_price: U256,
}

impl Relayer {
    pub fn new(signer: PrivateKeySigner, gas_price: U256) -> Self {
        Self { signer, gas_price }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn gas_price(&self) -> U256 {
        self.gas_price
    }

    pub fn nonce(&self, chain: &Chain, module: Address, identity: Address) -> Result<U256, RelayerError> {
        Ok(chain.call(module, &IRelayerModule::getNonceCall { identity })?)
    }

    /// Hash the module expects the identity's signers to sign next.
    pub fn op_hash(
        &self,
        chain: &Chain,
        module: Address,
        identity: Address,
        data: Bytes,
        gas: &GasParams,
    ) -> Result<B256, RelayerError> {
        Ok(chain.call(
            module,
            &IRelayerModule::getIdentityOpHashCall {
                identity,
                data,
                gasPrice: gas.price,
                gasLimit: gas.limit,
                refundToken: gas.token,
                refundTo: gas.refund_to,
            },
        )?)
    }

    /// Submit a signed op.
    ///
    /// Signature and replay failures surface as reverts; a failing inner
    /// call is reported through [`RelayOutcome::success`].
    pub fn relay(
        &self,
        chain: &mut Chain,
        module: Address,
        call: &IRelayerModule::executeCall,
    ) -> Result<RelayOutcome, RelayerError> {
        let tx = Tx::call(self.address(), module, call.abi_encode()).with_gas_price(self.gas_price);
        let receipt = chain.transact(tx)?;

        let executed = receipt
            .events_from::<IRelayerModule::Executed>(module)
            .into_iter()
            .next()
            .ok_or(RelayerError::MissingEvent("Executed"))?;
        let refund = receipt
            .events_from::<IRelayerModule::Refunded>(module)
            .into_iter()
            .next()
            .map(|refunded| Refund {
                receiver: refunded.receiver,
                token: refunded.token,
                amount: refunded.amount,
            });

        tracing::info!(
            identity = %call.identity,
            %module,
            op_hash = %executed.txHash,
            tx_hash = %receipt.tx_hash,
            success = executed.success,
            gas_used = receipt.gas_used,
            "Relayed identity op"
        );

        Ok(RelayOutcome {
            op_hash: executed.txHash,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            timestamp: receipt.timestamp,
            gas_used: receipt.gas_used,
            success: executed.success,
            result: executed.result,
            refund,
        })
    }

    /// Create an identity proxy through the deployment's proxy factory. The
    /// relayer must own the factory.
    ///
    /// Returns the proxy address and the creating transaction's hash.
    pub fn create_identity(
        &self,
        chain: &mut Chain,
        deployment: &Deployment,
        salt: B256,
        init: Bytes,
    ) -> Result<(Address, B256), RelayerError> {
        let (proxy, receipt) = chain.send(
            self.address(),
            deployment.identity_proxy_factory,
            &IIdentityProxyFactory::createProxyCall {
                identityImplementation: deployment.identity,
                salt,
                data: init,
            },
        )?;
        tracing::info!(identity = %proxy, %salt, tx_hash = %receipt.tx_hash, "Identity created");
        Ok((proxy, receipt.tx_hash))
    }
}
