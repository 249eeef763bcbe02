// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Building and signing identity ops.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};

use super::RelayerError;
use crate::contracts::modules::{identity_op_hash, GasParams};
use crate::evm::abi::IRelayerModule;

/// A fully specified identity op, ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityOp {
    pub chain_id: u64,
    pub module: Address,
    pub identity: Address,
    pub nonce: U256,
    pub data: Bytes,
    pub gas: GasParams,
}

impl IdentityOp {
    pub fn hash(&self) -> B256 {
        identity_op_hash(
            self.chain_id,
            self.module,
            self.identity,
            self.nonce,
            &self.data,
            &self.gas,
        )
    }

    /// Concatenated EIP-191 signatures: `owner` first, then `cosigners`
    /// sorted by ascending address.
    pub fn sign(
        &self,
        owner: &PrivateKeySigner,
        cosigners: &[PrivateKeySigner],
    ) -> Result<Bytes, RelayerError> {
        let hash = self.hash();
        let mut ordered: Vec<&PrivateKeySigner> = cosigners.iter().collect();
        ordered.sort_by_key(|signer| signer.address());

        let mut signatures = Vec::with_capacity((ordered.len() + 1) * 65);
        for signer in std::iter::once(owner).chain(ordered) {
            let signature = signer.sign_message_sync(hash.as_slice())?;
            signatures.extend_from_slice(&signature.as_bytes());
        }
        Ok(signatures.into())
    }

    pub fn into_call(self, signatures: Bytes) -> IRelayerModule::executeCall {
        IRelayerModule::executeCall {
            identity: self.identity,
            data: self.data,
            gasPrice: self.gas.price,
            gasLimit: self.gas.limit,
            refundToken: self.gas.token,
            refundTo: self.gas.refund_to,
            signatures,
        }
    }
}

/// Builder for [`IdentityOp`]; unset gas fields default to zero (no refund).
#[derive(Debug, Clone)]
pub struct IdentityOpBuilder {
    op: IdentityOp,
}

impl IdentityOpBuilder {
    pub fn new(chain_id: u64, module: Address, identity: Address) -> Self {
        Self {
            op: IdentityOp {
                chain_id,
                module,
                identity,
                nonce: U256::ZERO,
                data: Bytes::new(),
                gas: GasParams::default(),
            },
        }
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.op.nonce = nonce;
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.op.data = data.into();
        self
    }

    pub fn gas(mut self, gas: GasParams) -> Self {
        self.op.gas = gas;
        self
    }

    pub fn gas_price(mut self, price: U256) -> Self {
        self.op.gas.price = price;
        self
    }

    pub fn gas_limit(mut self, limit: U256) -> Self {
        self.op.gas.limit = limit;
        self
    }

    pub fn refund_token(mut self, token: Address) -> Self {
        self.op.gas.token = token;
        self
    }

    pub fn refund_to(mut self, receiver: Address) -> Self {
        self.op.gas.refund_to = receiver;
        self
    }

    pub fn build(self) -> IdentityOp {
        self.op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::ecdsa;

    const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const COSIGNER_KEYS: [&str; 2] = [
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
        "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    ];

    fn op() -> IdentityOp {
        IdentityOpBuilder::new(31337, Address::repeat_byte(1), Address::repeat_byte(2))
            .nonce(U256::from(4u8))
            .data(vec![0x5c, 0x36, 0xb1, 0x86])
            .gas_price(U256::from(7u8))
            .gas_limit(U256::from(80_000u64))
            .build()
    }

    #[test]
    fn hash_commits_to_every_field() {
        let base = op();
        let mut variants = vec![
            IdentityOp { chain_id: 1, ..base.clone() },
            IdentityOp { nonce: U256::from(5u8), ..base.clone() },
            IdentityOp { data: Bytes::new(), ..base.clone() },
        ];
        let mut refund_to = base.clone();
        refund_to.gas.refund_to = Address::repeat_byte(9);
        variants.push(refund_to);

        for variant in variants {
            assert_ne!(variant.hash(), base.hash());
        }
    }

    #[test]
    fn signatures_are_owner_first_then_ascending() {
        let owner: PrivateKeySigner = OWNER_KEY.parse().unwrap();
        let cosigners: Vec<PrivateKeySigner> =
            COSIGNER_KEYS.iter().map(|key| key.parse().unwrap()).rev().collect();
        let op = op();

        let blob = op.sign(&owner, &cosigners).unwrap();
        assert_eq!(ecdsa::signature_count(&blob).unwrap(), 3);

        let digest = ecdsa::to_eth_signed_message_hash(op.hash());
        let signers: Vec<Address> = (0..3)
            .map(|index| ecdsa::recover_at(digest, &blob, index).unwrap())
            .collect();
        assert_eq!(signers[0], owner.address());
        assert!(signers[1] < signers[2]);
    }
}
