// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Minimal forwarding proxy.

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;

use crate::evm::abi::{self, IProxy};
use crate::evm::{require, Contract, Env, Revert};

/// Delegates every call except `implementation()` to a fixed logic contract.
pub struct Proxy {
    implementation: Address,
}

impl Proxy {
    pub fn new(implementation: Address) -> Self {
        Self { implementation }
    }
}

impl Contract for Proxy {
    fn construct(&self, env: &mut Env<'_>) -> Result<(), Revert> {
        require(
            env.is_contract(self.implementation),
            "P: implementation must be an existing contract address",
        )
    }

    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        if abi::selector(input) == Some(IProxy::implementationCall::SELECTOR) {
            return Ok(abi::encode_return::<IProxy::implementationCall>(
                &self.implementation,
            ));
        }
        env.delegate_call(self.implementation, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::testing::Fixture;
    use crate::contracts::Artifact;

    #[test]
    fn requires_contract_implementation() {
        let mut fx = Fixture::new();
        let err = fx
            .chain
            .deploy(fx.owner, Artifact::Proxy.init_code(&(Address::repeat_byte(7),)))
            .err()
            .unwrap();
        assert_eq!(
            fx.reason(err),
            "P: implementation must be an existing contract address"
        );
    }

    #[test]
    fn exposes_implementation_and_forwards() {
        let mut fx = Fixture::new();
        let registry = fx.deploy(Artifact::ModuleRegistry.bare_init_code());
        let proxy = fx.deploy(Artifact::Proxy.init_code(&(registry,)));

        let implementation = fx
            .chain
            .call(proxy, &IProxy::implementationCall {})
            .unwrap();
        assert_eq!(implementation, registry);

        // Forwarded call runs against the proxy's own (empty) storage.
        let owner = fx
            .chain
            .call(proxy, &crate::evm::abi::IOwnable::ownerCall {})
            .unwrap();
        assert_eq!(owner, Address::ZERO);
    }
}
