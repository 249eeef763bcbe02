// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-gated deployer of identity proxies at predictable addresses.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};

use super::factory::create2_address;
use super::{ownable, Artifact};
use crate::evm::abi::{self, IIdentityProxyFactory};
use crate::evm::{Contract, Env, Revert};

pub struct IdentityProxyFactory;

/// Address an identity proxy for `identity_impl` will get from `factory`.
pub fn proxy_address(factory: Address, identity_impl: Address, salt: B256) -> Address {
    let code = Artifact::Proxy.init_code(&(identity_impl,));
    create2_address(factory, salt, keccak256(&code))
}

impl IdentityProxyFactory {
    fn create_proxy(
        env: &mut Env<'_>,
        identity_impl: Address,
        salt: B256,
        data: &[u8],
    ) -> Result<Address, Revert> {
        ownable::only_owner(env)?;
        let code = Artifact::Proxy.init_code(&(identity_impl,));
        let proxy = env.create2(salt, &code, U256::ZERO)?;
        if !data.is_empty() {
            env.call(proxy, U256::ZERO, data)?;
        }
        env.emit(&IIdentityProxyFactory::ProxyCreated { proxy })?;
        tracing::info!(%proxy, implementation = %identity_impl, "Identity proxy created");
        Ok(proxy)
    }
}

impl Contract for IdentityProxyFactory {
    fn construct(&self, env: &mut Env<'_>) -> Result<(), Revert> {
        let deployer = env.caller();
        ownable::init(env, deployer)
    }

    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use IIdentityProxyFactory::IIdentityProxyFactoryCalls as Calls;

        if let Some(result) = ownable::dispatch(env, input) {
            return result;
        }
        match abi::decode_call::<Calls>(input)? {
            Calls::createProxy(call) => {
                let proxy =
                    Self::create_proxy(env, call.identityImplementation, call.salt, &call.data)?;
                Ok(abi::encode_return::<IIdentityProxyFactory::createProxyCall>(&proxy))
            }
            Calls::getProxyAddress(call) => {
                let proxy = proxy_address(env.address(), call.identityImplementation, call.salt);
                Ok(abi::encode_return::<IIdentityProxyFactory::getProxyAddressCall>(&proxy))
            }
        }
    }
}
