// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CREATE2 factory with an optional same-transaction initialization call.

use alloy::primitives::{Address, Bytes, B256, U256};

use crate::evm::abi::{self, IFactory};
use crate::evm::{Contract, Env, Revert};

/// Canonical CREATE2 address: `keccak256(0xff ++ deployer ++ salt ++ code_hash)[12..]`.
pub fn create2_address(deployer: Address, salt: B256, code_hash: B256) -> Address {
    deployer.create2(salt, code_hash)
}

pub struct Factory;

impl Factory {
    fn create(env: &mut Env<'_>, code: &[u8], salt: B256, data: &[u8]) -> Result<Address, Revert> {
        let addr = env.create2(salt, code, U256::ZERO)?;
        if !data.is_empty() {
            env.call(addr, U256::ZERO, data)?;
        }
        env.emit(&IFactory::Created { addr })?;
        tracing::debug!(address = %addr, salt = %salt, "Factory deployed contract");
        Ok(addr)
    }
}

impl Contract for Factory {
    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        match abi::decode_call::<IFactory::IFactoryCalls>(input)? {
            IFactory::IFactoryCalls::create(call) => {
                let addr = Self::create(env, &call.code, call.salt, &call.data)?;
                Ok(abi::encode_return::<IFactory::createCall>(&addr))
            }
            IFactory::IFactoryCalls::getAddress(call) => {
                let addr = create2_address(env.address(), call.salt, call.codeHash);
                Ok(abi::encode_return::<IFactory::getAddressCall>(&addr))
            }
        }
    }
}
