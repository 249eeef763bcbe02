// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-curated allow-list of module contracts.
//!
//! Managers consult the registry only when a module is enabled, so
//! deregistering a module does not revoke it where it is already enabled.

use alloy::primitives::{Address, Bytes};

use super::ownable;
use crate::evm::abi::{self, IModuleRegistry};
use crate::evm::{require, Contract, Env, Revert};

/// Keyed by module address.
#[derive(Debug, Clone, Copy, Default)]
struct Registered(bool);

pub struct ModuleRegistry;

impl ModuleRegistry {
    fn register(env: &mut Env<'_>, module: Address) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        require(
            env.is_contract(module),
            "MR: module must be an existing contract address",
        )?;
        let Registered(registered) = env.load_entry::<Registered>(module)?;
        require(!registered, "MR: registered module")?;
        env.store_entry(module, Registered(true))?;
        env.emit(&IModuleRegistry::ModuleRegistered { module })?;
        tracing::info!(registry = %env.address(), module = %module, "Module registered");
        Ok(())
    }

    fn deregister(env: &mut Env<'_>, module: Address) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        let Registered(registered) = env.load_entry::<Registered>(module)?;
        require(registered, "MR: unregistered module")?;
        env.store_entry(module, Registered(false))?;
        env.emit(&IModuleRegistry::ModuleDeregistered { module })?;
        tracing::info!(registry = %env.address(), module = %module, "Module deregistered");
        Ok(())
    }
}

impl Contract for ModuleRegistry {
    fn construct(&self, env: &mut Env<'_>) -> Result<(), Revert> {
        let deployer = env.caller();
        ownable::init(env, deployer)
    }

    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        if let Some(result) = ownable::dispatch(env, input) {
            return result;
        }
        match abi::decode_call::<IModuleRegistry::IModuleRegistryCalls>(input)? {
            IModuleRegistry::IModuleRegistryCalls::registerModule(call) => {
                Self::register(env, call.module)?;
                Ok(Bytes::new())
            }
            IModuleRegistry::IModuleRegistryCalls::deregisterModule(call) => {
                Self::deregister(env, call.module)?;
                Ok(Bytes::new())
            }
            IModuleRegistry::IModuleRegistryCalls::isModuleRegistered(call) => {
                let Registered(registered) = env.load_entry::<Registered>(call.module)?;
                Ok(abi::encode_return::<IModuleRegistry::isModuleRegisteredCall>(
                    &registered,
                ))
            }
        }
    }
}
