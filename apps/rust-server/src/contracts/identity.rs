// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The user-controlled smart account.
//!
//! Authority over an identity belongs to the modules enabled on its module
//! manager. Unknown selectors are routed to the module delegated for them
//! and run against the identity's own storage.

use alloy::primitives::{Address, Bytes, FixedBytes, U256};

use super::Artifact;
use crate::evm::abi::{self, IIdentity, IModuleManager};
use crate::evm::{require, Contract, Env, Revert};

/// Persistent identity state. Also read by delegated handlers running in
/// the identity's context.
#[derive(Debug, Clone, Default)]
pub struct IdentityState {
    pub initialized: bool,
    pub owner: Address,
    pub module_manager: Address,
}

pub struct Identity;

impl Identity {
    fn state(env: &mut Env<'_>) -> Result<IdentityState, Revert> {
        env.load::<IdentityState>()
    }

    fn is_module_enabled(env: &mut Env<'_>, module: Address) -> Result<bool, Revert> {
        let manager = Self::state(env)?.module_manager;
        if manager.is_zero() {
            return Ok(false);
        }
        env.view(manager, &IModuleManager::isModuleEnabledCall { module })
    }

    fn only_enabled_module(env: &mut Env<'_>) -> Result<(), Revert> {
        let caller = env.caller();
        require(
            Self::is_module_enabled(env, caller)?,
            "I: caller must be an enabled module",
        )
    }

    fn get_delegate(env: &mut Env<'_>, method_id: FixedBytes<4>) -> Result<Address, Revert> {
        let manager = Self::state(env)?.module_manager;
        if manager.is_zero() {
            return Ok(Address::ZERO);
        }
        env.view(manager, &IModuleManager::getDelegateCall { methodID: method_id })
    }

    fn initialize(env: &mut Env<'_>, call: IIdentity::initializeCall) -> Result<(), Revert> {
        let state = Self::state(env)?;
        require(!state.initialized, "I: contract is already initialized")?;
        require(
            call.delegateModules.len() == call.delegateMethodIDs.len(),
            "I: delegate modules and method ids length mismatch",
        )?;
        require(!call.owner.is_zero(), "I: owner must not be the zero address")?;

        env.store(IdentityState {
            initialized: true,
            owner: call.owner,
            module_manager: Address::ZERO,
        })?;

        // Per-identity manager proxy, owned by this identity.
        let init_code = Artifact::Proxy.init_code(&(call.moduleManagerImpl,));
        let manager = env.create(&init_code, U256::ZERO)?;
        let this = env.address();
        env.call_contract(
            manager,
            U256::ZERO,
            &IModuleManager::initializeCall { owner: this },
        )?;
        env.update(|state: &mut IdentityState| state.module_manager = manager)?;

        env.emit(&IIdentity::OwnershipTransferred {
            previousOwner: Address::ZERO,
            newOwner: call.owner,
        })?;
        env.emit(&IIdentity::ModuleManagerSwitched {
            previousModuleManager: Address::ZERO,
            newModuleManager: manager,
        })?;

        for module in call.modules {
            env.call_contract(manager, U256::ZERO, &IModuleManager::enableModuleCall { module })?;
        }
        for (module, method_id) in call.delegateModules.into_iter().zip(call.delegateMethodIDs) {
            env.call_contract(
                manager,
                U256::ZERO,
                &IModuleManager::enableDelegationCall {
                    methodID: method_id,
                    module,
                },
            )?;
        }

        tracing::info!(
            identity = %this,
            owner = %call.owner,
            module_manager = %manager,
            "Identity initialized"
        );
        Ok(())
    }

    fn set_owner(env: &mut Env<'_>, new_owner: Address) -> Result<(), Revert> {
        Self::only_enabled_module(env)?;
        require(!new_owner.is_zero(), "I: owner must not be the zero address")?;
        let mut state = Self::state(env)?;
        let previous_owner = std::mem::replace(&mut state.owner, new_owner);
        env.store(state)?;
        env.emit(&IIdentity::OwnershipTransferred {
            previousOwner: previous_owner,
            newOwner: new_owner,
        })?;
        tracing::info!(identity = %env.address(), %previous_owner, %new_owner, "Identity owner changed");
        Ok(())
    }

    fn set_module_manager(env: &mut Env<'_>, new_manager: Address) -> Result<(), Revert> {
        Self::only_enabled_module(env)?;
        require(
            env.is_contract(new_manager),
            "I: module manager must be an existing contract address",
        )?;
        let mut state = Self::state(env)?;
        let previous = std::mem::replace(&mut state.module_manager, new_manager);
        env.store(state)?;
        env.emit(&IIdentity::ModuleManagerSwitched {
            previousModuleManager: previous,
            newModuleManager: new_manager,
        })
    }

    fn execute(env: &mut Env<'_>, to: Address, value: U256, data: Bytes) -> Result<Bytes, Revert> {
        Self::only_enabled_module(env)?;
        require(!to.is_zero(), "I: execution target must not be the zero address")?;
        let output = env.call(to, value, &data)?;
        let module = env.caller();
        env.emit(&IIdentity::Executed {
            module,
            to,
            value,
            data,
        })?;
        Ok(output)
    }

    /// Route an unknown selector to its delegated module.
    fn fallback(env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        let selector = abi::selector(input)
            .ok_or_else(|| Revert::reason("I: calldata too short for a method id"))?;
        let delegate = Self::get_delegate(env, FixedBytes(selector))?;
        require(!delegate.is_zero(), "I: method must be delegated")?;
        env.delegate_call(delegate, input)
    }
}

impl Contract for Identity {
    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use IIdentity::IIdentityCalls as Calls;

        // receive()
        if input.is_empty() {
            return Ok(Bytes::new());
        }
        if !abi::handles::<Calls>(input) {
            return Self::fallback(env, input);
        }

        match abi::decode_call::<Calls>(input)? {
            Calls::initialize(call) => Self::initialize(env, call)?,
            Calls::owner(_) => {
                let owner = Self::state(env)?.owner;
                return Ok(abi::encode_return::<IIdentity::ownerCall>(&owner));
            }
            Calls::moduleManager(_) => {
                let manager = Self::state(env)?.module_manager;
                return Ok(abi::encode_return::<IIdentity::moduleManagerCall>(&manager));
            }
            Calls::setOwner(call) => Self::set_owner(env, call.newOwner)?,
            Calls::setModuleManager(call) => Self::set_module_manager(env, call.newModuleManager)?,
            Calls::isModuleEnabled(call) => {
                let enabled = Self::is_module_enabled(env, call.module)?;
                return Ok(abi::encode_return::<IIdentity::isModuleEnabledCall>(&enabled));
            }
            Calls::getDelegate(call) => {
                let delegate = Self::get_delegate(env, call.methodID)?;
                return Ok(abi::encode_return::<IIdentity::getDelegateCall>(&delegate));
            }
            Calls::execute(call) => {
                let output = Self::execute(env, call.to, call.value, call.data)?;
                return Ok(abi::encode_return::<IIdentity::executeCall>(&output));
            }
        }
        Ok(Bytes::new())
    }
}
