// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Behaviour shared by modules that act on identities.

use alloy::primitives::{Address, Bytes, U256};

use crate::evm::abi::{IIdentity, ILockManager};
use crate::evm::{Env, Revert};

/// Lock-aware access to `Identity.execute`, gated to self-calls.
#[derive(Debug, Clone, Copy)]
pub struct ModuleBase {
    pub lock_manager: Address,
    /// Revert reason prefix (`BM`, `CBM`).
    pub prefix: &'static str,
}

impl ModuleBase {
    pub fn new(lock_manager: Address, prefix: &'static str) -> Self {
        Self {
            lock_manager,
            prefix,
        }
    }

    pub fn check(&self, condition: bool, message: &str) -> Result<(), Revert> {
        if condition {
            Ok(())
        } else {
            Err(Revert::Reason(format!("{}: {message}", self.prefix)))
        }
    }

    pub fn only_self(&self, env: &Env<'_>) -> Result<(), Revert> {
        self.check(env.caller() == env.address(), "caller must be myself")
    }

    pub fn is_identity_locked(&self, env: &mut Env<'_>, identity: Address) -> Result<bool, Revert> {
        env.view(
            self.lock_manager,
            &ILockManager::isIdentityLockedCall { identity },
        )
    }

    /// Forward a call through `identity`, which must be unlocked.
    pub fn execute_through_identity(
        &self,
        env: &mut Env<'_>,
        identity: Address,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> Result<Bytes, Revert> {
        self.only_self(env)?;
        let locked = self.is_identity_locked(env, identity)?;
        self.check(!locked, "identity must be unlocked")?;
        env.call_contract(identity, U256::ZERO, &IIdentity::executeCall { to, value, data })
    }
}
