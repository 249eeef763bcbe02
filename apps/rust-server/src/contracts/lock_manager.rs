// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Time-based identity locks with locker attribution.
//!
//! A lock is active while `now < expireAt`. Only the module that took the
//! lock may release it early; once it expires any enabled module may lock
//! again. The stored expiry is kept after expiration.

use alloy::primitives::{Address, Bytes, U256};

use crate::evm::abi::{self, IIdentity, ILockManager};
use crate::evm::{require, Contract, Env, Revert};

/// Keyed by identity.
#[derive(Debug, Clone, Copy, Default)]
struct Lock {
    locker: Address,
    expire_at: u64,
}

pub struct LockManager {
    lock_period: u64,
}

impl LockManager {
    pub fn new(lock_period: u64) -> Self {
        Self { lock_period }
    }

    fn only_enabled_module(env: &mut Env<'_>, identity: Address) -> Result<(), Revert> {
        let module = env.caller();
        let enabled = env.view(identity, &IIdentity::isModuleEnabledCall { module })?;
        require(enabled, "LM: caller must be an enabled module")
    }

    fn lock_of(env: &mut Env<'_>, identity: Address) -> Result<Lock, Revert> {
        env.load_entry::<Lock>(identity)
    }

    fn is_locked(env: &mut Env<'_>, identity: Address) -> Result<bool, Revert> {
        let lock = Self::lock_of(env, identity)?;
        Ok(env.timestamp() < lock.expire_at)
    }

    fn lock(&self, env: &mut Env<'_>, identity: Address) -> Result<(), Revert> {
        Self::only_enabled_module(env, identity)?;
        require(!Self::is_locked(env, identity)?, "LM: identity must be unlocked")?;

        let locker = env.caller();
        let expire_at = env
            .timestamp()
            .checked_add(self.lock_period)
            .ok_or_else(|| Revert::reason("LM: lock period overflow"))?;
        env.store_entry(identity, Lock { locker, expire_at })?;
        env.emit(&ILockManager::IdentityLocked {
            identity,
            locker,
            expireAt: U256::from(expire_at),
        })?;
        tracing::info!(%identity, %locker, expire_at, "Identity locked");
        Ok(())
    }

    fn unlock(&self, env: &mut Env<'_>, identity: Address) -> Result<(), Revert> {
        Self::only_enabled_module(env, identity)?;
        require(Self::is_locked(env, identity)?, "LM: identity must be locked")?;
        let lock = Self::lock_of(env, identity)?;
        require(lock.locker == env.caller(), "LM: caller must be the locker")?;

        env.store_entry(
            identity,
            Lock {
                expire_at: 0,
                ..lock
            },
        )?;
        env.emit(&ILockManager::IdentityUnlocked { identity })?;
        tracing::info!(%identity, locker = %lock.locker, "Identity unlocked");
        Ok(())
    }
}

impl Contract for LockManager {
    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use ILockManager::ILockManagerCalls as Calls;

        match abi::decode_call::<Calls>(input)? {
            Calls::lockPeriod(_) => Ok(abi::encode_return::<ILockManager::lockPeriodCall>(
                &U256::from(self.lock_period),
            )),
            Calls::lockIdentity(call) => {
                self.lock(env, call.identity)?;
                Ok(Bytes::new())
            }
            Calls::unlockIdentity(call) => {
                self.unlock(env, call.identity)?;
                Ok(Bytes::new())
            }
            Calls::isIdentityLocked(call) => {
                let locked = Self::is_locked(env, call.identity)?;
                Ok(abi::encode_return::<ILockManager::isIdentityLockedCall>(
                    &locked,
                ))
            }
            Calls::getIdentityLockExpireAt(call) => {
                let lock = Self::lock_of(env, call.identity)?;
                Ok(abi::encode_return::<ILockManager::getIdentityLockExpireAtCall>(
                    &U256::from(lock.expire_at),
                ))
            }
        }
    }
}
