// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-owner access control shared by the infrastructure contracts.

use alloy::primitives::{Address, Bytes};

use crate::evm::abi::{self, IOwnable};
use crate::evm::{require, Env, Revert};

#[derive(Debug, Clone, Default)]
pub struct OwnableState {
    pub owner: Address,
}

/// Set the initial owner. Called from constructors and initializers.
pub fn init(env: &mut Env<'_>, owner: Address) -> Result<(), Revert> {
    set_owner(env, owner)
}

pub fn owner(env: &mut Env<'_>) -> Result<Address, Revert> {
    Ok(env.load::<OwnableState>()?.owner)
}

pub fn only_owner(env: &mut Env<'_>) -> Result<(), Revert> {
    let owner = owner(env)?;
    require(env.caller() == owner, "O: caller must be the owner")
}

fn set_owner(env: &mut Env<'_>, new_owner: Address) -> Result<(), Revert> {
    let previous_owner = owner(env)?;
    env.store(OwnableState { owner: new_owner })?;
    env.emit(&IOwnable::OwnershipTransferred {
        previousOwner: previous_owner,
        newOwner: new_owner,
    })
}

/// Serve the `IOwnable` entry points, or `None` if `input` is not one.
pub fn dispatch(env: &mut Env<'_>, input: &[u8]) -> Option<Result<Bytes, Revert>> {
    if !abi::handles::<IOwnable::IOwnableCalls>(input) {
        return None;
    }
    Some(abi::decode_call::<IOwnable::IOwnableCalls>(input).and_then(|call| match call {
        IOwnable::IOwnableCalls::owner(_) => {
            let owner = owner(env)?;
            Ok(abi::encode_return::<IOwnable::ownerCall>(&owner))
        }
        IOwnable::IOwnableCalls::transferOwnership(call) => {
            only_owner(env)?;
            require(
                !call.newOwner.is_zero(),
                "O: new owner must not be the zero address",
            )?;
            set_owner(env, call.newOwner)?;
            Ok(Bytes::new())
        }
        IOwnable::IOwnableCalls::renounceOwnership(_) => {
            only_owner(env)?;
            set_owner(env, Address::ZERO)?;
            Ok(Bytes::new())
        }
    }))
}
