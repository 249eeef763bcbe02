// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract code as seen by the host.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{Bytes, B256};

use super::env::Env;
use super::revert::Revert;

/// Executable logic installed at an address.
///
/// Immutables (constructor arguments that Solidity would bake into runtime
/// bytecode) live on the implementing struct. Mutable state lives in the
/// account's storage and is reached through [`Env`].
pub trait Contract: Send + Sync {
    /// Runs once, at deployment, in the new account's context.
    fn construct(&self, _env: &mut Env<'_>) -> Result<(), Revert> {
        Ok(())
    }

    /// Handles one message call. `input` is the raw calldata.
    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert>;
}

/// Code deployed at an account.
#[derive(Clone)]
pub struct Code {
    /// Artifact name, for diagnostics.
    pub name: &'static str,
    /// Hash of the init code that produced this account.
    pub hash: B256,
    pub logic: Arc<dyn Contract>,
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Code")
            .field("name", &self.name)
            .field("hash", &self.hash)
            .finish()
    }
}

/// Turns init code into runnable [`Code`].
pub trait CodeLoader: Send + Sync {
    fn load(&self, init_code: &[u8]) -> Result<Code, Revert>;
}
