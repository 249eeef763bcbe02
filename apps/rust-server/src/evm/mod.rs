// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process EVM-compatible execution host.
//!
//! This module provides:
//! - An accounts arena with typed per-contract storage
//! - Atomic call / static call / delegate call frames
//! - CREATE and CREATE2 deployment
//! - A deterministic gas schedule and block clock
//! - The `sol!` ABI of every contract in the system

pub mod abi;
pub mod chain;
pub mod contract;
pub mod ecdsa;
pub mod env;
pub mod gas;
pub mod math;
pub mod revert;
pub mod storage;
pub mod types;

pub use chain::Chain;
pub use contract::{Code, CodeLoader, Contract};
pub use env::Env;
pub use revert::{require, Revert};
pub use types::*;
