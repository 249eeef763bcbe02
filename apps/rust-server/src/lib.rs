// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! unWallet Identity - Programmable Identity Accounts and Relayer Service
//!
//! Identity accounts whose behaviour is extended by registered modules,
//! guarded by time-bounded locks and driven by signed meta-transactions that
//! a relayer submits and is refunded for.
//!
//! ## Modules
//!
//! - `evm` - In-process EVM-compatible execution host
//! - `contracts` - Identity, module registry/manager, lock manager, relayer modules
//! - `relayer` - Off-chain op signing, deployment and submission
//! - `api` - HTTP API handlers (Axum)
//! - `storage` - Relay journal (redb)

pub mod api;
pub mod block_clock;
pub mod config;
pub mod contracts;
pub mod error;
pub mod evm;
pub mod models;
pub mod relayer;
pub mod state;
pub mod storage;
