// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Modules: contracts an identity grants authority to.

pub mod base;
pub mod delegate;
pub mod relayer;

pub use base::ModuleBase;
pub use delegate::DelegateModule;
pub use relayer::{identity_op_hash, GasParams, RefundPolicy, RelayerModule, RelayerVariant};
