// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Checked narrowing of ABI integers.

use alloy::primitives::U256;

use super::revert::Revert;

pub fn to_u64(value: U256) -> Result<u64, Revert> {
    u64::try_from(value).map_err(|_| Revert::reason("SC: v must fit in 64 bits"))
}
