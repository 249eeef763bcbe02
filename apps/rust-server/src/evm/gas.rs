// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas schedule and metering.
//!
//! Costs are a flat approximation of the post-Berlin schedule. They only
//! need to be stable and monotonic: the relayer refund formula is defined in
//! terms of gas observed between two points of the same transaction.

use super::revert::Revert;

pub const TX_BASE: u64 = 21_000;
pub const TX_CREATE: u64 = 32_000;
pub const CALLDATA_BYTE: u64 = 16;
pub const CALL: u64 = 2_600;
pub const CALL_VALUE: u64 = 9_000;
pub const CREATE: u64 = 32_000;
pub const SLOAD: u64 = 2_100;
pub const SSTORE: u64 = 5_000;
pub const LOG: u64 = 375;
pub const LOG_TOPIC: u64 = 375;
pub const LOG_DATA_BYTE: u64 = 8;
pub const ECRECOVER: u64 = 3_000;
pub const KECCAK: u64 = 30;
pub const KECCAK_WORD: u64 = 6;

/// Default block gas limit for a single transaction.
pub const BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// Intrinsic cost charged before the first frame runs.
pub fn intrinsic(data: &[u8], is_create: bool) -> u64 {
    let base = if is_create { TX_BASE + TX_CREATE } else { TX_BASE };
    base + CALLDATA_BYTE * data.len() as u64
}

pub fn keccak(len: usize) -> u64 {
    KECCAK + KECCAK_WORD * (len as u64).div_ceil(32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn charge(&mut self, amount: u64) -> Result<(), Revert> {
        let used = self.used.saturating_add(amount);
        if used > self.limit {
            return Err(Revert::OutOfGas);
        }
        self.used = used;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

impl Default for GasMeter {
    fn default() -> Self {
        Self::new(BLOCK_GAS_LIMIT)
    }
}
