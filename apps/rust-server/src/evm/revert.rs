// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Revert reasons.
//!
//! Every failing contract frame produces a [`Revert`]. Reasons round-trip
//! through the standard `Error(string)` ABI encoding so that a caller that
//! captures a failure (the relayer's `Executed` event) sees the same bytes a
//! Solidity contract would have produced.

use alloy::primitives::Bytes;
use alloy::sol_types::{Revert as RevertError, SolError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Revert {
    /// `revert("reason")` / failed `require`.
    #[error("{0}")]
    Reason(String),

    /// The frame ran out of gas.
    #[error("out of gas")]
    OutOfGas,

    /// Revert data that is not an `Error(string)` payload.
    #[error("reverted with data 0x{}", alloy::hex::encode(.0))]
    Raw(Bytes),
}

impl Revert {
    pub fn reason(message: impl Into<String>) -> Self {
        Self::Reason(message.into())
    }

    /// Human readable message, as surfaced in API errors and logs.
    pub fn message(&self) -> String {
        match self {
            Self::Reason(reason) => reason.clone(),
            other => other.to_string(),
        }
    }

    /// ABI revert payload (`0x08c379a0 ++ abi.encode(reason)`).
    pub fn encode(&self) -> Bytes {
        match self {
            Self::Reason(reason) => RevertError::from(reason.as_str()).abi_encode().into(),
            Self::OutOfGas => Bytes::new(),
            Self::Raw(data) => data.clone(),
        }
    }

    /// Inverse of [`Revert::encode`].
    pub fn decode(data: &[u8]) -> Self {
        if let Ok(revert) = RevertError::abi_decode(data) {
            return Self::Reason(revert.reason);
        }
        if data.is_empty() {
            return Self::OutOfGas;
        }
        Self::Raw(Bytes::copy_from_slice(data))
    }
}

/// Solidity-style `require`.
#[inline]
pub fn require(condition: bool, reason: &str) -> Result<(), Revert> {
    if condition {
        Ok(())
    } else {
        Err(Revert::reason(reason))
    }
}
