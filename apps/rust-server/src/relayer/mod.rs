// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Off-chain side of the identity protocol.
//!
//! - `deploy` - idempotent bootstrap of the core contracts
//! - `op` - identity op hashing and signing
//! - `signing` - relayer key handling
//! - `submit` - relaying signed ops and reading back their outcome

pub mod deploy;
pub mod op;
pub mod signing;
pub mod submit;

use alloy::primitives::U256;

use crate::evm::ChainError;

pub use deploy::{DeployConfig, Deployer, Deployment};
pub use op::{IdentityOp, IdentityOpBuilder};
pub use submit::{Refund, RelayOutcome, Relayer};

/// Errors raised by relayer tooling.
#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] alloy::signers::Error),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Deployment failed: {0}")]
    Deployment(String),

    #[error("Missing {0} event in receipt")]
    MissingEvent(&'static str),
}

impl RelayerError {
    /// Contract revert reason, when the failure came from execution.
    pub fn revert_reason(&self) -> Option<String> {
        match self {
            Self::Chain(err) => err.revert().map(|revert| revert.message()),
            _ => None,
        }
    }
}

/// Format a base-unit amount with `decimals` decimals, keeping at most six.
pub fn format_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }
    let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
    let trimmed = decimal_str.trim_end_matches('0');
    format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_native_amounts() {
        let one = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_balance(one, 18), "1");
        assert_eq!(format_balance(one / U256::from(2u8), 18), "0.5");
        assert_eq!(
            format_balance(U256::from(1_234_567_890_000_000_000u64), 18),
            "1.234567"
        );
        assert_eq!(format_balance(U256::ZERO, 18), "0");
    }

    #[test]
    fn revert_reason_is_exposed() {
        let err = RelayerError::from(ChainError::from(crate::evm::Revert::reason(
            "RM: invalid signer",
        )));
        assert_eq!(err.revert_reason().as_deref(), Some("RM: invalid signer"));
        assert_eq!(
            RelayerError::Deployment("x".into()).revert_reason(),
            None
        );
    }
}
