// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relayer key handling.

use alloy::signers::local::PrivateKeySigner;
use k256::{ecdsa::SigningKey, SecretKey};

use super::RelayerError;

/// Parse a hex-encoded secp256k1 private key (`0x` prefix optional).
pub fn signer_from_hex(key: &str) -> Result<PrivateKeySigner, RelayerError> {
    let bytes = alloy::hex::decode(key.trim())
        .map_err(|e| RelayerError::InvalidPrivateKey(format!("Invalid hex: {e}")))?;
    let secret = SecretKey::from_slice(&bytes)
        .map_err(|e| RelayerError::InvalidPrivateKey(format!("Invalid key: {e}")))?;
    Ok(PrivateKeySigner::from_signing_key(SigningKey::from(secret)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn parses_hardhat_key() {
        let signer = signer_from_hex(KEY).unwrap();
        assert_eq!(
            signer.address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
        // Prefix is optional.
        assert_eq!(
            signer_from_hex(&KEY[2..]).unwrap().address(),
            signer.address()
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(
            signer_from_hex("0xzz"),
            Err(RelayerError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            signer_from_hex(&"00".repeat(32)),
            Err(RelayerError::InvalidPrivateKey(_))
        ));
    }
}
