// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature recovery helpers used by the relayer and delegate modules.

use alloy::primitives::{eip191_hash_message, Address, Signature, B256};

use super::revert::{require, Revert};

/// Length of one `r ++ s ++ v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

/// `keccak256("\x19Ethereum Signed Message:\n32" ++ hash)`
pub fn to_eth_signed_message_hash(hash: B256) -> B256 {
    eip191_hash_message(hash)
}

/// Recover the signer of a 65-byte signature over `hash`.
///
/// Rejects malformed lengths, upper-range `s` values and signatures that do
/// not recover to a point.
pub fn recover(hash: B256, signature: &[u8]) -> Result<Address, Revert> {
    require(
        signature.len() == SIGNATURE_LENGTH,
        "ECDSA: invalid signature length",
    )?;
    let signature = Signature::from_raw(signature)
        .map_err(|_| Revert::reason("ECDSA: invalid signature 'v' value"))?;
    require(
        signature.normalize_s().is_none(),
        "ECDSA: invalid signature 's' value",
    )?;
    signature
        .recover_address_from_prehash(&hash)
        .map_err(|_| Revert::reason("ECDSA: invalid signature"))
}

/// Number of signatures packed in `signatures`.
pub fn signature_count(signatures: &[u8]) -> Result<usize, Revert> {
    require(
        !signatures.is_empty() && signatures.len() % SIGNATURE_LENGTH == 0,
        "ECDSA: invalid signature length",
    )?;
    Ok(signatures.len() / SIGNATURE_LENGTH)
}

/// Recover the signer of the `index`-th signature in a packed blob.
pub fn recover_at(hash: B256, signatures: &[u8], index: usize) -> Result<Address, Revert> {
    let start = index * SIGNATURE_LENGTH;
    let signature = signatures
        .get(start..start + SIGNATURE_LENGTH)
        .ok_or_else(|| Revert::reason("ECDSA: invalid signature length"))?;
    recover(hash, signature)
}
