// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Parsing of hex and numeric request fields.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};

use crate::contracts::modules::GasParams;
use crate::error::ApiError;
use crate::models::GasParamsDto;

pub fn address(field: &str, value: &str) -> Result<Address, ApiError> {
    Address::from_str(value.trim())
        .map_err(|_| ApiError::bad_request(format!("{field} must be a 20-byte hex address")))
}

pub fn b256(field: &str, value: &str) -> Result<B256, ApiError> {
    B256::from_str(value.trim())
        .map_err(|_| ApiError::bad_request(format!("{field} must be a 32-byte hex value")))
}

pub fn bytes(field: &str, value: &str) -> Result<Bytes, ApiError> {
    alloy::hex::decode(value.trim())
        .map(Bytes::from)
        .map_err(|_| ApiError::bad_request(format!("{field} must be hex encoded")))
}

/// Decimal, or hex with a `0x` prefix.
pub fn u256(field: &str, value: &str) -> Result<U256, ApiError> {
    U256::from_str(value.trim())
        .map_err(|_| ApiError::bad_request(format!("{field} must be an unsigned integer")))
}

fn optional<T>(
    value: Option<&String>,
    parse: impl Fn(&str) -> Result<T, ApiError>,
) -> Result<Option<T>, ApiError> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse(value))
        .transpose()
}

/// Refund terms; omitted fields are zero (no refund, native asset, relayer
/// receives).
pub fn gas(dto: Option<&GasParamsDto>) -> Result<GasParams, ApiError> {
    let Some(dto) = dto else {
        return Ok(GasParams::default());
    };
    Ok(GasParams {
        price: optional(dto.price.as_ref(), |v| u256("gas.price", v))?.unwrap_or_default(),
        limit: optional(dto.limit.as_ref(), |v| u256("gas.limit", v))?.unwrap_or_default(),
        token: optional(dto.token.as_ref(), |v| address("gas.token", v))?.unwrap_or_default(),
        refund_to: optional(dto.refund_to.as_ref(), |v| address("gas.refund_to", v))?
            .unwrap_or_default(),
    })
}
