// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::evm::ChainError;
use crate::relayer::RelayerError;
use crate::storage::RelayDbError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ChainError> for ApiError {
    /// Reverts are the caller's to fix. Everything else (relayer funds, gas
    /// limits, return decoding) is on the service.
    fn from(err: ChainError) -> Self {
        match err.revert() {
            Some(revert) => Self::unprocessable(revert.message()),
            None => {
                tracing::error!(error = %err, "Chain failure");
                Self::internal(err.to_string())
            }
        }
    }
}

impl From<RelayerError> for ApiError {
    fn from(err: RelayerError) -> Self {
        match err {
            RelayerError::Chain(err) => err.into(),
            other => {
                tracing::error!(error = %other, "Relayer failure");
                Self::internal(other.to_string())
            }
        }
    }
}

impl From<RelayDbError> for ApiError {
    fn from(err: RelayDbError) -> Self {
        tracing::error!(error = %err, "Relay journal failure");
        Self::internal("relay journal unavailable")
    }
}
