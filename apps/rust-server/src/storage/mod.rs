// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Persistent Storage
//!
//! The chain itself lives in memory; only the relayer's journal of submitted
//! ops is persisted, under `DATA_DIR`:
//!
//! ```text
//! {DATA_DIR}/
//!   relay.redb    # relayed ops, indexed by identity
//! ```

pub mod relay_journal;

pub use relay_journal::{RefundRecord, RelayDbError, RelayDbResult, RelayJournal, RelayRecord};

/// File name of the journal inside `DATA_DIR`.
pub const JOURNAL_FILE: &str = "relay.redb";
