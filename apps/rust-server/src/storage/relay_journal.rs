// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Journal of relayed identity ops, backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `relay_ops`: op_hash → serialized RelayRecord
//! - `identity_ops`: composite key (identity|!timestamp|op_hash) → module

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: lowercase op hash → serialized RelayRecord (JSON bytes).
const RELAY_OPS: TableDefinition<&str, &[u8]> = TableDefinition::new("relay_ops");

/// Index: composite key → relayer module address.
/// Key format: `identity|!timestamp_be|op_hash` for descending-time range scans.
const IDENTITY_OPS: TableDefinition<&[u8], &str> = TableDefinition::new("identity_ops");

/// `0x` + 40 hex characters.
const ADDRESS_LEN: usize = 42;
/// `0x` + 64 hex characters.
const HASH_LEN: usize = 66;

// =============================================================================
// Records
// =============================================================================

/// Refund paid by the identity for a relayed op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefundRecord {
    pub receiver: String,
    /// `0x0000000000000000000000000000000000000000` for the native asset.
    pub token: String,
    /// Base units, decimal.
    pub amount: String,
}

/// A relayed op as stored in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RelayRecord {
    pub op_hash: String,
    pub identity: String,
    pub module: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    /// Whether the inner call succeeded.
    pub success: bool,
    /// Inner call return data (or revert payload), hex encoded.
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund: Option<RefundRecord>,
    pub relayed_at: DateTime<Utc>,
}

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayDbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

pub type RelayDbResult<T> = Result<T, RelayDbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// `identity | inverted_timestamp_be_bytes | op_hash`, every part fixed width.
///
/// The inverted timestamp gives newest-first ordering when scanning forward.
fn make_index_key(identity: &str, timestamp: i64, op_hash: &str) -> Vec<u8> {
    let mut key = make_prefix(identity);
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(op_hash.as_bytes());
    key
}

fn make_prefix(identity: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(ADDRESS_LEN + 1 + 8 + 1 + HASH_LEN);
    prefix.extend_from_slice(identity.to_lowercase().as_bytes());
    prefix.push(b'|');
    prefix
}

fn make_prefix_end(identity: &str) -> Vec<u8> {
    let mut end = make_prefix(identity);
    end.extend_from_slice(&[0xFF; 9]);
    end
}

fn op_hash_from_key(key: &[u8]) -> Option<&str> {
    key.get(ADDRESS_LEN + 1 + 8 + 1..)
        .and_then(|hash| std::str::from_utf8(hash).ok())
}

fn check_lengths(record: &RelayRecord) -> RelayDbResult<()> {
    if record.identity.len() != ADDRESS_LEN || record.op_hash.len() != HASH_LEN {
        return Err(RelayDbError::InvalidRecord(format!(
            "identity {} / op hash {}",
            record.identity, record.op_hash
        )));
    }
    Ok(())
}

// =============================================================================
// RelayJournal
// =============================================================================

pub struct RelayJournal {
    db: Database,
}

impl RelayJournal {
    /// Open (or create) the journal at the given path.
    pub fn open(path: &Path) -> RelayDbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create tables so read transactions never miss them
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RELAY_OPS)?;
            let _ = write_txn.open_table(IDENTITY_OPS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store a relayed op and index it under its identity.
    ///
    /// Recording an op hash again replaces the earlier record and its index
    /// entry.
    pub fn record(&self, record: &RelayRecord) -> RelayDbResult<()> {
        check_lengths(record)?;
        let op_hash = record.op_hash.to_lowercase();
        let json = serde_json::to_vec(record)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut ops = write_txn.open_table(RELAY_OPS)?;
            let mut index = write_txn.open_table(IDENTITY_OPS)?;

            let previous = match ops.get(op_hash.as_str())? {
                Some(existing) => Some(serde_json::from_slice::<RelayRecord>(existing.value())?),
                None => None,
            };
            if let Some(previous) = previous {
                let stale = make_index_key(&previous.identity, previous.relayed_at.timestamp(), &op_hash);
                index.remove(stale.as_slice())?;
            }

            ops.insert(op_hash.as_str(), json.as_slice())?;
            let key = make_index_key(&record.identity, record.relayed_at.timestamp(), &op_hash);
            index.insert(key.as_slice(), record.module.as_str())?;
        }
        write_txn.commit()?;

        tracing::debug!(op_hash = %op_hash, identity = %record.identity, "Journaled relayed op");
        Ok(())
    }

    /// Drop every record and index entry.
    pub fn clear(&self) -> RelayDbResult<()> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(RELAY_OPS)?;
        write_txn.delete_table(IDENTITY_OPS)?;
        {
            let _ = write_txn.open_table(RELAY_OPS)?;
            let _ = write_txn.open_table(IDENTITY_OPS)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, op_hash: &str) -> RelayDbResult<Option<RelayRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RELAY_OPS)?;
        match table.get(op_hash.to_lowercase().as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Newest-first page of ops relayed for `identity`.
    ///
    /// Returns `(records, next_cursor)`; pass the cursor back to continue.
    pub fn list_by_identity(
        &self,
        identity: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> RelayDbResult<(Vec<RelayRecord>, Option<String>)> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(IDENTITY_OPS)?;
        let ops = read_txn.open_table(RELAY_OPS)?;

        let prefix = make_prefix(identity);
        let prefix_end = make_prefix_end(identity);
        let start = cursor
            .and_then(|cursor| alloy::hex::decode(cursor).ok())
            .filter(|key| key.starts_with(&prefix))
            .unwrap_or_else(|| prefix.clone());
        let skip_cursor = start != prefix;

        let mut records = Vec::with_capacity(limit);
        let mut last_key = None;
        for entry in index.range(start.as_slice()..prefix_end.as_slice())? {
            let (key, _) = entry?;
            let key = key.value();
            if skip_cursor && key == start.as_slice() {
                continue;
            }
            if records.len() >= limit {
                break;
            }

            let Some(op_hash) = op_hash_from_key(key) else {
                continue;
            };
            if let Some(value) = ops.get(op_hash)? {
                records.push(serde_json::from_slice(value.value())?);
                last_key = Some(key.to_vec());
            }
        }

        let next_cursor = if records.len() >= limit {
            last_key.map(alloy::hex::encode)
        } else {
            None
        };
        Ok((records, next_cursor))
    }
}

// =============================================================================
// Tests
// =============================================================================
