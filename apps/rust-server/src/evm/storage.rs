// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed per-account storage.
//!
//! Each contract keeps its persistent state in plain Rust structs. A slot is
//! identified by the struct type plus a 32-byte key: [`B256::ZERO`] for a
//! contract-wide struct, the mapping key for a per-entry struct (the
//! `mapping(address => Lock)` of Solidity). A proxy and the logic it
//! delegates to share state by agreeing on the struct, not on slot numbers.
//!
//! Slot values are immutable once written and shared behind an [`Arc`], so
//! cloning an account or keeping a value for rollback never copies state.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, FixedBytes, B256};

/// Marker for types that can live in account storage.
pub trait SlotValue: Any + Clone + Default + Send + Sync {}

impl<T: Any + Clone + Default + Send + Sync> SlotValue for T {}

/// Mapping key of a per-entry slot.
pub trait SlotKey {
    fn slot_key(&self) -> B256;
}

impl SlotKey for B256 {
    fn slot_key(&self) -> B256 {
        *self
    }
}

impl SlotKey for Address {
    fn slot_key(&self) -> B256 {
        self.into_word()
    }
}

impl SlotKey for FixedBytes<4> {
    fn slot_key(&self) -> B256 {
        B256::left_padding_from(self.as_slice())
    }
}

/// Nested mapping key, e.g. `allowance[owner][spender]`.
impl SlotKey for (Address, Address) {
    fn slot_key(&self) -> B256 {
        let mut packed = [0u8; 40];
        packed[..20].copy_from_slice(self.0.as_slice());
        packed[20..].copy_from_slice(self.1.as_slice());
        keccak256(packed)
    }
}

/// Struct type and key of one slot.
pub type SlotId = (TypeId, B256);

/// A stored value, shared between the account and any pending rollback.
pub type SlotRef = Arc<dyn Any + Send + Sync>;

pub fn slot_id<T: SlotValue>(key: B256) -> SlotId {
    (TypeId::of::<T>(), key)
}

#[derive(Clone, Default)]
pub struct Storage {
    slots: HashMap<SlotId, SlotRef>,
}

impl Storage {
    /// Current value, or `T::default()` for a never-written slot.
    pub fn get<T: SlotValue>(&self, key: B256) -> T {
        self.slots
            .get(&slot_id::<T>(key))
            .and_then(|slot| (**slot).downcast_ref::<T>())
            .cloned()
            .unwrap_or_default()
    }

    /// Write a slot, returning what it held before.
    pub fn set<T: SlotValue>(&mut self, key: B256, value: T) -> Option<SlotRef> {
        self.slots.insert(slot_id::<T>(key), Arc::new(value))
    }

    /// Put back a value returned by [`Storage::set`].
    pub(crate) fn restore(&mut self, id: SlotId, previous: Option<SlotRef>) {
        match previous {
            Some(value) => {
                self.slots.insert(id, value);
            }
            None => {
                self.slots.remove(&id);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("slots", &self.slots.len())
            .finish()
    }
}
