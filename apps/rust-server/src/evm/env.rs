// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Execution context handed to contract code.
//!
//! An [`Env`] is the contract's only way to touch the outside world: it
//! exposes `msg.*`, `tx.*` and `block.*`, the storage of the account whose
//! context the frame runs in, and the ability to call, delegate-call and
//! create other contracts.

use alloy::primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy::sol_types::{SolCall, SolEvent};

use super::chain::Chain;
use super::gas;
use super::revert::{require, Revert};
use super::storage::{SlotKey, SlotValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    StaticCall,
    DelegateCall,
}

/// One message-call frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// `msg.sender`
    pub caller: Address,
    /// `address(this)`: whose storage and balance the frame uses.
    pub address: Address,
    /// Account whose code is executing.
    pub code_address: Address,
    /// `msg.value`
    pub value: U256,
    pub kind: CallKind,
    pub is_static: bool,
    pub depth: usize,
}

impl Frame {
    pub fn call(caller: Address, to: Address, value: U256) -> Self {
        Self {
            caller,
            address: to,
            code_address: to,
            value,
            kind: CallKind::Call,
            is_static: false,
            depth: 0,
        }
    }
}

const STATIC_VIOLATION: &str = "state change during static call";

pub struct Env<'a> {
    chain: &'a mut Chain,
    frame: Frame,
}

impl<'a> Env<'a> {
    pub(crate) fn new(chain: &'a mut Chain, frame: Frame) -> Self {
        Self { chain, frame }
    }

    // =========================================================================
    // Context
    // =========================================================================

    pub fn caller(&self) -> Address {
        self.frame.caller
    }

    pub fn address(&self) -> Address {
        self.frame.address
    }

    pub fn code_address(&self) -> Address {
        self.frame.code_address
    }

    pub fn value(&self) -> U256 {
        self.frame.value
    }

    pub fn is_static(&self) -> bool {
        self.frame.is_static
    }

    pub fn origin(&self) -> Address {
        self.chain.tx_origin()
    }

    pub fn tx_gas_price(&self) -> U256 {
        self.chain.tx_gas_price()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain.chain_id()
    }

    pub fn timestamp(&self) -> u64 {
        self.chain.timestamp()
    }

    pub fn gas_left(&self) -> u64 {
        self.chain.gas_left()
    }

    pub fn charge_gas(&mut self, amount: u64) -> Result<(), Revert> {
        self.chain.charge(amount)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// `addr.code.length > 0`
    pub fn is_contract(&self, address: Address) -> bool {
        self.chain.has_code(address)
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.chain.balance(address)
    }

    pub fn keccak256(&mut self, data: &[u8]) -> Result<B256, Revert> {
        self.charge_gas(gas::keccak(data.len()))?;
        Ok(keccak256(data))
    }

    // =========================================================================
    // Storage & logs
    // =========================================================================

    /// Contract-wide storage struct.
    pub fn load<T: SlotValue>(&mut self) -> Result<T, Revert> {
        self.load_entry::<T>(B256::ZERO)
    }

    pub fn store<T: SlotValue>(&mut self, value: T) -> Result<(), Revert> {
        self.store_entry(B256::ZERO, value)
    }

    /// Load, mutate and store a storage struct.
    pub fn update<T: SlotValue, R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Result<R, Revert> {
        self.update_entry(B256::ZERO, f)
    }

    /// One entry of a storage mapping.
    pub fn load_entry<T: SlotValue>(&mut self, key: impl SlotKey) -> Result<T, Revert> {
        self.charge_gas(gas::SLOAD)?;
        Ok(self.chain.storage::<T>(self.frame.address, key.slot_key()))
    }

    pub fn store_entry<T: SlotValue>(&mut self, key: impl SlotKey, value: T) -> Result<(), Revert> {
        require(!self.frame.is_static, STATIC_VIOLATION)?;
        self.charge_gas(gas::SSTORE)?;
        self.chain.store_slot(self.frame.address, key.slot_key(), value);
        Ok(())
    }

    pub fn update_entry<T: SlotValue, R>(
        &mut self,
        key: impl SlotKey,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, Revert> {
        let key = key.slot_key();
        let mut value = self.load_entry::<T>(key)?;
        let result = f(&mut value);
        self.store_entry(key, value)?;
        Ok(result)
    }

    pub fn emit<E: SolEvent>(&mut self, event: &E) -> Result<(), Revert> {
        require(!self.frame.is_static, STATIC_VIOLATION)?;
        let data = event.encode_log_data();
        self.charge_gas(
            gas::LOG
                + gas::LOG_TOPIC * data.topics().len() as u64
                + gas::LOG_DATA_BYTE * data.data.len() as u64,
        )?;
        self.chain.push_log(Log {
            address: self.frame.address,
            data,
        });
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    /// `to.call{value: value}(data)`
    pub fn call(&mut self, to: Address, value: U256, data: &[u8]) -> Result<Bytes, Revert> {
        require(value.is_zero() || !self.frame.is_static, STATIC_VIOLATION)?;
        let frame = Frame {
            caller: self.frame.address,
            address: to,
            code_address: to,
            value,
            kind: CallKind::Call,
            is_static: self.frame.is_static,
            depth: self.frame.depth + 1,
        };
        self.chain.execute_frame(frame, data)
    }

    /// `to.staticcall(data)`
    pub fn static_call(&mut self, to: Address, data: &[u8]) -> Result<Bytes, Revert> {
        let frame = Frame {
            caller: self.frame.address,
            address: to,
            code_address: to,
            value: U256::ZERO,
            kind: CallKind::StaticCall,
            is_static: true,
            depth: self.frame.depth + 1,
        };
        self.chain.execute_frame(frame, data)
    }

    /// `target.delegatecall(data)`: run `target`'s code against this
    /// account's storage, keeping `msg.sender` and `msg.value`.
    pub fn delegate_call(&mut self, target: Address, data: &[u8]) -> Result<Bytes, Revert> {
        let frame = Frame {
            code_address: target,
            kind: CallKind::DelegateCall,
            depth: self.frame.depth + 1,
            ..self.frame
        };
        self.chain.execute_frame(frame, data)
    }

    /// Typed [`Env::call`].
    pub fn call_contract<C: SolCall>(&mut self, to: Address, value: U256, call: &C) -> Result<C::Return, Revert> {
        let output = self.call(to, value, &call.abi_encode())?;
        decode_returns::<C>(&output)
    }

    /// Typed [`Env::static_call`].
    pub fn view<C: SolCall>(&mut self, to: Address, call: &C) -> Result<C::Return, Revert> {
        let output = self.static_call(to, &call.abi_encode())?;
        decode_returns::<C>(&output)
    }

    // =========================================================================
    // Contract creation
    // =========================================================================

    /// CREATE: address derived from this account's nonce.
    pub fn create(&mut self, init_code: &[u8], value: U256) -> Result<Address, Revert> {
        require(!self.frame.is_static, STATIC_VIOLATION)?;
        let deployer = self.frame.address;
        let nonce = self.chain.bump_nonce(deployer);
        let address = deployer.create(nonce);
        self.chain
            .create_at(deployer, address, init_code, value, self.frame.depth + 1)
    }

    /// CREATE2: `keccak256(0xff ++ this ++ salt ++ keccak256(init_code))[12..]`.
    pub fn create2(&mut self, salt: B256, init_code: &[u8], value: U256) -> Result<Address, Revert> {
        require(!self.frame.is_static, STATIC_VIOLATION)?;
        let deployer = self.frame.address;
        let init_code_hash = self.keccak256(init_code)?;
        let address = deployer.create2(salt, init_code_hash);
        self.chain
            .create_at(deployer, address, init_code, value, self.frame.depth + 1)
    }
}

fn decode_returns<C: SolCall>(output: &[u8]) -> Result<C::Return, Revert> {
    C::abi_decode_returns(output).map_err(|err| {
        Revert::reason(format!("{}: invalid return data ({err})", C::SIGNATURE))
    })
}
