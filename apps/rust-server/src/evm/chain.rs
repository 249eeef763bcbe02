// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process chain.
//!
//! [`Chain`] owns every account (balance, nonce, code, typed storage), the
//! block clock and the per-transaction environment. Contract frames run
//! against it through [`Env`]. A frame that fails rolls back every state
//! change it made, including nested frames and logs, before the caller sees
//! the [`Revert`].
//!
//! Rollback is an undo log: every balance, nonce, code or storage write made
//! inside a transaction records the value it replaced, and a failing frame
//! replays the log back to where it started. Accounts sit behind a
//! copy-on-write [`Arc`], so read-only calls run against a shared view of the
//! state instead of a copy.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy::sol_types::SolCall;

use super::contract::{Code, CodeLoader};
use super::env::{CallKind, Env, Frame};
use super::gas::{self, GasMeter};
use super::revert::{require, Revert};
use super::storage::{slot_id, SlotId, SlotRef, SlotValue, Storage};
use super::types::{ChainError, ChainResult, NetworkConfig, Receipt, Tx};

/// Maximum nesting of message calls.
pub const MAX_CALL_DEPTH: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct Account {
    pub balance: U256,
    pub nonce: u64,
    pub code: Option<Code>,
    pub storage: Storage,
}

#[derive(Debug, Clone, Copy, Default)]
struct TxEnv {
    origin: Address,
    gas_price: U256,
}

/// A state write and the value it replaced.
enum Change {
    Balance { address: Address, previous: U256 },
    Nonce { address: Address, previous: u64 },
    Code { address: Address, previous: Option<Code> },
    Slot { address: Address, id: SlotId, previous: Option<SlotRef> },
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    changes: usize,
    logs: usize,
}

pub struct Chain {
    network: NetworkConfig,
    loader: Arc<dyn CodeLoader>,
    accounts: Arc<HashMap<Address, Account>>,
    block_number: u64,
    timestamp: u64,
    tx: TxEnv,
    gas: GasMeter,
    logs: Vec<Log>,
    changes: Vec<Change>,
}

impl Chain {
    pub fn new(network: NetworkConfig, loader: Arc<dyn CodeLoader>) -> Self {
        Self {
            network,
            loader,
            accounts: Arc::new(HashMap::new()),
            block_number: 0,
            timestamp: chrono::Utc::now().timestamp().max(0) as u64,
            tx: TxEnv::default(),
            gas: GasMeter::default(),
            logs: Vec::new(),
            changes: Vec::new(),
        }
    }

    // =========================================================================
    // Block environment
    // =========================================================================

    pub fn network(&self) -> NetworkConfig {
        self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    /// Advance the clock and mine an empty block.
    pub fn increase_time(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
        self.block_number += 1;
    }

    // =========================================================================
    // Account inspection
    // =========================================================================

    pub fn balance(&self, address: Address) -> U256 {
        self.accounts
            .get(&address)
            .map(|account| account.balance)
            .unwrap_or_default()
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.account_mut(address).balance = balance;
    }

    pub fn nonce(&self, address: Address) -> u64 {
        self.accounts
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or_default()
    }

    pub fn code(&self, address: Address) -> Option<&Code> {
        self.accounts.get(&address).and_then(|account| account.code.as_ref())
    }

    pub fn has_code(&self, address: Address) -> bool {
        self.code(address).is_some()
    }

    /// Raw view of a storage slot at `address`; `key` is [`B256::ZERO`] for
    /// contract-wide structs.
    pub fn storage<T: SlotValue>(&self, address: Address, key: B256) -> T {
        self.accounts
            .get(&address)
            .map(|account| account.storage.get::<T>(key))
            .unwrap_or_default()
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Execute a transaction.
    ///
    /// The sender pays `gas_used * gas_price`. On revert the nonce bump and
    /// the fee stick; everything else is rolled back and the reason returned.
    pub fn transact(&mut self, tx: Tx) -> ChainResult<Receipt> {
        let intrinsic = gas::intrinsic(&tx.data, tx.to.is_none());
        if tx.gas_limit < intrinsic {
            return Err(ChainError::IntrinsicGasTooLow {
                need: intrinsic,
                limit: tx.gas_limit,
            });
        }

        let max_fee = tx.gas_price.saturating_mul(U256::from(tx.gas_limit));
        let need = max_fee.saturating_add(tx.value);
        let sender = self.account_mut(tx.from);
        if sender.balance < need {
            return Err(ChainError::InsufficientFunds {
                have: sender.balance,
                need,
            });
        }
        sender.balance -= max_fee;
        let nonce = sender.nonce;
        sender.nonce += 1;

        self.block_number += 1;
        self.tx = TxEnv {
            origin: tx.from,
            gas_price: tx.gas_price,
        };
        self.gas = GasMeter::new(tx.gas_limit);
        self.gas.charge(intrinsic)?;
        self.logs.clear();
        self.changes.clear();

        let outcome = match tx.to {
            Some(to) => self
                .execute_frame(Frame::call(tx.from, to, tx.value), &tx.data)
                .map(|output| (output, None)),
            None => {
                let address = tx.from.create(nonce);
                self.create_at(tx.from, address, &tx.data, tx.value, 0)
                    .map(|address| (Bytes::new(), Some(address)))
            }
        };

        let gas_used = self.gas.used();
        let unused = tx.gas_price * U256::from(tx.gas_limit - gas_used);
        self.account_mut(tx.from).balance += unused;
        let logs = std::mem::take(&mut self.logs);
        self.changes.clear();

        match outcome {
            Ok((output, contract_address)) => Ok(Receipt {
                tx_hash: tx.hash(nonce),
                block_number: self.block_number,
                timestamp: self.timestamp,
                from: tx.from,
                to: tx.to,
                contract_address,
                gas_used,
                effective_gas_price: tx.gas_price,
                output,
                logs,
            }),
            Err(revert) => {
                tracing::debug!(
                    from = %tx.from,
                    to = ?tx.to,
                    gas_used,
                    reason = %revert,
                    "Transaction reverted"
                );
                Err(revert.into())
            }
        }
    }

    /// Deploy `init_code` from `from` with a plain CREATE.
    pub fn deploy(&mut self, from: Address, init_code: impl Into<Bytes>) -> ChainResult<Address> {
        let receipt = self.transact(Tx::create(from, init_code))?;
        Ok(receipt.contract_address.unwrap_or_default())
    }

    /// Send a typed call and decode its return value.
    pub fn send<C: SolCall>(&mut self, from: Address, to: Address, call: &C) -> ChainResult<(C::Return, Receipt)> {
        let receipt = self.transact(Tx::call(from, to, call.abi_encode()))?;
        let ret = C::abi_decode_returns(&receipt.output)?;
        Ok((ret, receipt))
    }

    /// Read-only call. Static frames cannot write, so the scratch chain
    /// shares this chain's accounts without copying them.
    pub fn view(&self, to: Address, data: &[u8]) -> ChainResult<Bytes> {
        let mut scratch = Chain {
            network: self.network,
            loader: Arc::clone(&self.loader),
            accounts: Arc::clone(&self.accounts),
            block_number: self.block_number,
            timestamp: self.timestamp,
            tx: TxEnv::default(),
            gas: GasMeter::default(),
            logs: Vec::new(),
            changes: Vec::new(),
        };
        let frame = Frame {
            kind: CallKind::StaticCall,
            is_static: true,
            ..Frame::call(Address::ZERO, to, U256::ZERO)
        };
        Ok(scratch.execute_frame(frame, data)?)
    }

    /// Typed [`Chain::view`].
    pub fn call<C: SolCall>(&self, to: Address, call: &C) -> ChainResult<C::Return> {
        let output = self.view(to, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&output)?)
    }

    // =========================================================================
    // Frame execution (used by Env)
    // =========================================================================

    pub(crate) fn tx_origin(&self) -> Address {
        self.tx.origin
    }

    pub(crate) fn tx_gas_price(&self) -> U256 {
        self.tx.gas_price
    }

    pub(crate) fn gas_left(&self) -> u64 {
        self.gas.remaining()
    }

    pub(crate) fn charge(&mut self, amount: u64) -> Result<(), Revert> {
        self.gas.charge(amount)
    }

    /// Mutable access to an account, bypassing the undo log. Only for
    /// writes that survive a revert (fees, sender nonce) or happen outside a
    /// transaction.
    fn account_mut(&mut self, address: Address) -> &mut Account {
        Arc::make_mut(&mut self.accounts).entry(address).or_default()
    }

    fn set_balance_logged(&mut self, address: Address, balance: U256) {
        let previous = std::mem::replace(&mut self.account_mut(address).balance, balance);
        self.changes.push(Change::Balance { address, previous });
    }

    /// Increment `address`'s nonce, returning the value before.
    pub(crate) fn bump_nonce(&mut self, address: Address) -> u64 {
        let account = self.account_mut(address);
        let previous = account.nonce;
        account.nonce += 1;
        self.changes.push(Change::Nonce { address, previous });
        previous
    }

    fn install_code(&mut self, address: Address, code: Code) {
        let account = self.account_mut(address);
        let previous_nonce = std::mem::replace(&mut account.nonce, 1);
        let previous_code = account.code.replace(code);
        self.changes.push(Change::Nonce {
            address,
            previous: previous_nonce,
        });
        self.changes.push(Change::Code {
            address,
            previous: previous_code,
        });
    }

    pub(crate) fn store_slot<T: SlotValue>(&mut self, address: Address, key: B256, value: T) {
        let previous = self.account_mut(address).storage.set(key, value);
        self.changes.push(Change::Slot {
            address,
            id: slot_id::<T>(key),
            previous,
        });
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            changes: self.changes.len(),
            logs: self.logs.len(),
        }
    }

    /// Undo every write made since `checkpoint`, newest first.
    fn revert_to(&mut self, checkpoint: Checkpoint) {
        let undo = self.changes.split_off(checkpoint.changes);
        for change in undo.into_iter().rev() {
            match change {
                Change::Balance { address, previous } => {
                    self.account_mut(address).balance = previous;
                }
                Change::Nonce { address, previous } => {
                    self.account_mut(address).nonce = previous;
                }
                Change::Code { address, previous } => {
                    self.account_mut(address).code = previous;
                }
                Change::Slot {
                    address,
                    id,
                    previous,
                } => {
                    self.account_mut(address).storage.restore(id, previous);
                }
            }
        }
        self.logs.truncate(checkpoint.logs);
    }

    pub(crate) fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Run a message call; on failure restore the state it started from.
    pub(crate) fn execute_frame(&mut self, frame: Frame, input: &[u8]) -> Result<Bytes, Revert> {
        let checkpoint = self.checkpoint();
        let result = self.run_frame(frame, input);
        if result.is_err() {
            self.revert_to(checkpoint);
        }
        result
    }

    fn run_frame(&mut self, frame: Frame, input: &[u8]) -> Result<Bytes, Revert> {
        require(frame.depth <= MAX_CALL_DEPTH, "call depth exceeded")?;
        if frame.depth > 0 {
            self.charge(gas::CALL + gas::CALLDATA_BYTE * input.len() as u64)?;
        }

        if frame.kind == CallKind::Call && !frame.value.is_zero() {
            require(!frame.is_static, "state change during static call")?;
            if frame.depth > 0 {
                self.charge(gas::CALL_VALUE)?;
            }
            self.move_balance(frame.caller, frame.address, frame.value)?;
        }

        let Some(logic) = self.code(frame.code_address).map(|code| code.logic.clone()) else {
            return Ok(Bytes::new());
        };
        logic.call(&mut Env::new(self, frame), input)
    }

    /// Deploy `init_code` at a precomputed address; rolled back on failure.
    pub(crate) fn create_at(
        &mut self,
        deployer: Address,
        address: Address,
        init_code: &[u8],
        value: U256,
        depth: usize,
    ) -> Result<Address, Revert> {
        let checkpoint = self.checkpoint();
        let result = self.run_create(deployer, address, init_code, value, depth);
        if result.is_err() {
            self.revert_to(checkpoint);
        }
        result
    }

    fn run_create(
        &mut self,
        deployer: Address,
        address: Address,
        init_code: &[u8],
        value: U256,
        depth: usize,
    ) -> Result<Address, Revert> {
        require(depth <= MAX_CALL_DEPTH, "call depth exceeded")?;
        if depth > 0 {
            self.charge(gas::CREATE + gas::CALLDATA_BYTE * init_code.len() as u64)?;
        }

        let collision = self
            .accounts
            .get(&address)
            .is_some_and(|account| account.code.is_some() || account.nonce > 0);
        require(!collision, "contract address collision")?;

        let mut code = self.loader.load(init_code)?;
        code.hash = keccak256(init_code);
        if !value.is_zero() {
            self.move_balance(deployer, address, value)?;
        }

        self.install_code(address, code.clone());

        let frame = Frame {
            caller: deployer,
            address,
            code_address: address,
            value,
            kind: CallKind::Call,
            is_static: false,
            depth,
        };
        code.logic.construct(&mut Env::new(self, frame))?;
        Ok(address)
    }

    pub(crate) fn move_balance(&mut self, from: Address, to: Address, value: U256) -> Result<(), Revert> {
        let source = self.balance(from);
        require(source >= value, "insufficient balance for transfer")?;
        self.set_balance_logged(from, source - value);
        let target = self.balance(to);
        self.set_balance_logged(to, target + value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evm::contract::Contract;
    use crate::evm::revert::Revert;

    /// Counts calls; reverts when the calldata is `[0xff]`. `[0xfe]` also
    /// tallies the caller, deploys a child and then reverts.
    struct Counter;

    #[derive(Debug, Clone, Default)]
    struct Count(u64);

    impl Contract for Counter {
        fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
            let Count(current) = env.load::<Count>()?;
            env.store(Count(current + 1))?;
            if input == [0xff] {
                return Err(Revert::reason("boom"));
            }
            if input == [0xfe] {
                let caller = env.caller();
                env.update_entry(caller, |count: &mut Count| count.0 += 1)?;
                env.create(&[0u8], U256::ZERO)?;
                return Err(Revert::reason("late boom"));
            }
            Ok(Bytes::copy_from_slice(&(current + 1).to_be_bytes()))
        }
    }

    struct CounterLoader;

    impl CodeLoader for CounterLoader {
        fn load(&self, _init_code: &[u8]) -> Result<Code, Revert> {
            Ok(Code {
                name: "Counter",
                hash: Default::default(),
                logic: Arc::new(Counter),
            })
        }
    }

    fn chain() -> Chain {
        Chain::new(crate::evm::HARDHAT, Arc::new(CounterLoader))
    }

    #[test]
    fn create_uses_sender_nonce() {
        let mut chain = chain();
        let deployer = Address::repeat_byte(0xaa);
        let first = chain.deploy(deployer, vec![0u8]).unwrap();
        let second = chain.deploy(deployer, vec![0u8]).unwrap();

        assert_eq!(first, deployer.create(0));
        assert_eq!(second, deployer.create(1));
        assert!(chain.has_code(first));
        assert_eq!(chain.nonce(first), 1);
    }

    #[test]
    fn revert_rolls_back_storage() {
        let mut chain = chain();
        let sender = Address::repeat_byte(0xaa);
        let counter = chain.deploy(sender, vec![0u8]).unwrap();

        chain.transact(Tx::call(sender, counter, vec![0u8])).unwrap();
        let err = chain.transact(Tx::call(sender, counter, vec![0xffu8])).err().unwrap();

        assert_eq!(err.revert(), Some(&Revert::reason("boom")));
        assert_eq!(chain.storage::<Count>(counter, B256::ZERO).0, 1);
        assert_eq!(chain.nonce(sender), 3);
    }

    #[test]
    fn revert_undoes_every_write_in_the_frame() {
        let mut chain = chain();
        let sender = Address::repeat_byte(0xaa);
        chain.set_balance(sender, U256::from(1_000u64));
        let counter = chain.deploy(sender, vec![0u8]).unwrap();

        let err = chain
            .transact(Tx::call(sender, counter, vec![0xfeu8]).with_value(U256::from(7u64)))
            .err()
            .unwrap();

        assert_eq!(err.revert(), Some(&Revert::reason("late boom")));
        assert_eq!(chain.storage::<Count>(counter, B256::ZERO).0, 0);
        assert_eq!(chain.storage::<Count>(counter, sender.into_word()).0, 0);
        assert_eq!(chain.nonce(counter), 1);
        assert!(!chain.has_code(counter.create(1)));
        assert_eq!(chain.balance(counter), U256::ZERO);
        assert_eq!(chain.balance(sender), U256::from(1_000u64));
        assert_eq!(chain.nonce(sender), 2);
    }

    #[test]
    fn view_does_not_persist() {
        let mut chain = chain();
        let sender = Address::repeat_byte(0xaa);
        let counter = chain.deploy(sender, vec![0u8]).unwrap();

        // A static frame cannot write storage.
        assert!(chain.view(counter, &[0u8]).is_err());
        assert_eq!(chain.storage::<Count>(counter, B256::ZERO).0, 0);
    }

    #[test]
    fn fees_are_charged_for_gas_used() {
        let mut chain = chain();
        let sender = Address::repeat_byte(0xaa);
        let target = Address::repeat_byte(0xbb);
        chain.set_balance(sender, U256::from(1_000_000_000u64));

        let receipt = chain
            .transact(
                Tx::call(sender, target, Bytes::new())
                    .with_value(U256::from(5u64))
                    .with_gas_price(U256::from(2u64)),
            )
            .unwrap();

        assert_eq!(receipt.gas_used, gas::TX_BASE);
        assert_eq!(chain.balance(target), U256::from(5u64));
        assert_eq!(
            chain.balance(sender),
            U256::from(1_000_000_000u64 - 5 - 2 * gas::TX_BASE)
        );
    }

    #[test]
    fn insufficient_funds_is_rejected_before_execution() {
        let mut chain = chain();
        let sender = Address::repeat_byte(0xaa);
        let err = chain
            .transact(Tx::call(sender, Address::ZERO, Bytes::new()).with_gas_price(U256::from(1u64)))
            .err()
            .unwrap();

        assert!(matches!(err, ChainError::InsufficientFunds { .. }));
        assert_eq!(chain.nonce(sender), 0);
    }
}
