// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Plain ERC-20 token used for token-denominated relay refunds.

use alloy::primitives::{Address, Bytes, U256};

use crate::evm::abi::{self, IERC20};
use crate::evm::{require, Contract, Env, Revert};

#[derive(Debug, Clone, Copy, Default)]
struct TotalSupply(U256);

/// Keyed by holder.
#[derive(Debug, Clone, Copy, Default)]
struct Balance(U256);

/// Keyed by `(owner, spender)`.
#[derive(Debug, Clone, Copy, Default)]
struct Allowance(U256);

pub struct Erc20Token {
    name: String,
    symbol: String,
    initial_supply: U256,
}

impl Erc20Token {
    pub const DECIMALS: u8 = 18;

    pub fn new(name: String, symbol: String, initial_supply: U256) -> Self {
        Self {
            name,
            symbol,
            initial_supply,
        }
    }

    fn transfer(env: &mut Env<'_>, from: Address, to: Address, amount: U256) -> Result<(), Revert> {
        require(!from.is_zero(), "ERC20: transfer from the zero address")?;
        require(!to.is_zero(), "ERC20: transfer to the zero address")?;

        let Balance(from_balance) = env.load_entry::<Balance>(from)?;
        require(from_balance >= amount, "ERC20: transfer amount exceeds balance")?;
        env.store_entry(from, Balance(from_balance - amount))?;
        env.update_entry(to, |balance: &mut Balance| balance.0 += amount)?;

        env.emit(&IERC20::Transfer {
            from,
            to,
            value: amount,
        })
    }

    fn approve(env: &mut Env<'_>, owner: Address, spender: Address, amount: U256) -> Result<(), Revert> {
        require(!spender.is_zero(), "ERC20: approve to the zero address")?;
        env.store_entry((owner, spender), Allowance(amount))?;
        env.emit(&IERC20::Approval {
            owner,
            spender,
            value: amount,
        })
    }

    fn spend_allowance(env: &mut Env<'_>, owner: Address, spender: Address, amount: U256) -> Result<(), Revert> {
        let Allowance(allowance) = env.load_entry::<Allowance>((owner, spender))?;
        if allowance == U256::MAX {
            return Ok(());
        }
        require(allowance >= amount, "ERC20: insufficient allowance")?;
        env.store_entry((owner, spender), Allowance(allowance - amount))
    }
}

impl Contract for Erc20Token {
    fn construct(&self, env: &mut Env<'_>) -> Result<(), Revert> {
        let deployer = env.caller();
        let supply = self.initial_supply;
        env.store(TotalSupply(supply))?;
        env.store_entry(deployer, Balance(supply))?;
        env.emit(&IERC20::Transfer {
            from: Address::ZERO,
            to: deployer,
            value: supply,
        })
    }

    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use IERC20::IERC20Calls as Calls;

        let output = match abi::decode_call::<Calls>(input)? {
            Calls::name(_) => abi::encode_return::<IERC20::nameCall>(&self.name),
            Calls::symbol(_) => abi::encode_return::<IERC20::symbolCall>(&self.symbol),
            Calls::decimals(_) => abi::encode_return::<IERC20::decimalsCall>(&Self::DECIMALS),
            Calls::totalSupply(_) => {
                let TotalSupply(supply) = env.load::<TotalSupply>()?;
                abi::encode_return::<IERC20::totalSupplyCall>(&supply)
            }
            Calls::balanceOf(call) => {
                let Balance(balance) = env.load_entry::<Balance>(call.account)?;
                abi::encode_return::<IERC20::balanceOfCall>(&balance)
            }
            Calls::allowance(call) => {
                let Allowance(allowance) =
                    env.load_entry::<Allowance>((call.owner, call.spender))?;
                abi::encode_return::<IERC20::allowanceCall>(&allowance)
            }
            Calls::transfer(call) => {
                let from = env.caller();
                Self::transfer(env, from, call.to, call.amount)?;
                abi::encode_return::<IERC20::transferCall>(&true)
            }
            Calls::approve(call) => {
                let owner = env.caller();
                Self::approve(env, owner, call.spender, call.amount)?;
                abi::encode_return::<IERC20::approveCall>(&true)
            }
            Calls::transferFrom(call) => {
                let spender = env.caller();
                Self::spend_allowance(env, call.from, spender, call.amount)?;
                Self::transfer(env, call.from, call.to, call.amount)?;
                abi::encode_return::<IERC20::transferFromCall>(&true)
            }
        };
        Ok(output)
    }
}
