// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Meta-transaction relayer modules.
//!
//! An identity op is signed off-chain over [`identity_op_hash`] and
//! submitted by anyone through `execute`. The module then:
//!
//! 1. verifies the signatures against the current nonce (revert on failure),
//! 2. bumps the nonce before any external call,
//! 3. self-calls `data`, capturing success or the revert payload,
//! 4. emits `Executed`, and
//! 5. refunds the submitter from the identity when `gasPrice > 0`.
//!
//! Variants differ in their revert prefix, their refund policy and, for the
//! core aggregate, in requiring co-signatures ordered by address.

use alloy::primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};

use super::base::ModuleBase;
use crate::evm::abi::{self, ICosignerRegistry, IERC20, IIdentity, IRelayerModule};
use crate::evm::{ecdsa, gas, Contract, Env, Revert};

/// Gas-refund parameters signed as part of an identity op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GasParams {
    pub price: U256,
    pub limit: U256,
    /// `Address::ZERO` refunds in the native asset.
    pub token: Address,
    /// `Address::ZERO` refunds `tx.origin`.
    pub refund_to: Address,
}

/// Canonical identity op hash:
/// `keccak256(0x19 ++ 0x00 ++ chainId ++ module ++ identity ++ nonce ++ data ++ price ++ limit ++ token ++ refundTo)`
/// with Solidity packed encoding.
pub fn identity_op_hash(
    chain_id: u64,
    module: Address,
    identity: Address,
    nonce: U256,
    data: &[u8],
    gas: &GasParams,
) -> B256 {
    let packed = (
        FixedBytes::<1>([0x19]),
        FixedBytes::<1>([0x00]),
        U256::from(chain_id),
        module,
        identity,
        nonce,
        Bytes::copy_from_slice(data),
        gas.price,
        gas.limit,
        gas.token,
        gas.refund_to,
    )
        .abi_encode_packed();
    keccak256(packed)
}

/// How much of the relay cost the identity pays back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundPolicy {
    /// `min(gasUsed + min_gas + refund_gas, limit) * min(tx.gasprice, price)`
    Metered { min_gas: u64, refund_gas: u64 },
    /// `limit * price`; the signed limit already accounts for L1 costs.
    Flat,
}

impl RefundPolicy {
    pub fn amount(&self, gas_used: u64, gas: &GasParams, tx_gas_price: U256) -> U256 {
        match *self {
            Self::Metered {
                min_gas,
                refund_gas,
            } => {
                let metered = U256::from(gas_used.saturating_add(min_gas).saturating_add(refund_gas));
                metered.min(gas.limit).saturating_mul(tx_gas_price.min(gas.price))
            }
            Self::Flat => gas.limit.saturating_mul(gas.price),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayerVariant {
    Standard,
    Arbitrum,
    CoreAggregate,
}

impl RelayerVariant {
    fn prefix(self) -> &'static str {
        match self {
            Self::Standard => "RM",
            Self::Arbitrum => "ARM",
            Self::CoreAggregate => "CRM",
        }
    }

    fn base_prefix(self) -> &'static str {
        match self {
            Self::CoreAggregate => "CBM",
            _ => "BM",
        }
    }
}

/// Next op nonce of an identity.
#[derive(Debug, Clone, Copy, Default)]
struct Nonce(U256);

/// Co-signers an identity registered with the core aggregate.
#[derive(Debug, Clone, Default)]
struct Cosigners(Vec<Address>);

pub struct RelayerModule {
    variant: RelayerVariant,
    refund: RefundPolicy,
    base: ModuleBase,
}

impl RelayerModule {
    pub fn standard(lock_manager: Address, min_gas: u64, refund_gas: u64) -> Self {
        Self::new(
            RelayerVariant::Standard,
            RefundPolicy::Metered {
                min_gas,
                refund_gas,
            },
            lock_manager,
        )
    }

    pub fn arbitrum(lock_manager: Address) -> Self {
        Self::new(RelayerVariant::Arbitrum, RefundPolicy::Flat, lock_manager)
    }

    pub fn core_aggregate(lock_manager: Address, min_gas: u64, refund_gas: u64) -> Self {
        Self::new(
            RelayerVariant::CoreAggregate,
            RefundPolicy::Metered {
                min_gas,
                refund_gas,
            },
            lock_manager,
        )
    }

    fn new(variant: RelayerVariant, refund: RefundPolicy, lock_manager: Address) -> Self {
        Self {
            variant,
            refund,
            base: ModuleBase::new(lock_manager, variant.base_prefix()),
        }
    }

    fn check(&self, condition: bool, message: &str) -> Result<(), Revert> {
        if condition {
            Ok(())
        } else {
            Err(Revert::Reason(format!("{}: {message}", self.variant.prefix())))
        }
    }

    fn nonce(env: &mut Env<'_>, identity: Address) -> Result<U256, Revert> {
        Ok(env.load_entry::<Nonce>(identity)?.0)
    }

    fn cosigners(env: &mut Env<'_>, identity: Address) -> Result<Vec<Address>, Revert> {
        Ok(env.load_entry::<Cosigners>(identity)?.0)
    }

    fn op_hash(
        env: &mut Env<'_>,
        identity: Address,
        data: &[u8],
        gas: &GasParams,
    ) -> Result<B256, Revert> {
        let nonce = Self::nonce(env, identity)?;
        env.charge_gas(gas::keccak(data.len() + 250))?;
        Ok(identity_op_hash(
            env.chain_id(),
            env.address(),
            identity,
            nonce,
            data,
            gas,
        ))
    }

    /// Owner signature first; the core aggregate then expects one signature
    /// per registered co-signer, in ascending address order.
    fn verify_signatures(
        &self,
        env: &mut Env<'_>,
        identity: Address,
        hash: B256,
        signatures: &[u8],
    ) -> Result<(), Revert> {
        let digest = ecdsa::to_eth_signed_message_hash(hash);
        let owner = env.view(identity, &IIdentity::ownerCall {})?;

        match self.variant {
            RelayerVariant::Standard | RelayerVariant::Arbitrum => {
                env.charge_gas(gas::ECRECOVER)?;
                let signer = ecdsa::recover(digest, signatures)?;
                self.check(signer == owner, "invalid signer")
            }
            RelayerVariant::CoreAggregate => {
                let count = ecdsa::signature_count(signatures)?;
                let cosigners = Self::cosigners(env, identity)?;
                self.check(count == cosigners.len() + 1, "invalid signature count")?;
                env.charge_gas(gas::ECRECOVER * count as u64)?;

                let expected = std::iter::once(owner).chain(cosigners);
                for (index, expected) in expected.enumerate() {
                    let signer = ecdsa::recover_at(digest, signatures, index)?;
                    self.check(signer == expected, "invalid signer")?;
                }
                Ok(())
            }
        }
    }

    fn execute(&self, env: &mut Env<'_>, call: IRelayerModule::executeCall) -> Result<(), Revert> {
        let start_gas = env.gas_left();
        let identity = call.identity;
        let gas = GasParams {
            price: call.gasPrice,
            limit: call.gasLimit,
            token: call.refundToken,
            refund_to: call.refundTo,
        };

        let nonce = Self::nonce(env, identity)?;
        let hash = Self::op_hash(env, identity, &call.data, &gas)?;
        self.verify_signatures(env, identity, hash, &call.signatures)?;

        env.store_entry(identity, Nonce(nonce + U256::from(1u8)))?;

        let this = env.address();
        let (success, result) = match env.call(this, U256::ZERO, &call.data) {
            Ok(output) => (true, output),
            Err(revert) => {
                tracing::debug!(%identity, reason = %revert, "Relayed call failed");
                (false, revert.encode())
            }
        };
        env.emit(&IRelayerModule::Executed {
            identity,
            success,
            result,
            txHash: hash,
        })?;
        tracing::info!(%identity, %nonce, success, op_hash = %hash, "Identity op executed");

        if !gas.price.is_zero() {
            let gas_used = start_gas.saturating_sub(env.gas_left());
            let amount = self.refund.amount(gas_used, &gas, env.tx_gas_price());
            self.pay_refund(env, identity, &gas, amount)?;
        }
        Ok(())
    }

    fn pay_refund(
        &self,
        env: &mut Env<'_>,
        identity: Address,
        gas: &GasParams,
        amount: U256,
    ) -> Result<(), Revert> {
        let receiver = if gas.refund_to.is_zero() {
            env.origin()
        } else {
            gas.refund_to
        };

        if gas.token.is_zero() {
            env.call_contract(
                identity,
                U256::ZERO,
                &IIdentity::executeCall {
                    to: receiver,
                    value: amount,
                    data: Bytes::new(),
                },
            )?;
        } else {
            let transfer = IERC20::transferCall {
                to: receiver,
                amount,
            };
            let output = env.call_contract(
                identity,
                U256::ZERO,
                &IIdentity::executeCall {
                    to: gas.token,
                    value: U256::ZERO,
                    data: transfer.abi_encode().into(),
                },
            )?;
            // Tokens that return nothing are treated as successful.
            let transferred =
                output.is_empty() || IERC20::transferCall::abi_decode_returns(&output).unwrap_or(false);
            self.check(transferred, "refund transfer failed")?;
        }

        env.emit(&IRelayerModule::Refunded {
            identity,
            receiver,
            token: gas.token,
            amount,
        })?;
        tracing::info!(%identity, %receiver, token = %gas.token, %amount, "Relay refunded");
        Ok(())
    }

    fn set_cosigners(&self, env: &mut Env<'_>, cosigners: Vec<Address>) -> Result<(), Revert> {
        let sorted = cosigners.windows(2).all(|pair| pair[0] < pair[1]);
        self.check(
            sorted && !cosigners.contains(&Address::ZERO),
            "cosigners must be sorted and unique",
        )?;
        let identity = env.caller();
        env.store_entry(identity, Cosigners(cosigners.clone()))?;
        env.emit(&ICosignerRegistry::CosignersUpdated {
            identity,
            cosigners,
        })
    }
}

impl Contract for RelayerModule {
    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use IRelayerModule::IRelayerModuleCalls as Calls;

        if self.variant == RelayerVariant::CoreAggregate
            && abi::handles::<ICosignerRegistry::ICosignerRegistryCalls>(input)
        {
            return match abi::decode_call::<ICosignerRegistry::ICosignerRegistryCalls>(input)? {
                ICosignerRegistry::ICosignerRegistryCalls::setCosigners(call) => {
                    self.set_cosigners(env, call.cosigners)?;
                    Ok(Bytes::new())
                }
                ICosignerRegistry::ICosignerRegistryCalls::getCosigners(call) => {
                    let cosigners = Self::cosigners(env, call.identity)?;
                    Ok(abi::encode_return::<ICosignerRegistry::getCosignersCall>(
                        &cosigners,
                    ))
                }
            };
        }

        match abi::decode_call::<Calls>(input)? {
            Calls::ping(_) => Ok(Bytes::new()),
            Calls::lockManager(_) => Ok(abi::encode_return::<IRelayerModule::lockManagerCall>(
                &self.base.lock_manager,
            )),
            Calls::getNonce(call) => {
                let nonce = Self::nonce(env, call.identity)?;
                Ok(abi::encode_return::<IRelayerModule::getNonceCall>(&nonce))
            }
            Calls::getIdentityOpHash(call) => {
                let gas = GasParams {
                    price: call.gasPrice,
                    limit: call.gasLimit,
                    token: call.refundToken,
                    refund_to: call.refundTo,
                };
                let hash = Self::op_hash(env, call.identity, &call.data, &gas)?;
                Ok(abi::encode_return::<IRelayerModule::getIdentityOpHashCall>(&hash))
            }
            Calls::execute(call) => {
                self.execute(env, call)?;
                Ok(abi::encode_return::<IRelayerModule::executeCall>(&true))
            }
            Calls::executeThroughIdentity(call) => {
                let output = self.base.execute_through_identity(
                    env,
                    call.identity,
                    call.to,
                    call.value,
                    call.data,
                )?;
                Ok(abi::encode_return::<IRelayerModule::executeThroughIdentityCall>(
                    &output,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::SignerSync;

    use crate::contracts::testing::{
        ether, signer, Fixture, System, MIN_GAS, OTHER_KEY, OWNER_KEY, REFUND_GAS,
    };
    use crate::contracts::Artifact;
    use crate::evm::abi::{ILockManager, IModuleManager};
    use crate::evm::{ChainResult, Receipt, Tx};

    const GWEI: u64 = 1_000_000_000;

    struct Setup {
        fx: Fixture,
        system: System,
        identity: Address,
    }

    fn setup() -> Setup {
        let mut fx = Fixture::new();
        let system = fx.system();
        let identity = fx.identity(&system, fx.owner, &[system.relayer, system.module_a]);
        fx.chain
            .transact(Tx::call(fx.owner, identity, Bytes::new()).with_value(ether(10)))
            .unwrap();
        Setup {
            fx,
            system,
            identity,
        }
    }

    fn ping() -> Bytes {
        IRelayerModule::pingCall {}.abi_encode().into()
    }

    fn through_identity(identity: Address, to: Address, value: U256) -> Bytes {
        IRelayerModule::executeThroughIdentityCall {
            identity,
            to,
            value,
            data: Bytes::new(),
        }
        .abi_encode()
        .into()
    }

    impl Setup {
        fn nonce(&self, module: Address) -> U256 {
            self.fx
                .chain
                .call(
                    module,
                    &IRelayerModule::getNonceCall {
                        identity: self.identity,
                    },
                )
                .unwrap()
        }

        /// Signed `execute` call; `keys` sign in the given order.
        fn op(
            &self,
            module: Address,
            data: Bytes,
            gas: GasParams,
            keys: &[&str],
        ) -> (IRelayerModule::executeCall, B256) {
            let hash = identity_op_hash(
                self.fx.chain.chain_id(),
                module,
                self.identity,
                self.nonce(module),
                &data,
                &gas,
            );
            let signatures: Vec<u8> = keys
                .iter()
                .flat_map(|key| {
                    signer(key)
                        .sign_message_sync(hash.as_slice())
                        .unwrap()
                        .as_bytes()
                })
                .collect();
            let call = IRelayerModule::executeCall {
                identity: self.identity,
                data,
                gasPrice: gas.price,
                gasLimit: gas.limit,
                refundToken: gas.token,
                refundTo: gas.refund_to,
                signatures: signatures.into(),
            };
            (call, hash)
        }

        /// Relay from `other`, paying `tx_gas_price` per unit of gas.
        fn submit(
            &mut self,
            module: Address,
            call: &IRelayerModule::executeCall,
            tx_gas_price: u64,
        ) -> ChainResult<Receipt> {
            let tx = Tx::call(self.fx.other, module, call.abi_encode())
                .with_gas_price(U256::from(tx_gas_price));
            self.fx.chain.transact(tx)
        }

        /// `module_a` acting through `Identity.execute`.
        fn identity_execute(&mut self, to: Address, data: Vec<u8>) -> ChainResult<Receipt> {
            let call = IIdentity::executeCall {
                to,
                value: U256::ZERO,
                data: data.into(),
            };
            let (module_a, identity) = (self.system.module_a, self.identity);
            self.fx
                .chain
                .send(module_a, identity, &call)
                .map(|(_, receipt)| receipt)
        }

        /// Deploy, register and enable another relayer module.
        fn install(&mut self, init_code: Bytes) -> Address {
            let module = self.fx.deploy(init_code);
            self.fx.register(self.system.registry, module);
            let manager = self
                .fx
                .chain
                .call(self.identity, &IIdentity::moduleManagerCall {})
                .unwrap();
            self.identity_execute(manager, IModuleManager::enableModuleCall { module }.abi_encode())
                .unwrap();
            module
        }
    }

    #[test]
    fn op_hash_matches_contract_view() {
        let s = setup();
        let gas = GasParams {
            price: U256::from(3u8),
            limit: U256::from(90_000u64),
            token: Address::repeat_byte(0x11),
            refund_to: Address::repeat_byte(0x22),
        };
        let on_chain = s
            .fx
            .chain
            .call(
                s.system.relayer,
                &IRelayerModule::getIdentityOpHashCall {
                    identity: s.identity,
                    data: ping(),
                    gasPrice: gas.price,
                    gasLimit: gas.limit,
                    refundToken: gas.token,
                    refundTo: gas.refund_to,
                },
            )
            .unwrap();
        let (_, expected) = s.op(s.system.relayer, ping(), gas, &[]);
        assert_eq!(on_chain, expected);
    }

    #[test]
    fn unpaid_op_bumps_nonce_and_reports_success() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let (call, hash) = s.op(relayer, ping(), GasParams::default(), &[OWNER_KEY]);

        let receipt = s.submit(relayer, &call, 0).unwrap();
        assert_eq!(s.nonce(relayer), U256::from(1u8));

        let executed = &receipt.events::<IRelayerModule::Executed>()[0];
        assert_eq!(executed.identity, s.identity);
        assert!(executed.success);
        assert!(executed.result.is_empty());
        assert_eq!(executed.txHash, hash);
        assert!(receipt.events::<IRelayerModule::Refunded>().is_empty());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let (call, _) = s.op(relayer, ping(), GasParams::default(), &[OTHER_KEY]);

        let err = s.submit(relayer, &call, 0).err().unwrap();
        assert_eq!(s.fx.reason(err), "RM: invalid signer");
        assert_eq!(s.nonce(relayer), U256::ZERO);
    }

    #[test]
    fn replayed_op_is_rejected() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let (call, _) = s.op(relayer, ping(), GasParams::default(), &[OWNER_KEY]);

        s.submit(relayer, &call, 0).unwrap();
        let err = s.submit(relayer, &call, 0).err().unwrap();
        assert_eq!(s.fx.reason(err), "RM: invalid signer");
        assert_eq!(s.nonce(relayer), U256::from(1u8));
    }

    #[test]
    fn failed_inner_call_is_captured() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let data = through_identity(s.identity, Address::ZERO, U256::ZERO);
        let (call, _) = s.op(relayer, data, GasParams::default(), &[OWNER_KEY]);

        let receipt = s.submit(relayer, &call, 0).unwrap();
        let executed = &receipt.events::<IRelayerModule::Executed>()[0];
        assert!(!executed.success);
        assert_eq!(&executed.result[..4], &[0x08, 0xc3, 0x79, 0xa0]);
        assert_eq!(
            Revert::decode(&executed.result).message(),
            "I: execution target must not be the zero address"
        );
        assert_eq!(s.nonce(relayer), U256::from(1u8));
    }

    #[test]
    fn relayed_transfer_moves_identity_funds() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let receiver = Address::repeat_byte(0x77);
        let data = through_identity(s.identity, receiver, ether(1));
        let (call, _) = s.op(relayer, data, GasParams::default(), &[OWNER_KEY]);

        let receipt = s.submit(relayer, &call, 0).unwrap();
        assert!(receipt.events::<IRelayerModule::Executed>()[0].success);
        assert_eq!(s.fx.chain.balance(receiver), ether(1));
        assert_eq!(s.fx.chain.balance(s.identity), ether(9));
    }

    #[test]
    fn execute_through_identity_is_self_only() {
        let mut s = setup();
        let call = IRelayerModule::executeThroughIdentityCall {
            identity: s.identity,
            to: s.fx.other,
            value: U256::ZERO,
            data: Bytes::new(),
        };
        let err = s
            .fx
            .chain
            .send(s.fx.owner, s.system.relayer, &call)
            .err()
            .unwrap();
        assert_eq!(s.fx.reason(err), "BM: caller must be myself");
    }

    #[test]
    fn locked_identity_cannot_be_driven() {
        let mut s = setup();
        let relayer = s.system.relayer;
        s.fx.chain
            .send(
                s.system.module_a,
                s.system.lock_manager,
                &ILockManager::lockIdentityCall {
                    identity: s.identity,
                },
            )
            .unwrap();

        let data = through_identity(s.identity, s.fx.other, ether(1));
        let (call, _) = s.op(relayer, data, GasParams::default(), &[OWNER_KEY]);
        let receipt = s.submit(relayer, &call, 0).unwrap();
        let executed = &receipt.events::<IRelayerModule::Executed>()[0];
        assert!(!executed.success);
        assert_eq!(
            Revert::decode(&executed.result).message(),
            "BM: identity must be unlocked"
        );
    }

    #[test]
    fn metered_refund_is_bounded_by_signed_limit() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let gas = GasParams {
            price: U256::from(2 * GWEI),
            limit: U256::from(1_000_000u64),
            ..Default::default()
        };
        let (call, _) = s.op(relayer, ping(), gas, &[OWNER_KEY]);
        let identity_before = s.fx.chain.balance(s.identity);

        let receipt = s.submit(relayer, &call, GWEI).unwrap();
        let refund = &receipt.events::<IRelayerModule::Refunded>()[0];
        assert_eq!(refund.receiver, s.fx.other);
        assert!(refund.token.is_zero());
        // Billed at min(tx.gasprice, gasPrice) and never above the limit.
        assert!(refund.amount >= U256::from((MIN_GAS + REFUND_GAS) * GWEI));
        assert!(refund.amount < gas.limit * U256::from(GWEI));
        assert_eq!(s.fx.chain.balance(s.identity), identity_before - refund.amount);

        let capped = GasParams {
            limit: U256::from(50_000u64),
            ..gas
        };
        let (call, _) = s.op(relayer, ping(), capped, &[OWNER_KEY]);
        let receipt = s.submit(relayer, &call, GWEI).unwrap();
        assert_eq!(
            receipt.events::<IRelayerModule::Refunded>()[0].amount,
            U256::from(50_000 * GWEI)
        );
    }

    #[test]
    fn refund_goes_to_explicit_receiver() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let receiver = Address::repeat_byte(0x99);
        let gas = GasParams {
            price: U256::from(GWEI),
            limit: U256::from(60_000u64),
            refund_to: receiver,
            ..Default::default()
        };
        let (call, _) = s.op(relayer, ping(), gas, &[OWNER_KEY]);
        let receipt = s.submit(relayer, &call, GWEI).unwrap();
        let refund = &receipt.events::<IRelayerModule::Refunded>()[0];
        assert_eq!(refund.receiver, receiver);
        assert_eq!(s.fx.chain.balance(receiver), refund.amount);
    }

    #[test]
    fn token_refund_uses_erc20_transfer() {
        let mut s = setup();
        let relayer = s.system.relayer;
        let token = s.fx.deploy(Artifact::Erc20Token.init_code(&(
            "Fee Token".to_string(),
            "FEE".to_string(),
            ether(1_000),
        )));
        let (owner, identity) = (s.fx.owner, s.identity);
        s.fx.chain
            .send(
                owner,
                token,
                &IERC20::transferCall {
                    to: identity,
                    amount: ether(100),
                },
            )
            .unwrap();

        let gas = GasParams {
            price: U256::from(1u8),
            limit: U256::from(70_000u64),
            token,
            ..Default::default()
        };
        let (call, _) = s.op(relayer, ping(), gas, &[OWNER_KEY]);
        let receipt = s.submit(relayer, &call, GWEI).unwrap();

        let refund = &receipt.events::<IRelayerModule::Refunded>()[0];
        assert_eq!(refund.token, token);
        assert!(!refund.amount.is_zero());
        let relayer_tokens = s
            .fx
            .chain
            .call(token, &IERC20::balanceOfCall { account: s.fx.other })
            .unwrap();
        assert_eq!(relayer_tokens, refund.amount);
    }

    #[test]
    fn arbitrum_refund_is_flat() {
        let mut s = setup();
        let lock_manager = s.system.lock_manager;
        let arb = s.install(Artifact::ArbRelayerModule.init_code(&(lock_manager,)));
        let gas = GasParams {
            price: U256::from(2 * GWEI),
            limit: U256::from(50_000u64),
            ..Default::default()
        };
        let (call, _) = s.op(arb, ping(), gas, &[OWNER_KEY]);

        let receipt = s.submit(arb, &call, GWEI).unwrap();
        assert_eq!(
            receipt.events::<IRelayerModule::Refunded>()[0].amount,
            U256::from(100_000 * GWEI)
        );

        let (call, _) = s.op(arb, ping(), GasParams::default(), &[OTHER_KEY]);
        let err = s.submit(arb, &call, 0).err().unwrap();
        assert_eq!(s.fx.reason(err), "ARM: invalid signer");
    }

    #[test]
    fn core_aggregate_requires_ordered_cosigners() {
        let mut s = setup();
        let lock_manager = s.system.lock_manager;
        let core = s.install(Artifact::CoreModuleAggregate.init_code(&(
            lock_manager,
            U256::from(MIN_GAS),
            U256::from(REFUND_GAS),
        )));

        let unsorted = ICosignerRegistry::setCosignersCall {
            cosigners: vec![Address::repeat_byte(2), Address::repeat_byte(1)],
        };
        let err = s.identity_execute(core, unsorted.abi_encode()).err().unwrap();
        assert_eq!(s.fx.reason(err), "CRM: cosigners must be sorted and unique");

        let cosigner = s.fx.other;
        let receipt = s
            .identity_execute(
                core,
                ICosignerRegistry::setCosignersCall {
                    cosigners: vec![cosigner],
                }
                .abi_encode(),
            )
            .unwrap();
        assert_eq!(
            receipt.events::<ICosignerRegistry::CosignersUpdated>()[0].identity,
            s.identity
        );

        let (call, _) = s.op(core, ping(), GasParams::default(), &[OWNER_KEY]);
        let err = s.submit(core, &call, 0).err().unwrap();
        assert_eq!(s.fx.reason(err), "CRM: invalid signature count");

        let (call, _) = s.op(core, ping(), GasParams::default(), &[OTHER_KEY, OWNER_KEY]);
        let err = s.submit(core, &call, 0).err().unwrap();
        assert_eq!(s.fx.reason(err), "CRM: invalid signer");

        let (call, _) = s.op(core, ping(), GasParams::default(), &[OWNER_KEY, OTHER_KEY]);
        let receipt = s.submit(core, &call, 0).unwrap();
        assert!(receipt.events::<IRelayerModule::Executed>()[0].success);
    }

    #[test]
    fn refund_policy_amounts() {
        let gas = GasParams {
            price: U256::from(10u8),
            limit: U256::from(100_000u64),
            ..Default::default()
        };
        let metered = RefundPolicy::Metered {
            min_gas: 21_000,
            refund_gas: 22_000,
        };
        assert_eq!(
            metered.amount(7_000, &gas, U256::from(4u8)),
            U256::from(50_000u64 * 4)
        );
        assert_eq!(
            metered.amount(90_000, &gas, U256::from(40u8)),
            U256::from(100_000u64 * 10)
        );
        assert_eq!(
            RefundPolicy::Flat.amount(1, &gas, U256::from(1u8)),
            U256::from(1_000_000u64)
        );
    }
}
