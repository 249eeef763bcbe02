// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity platform contracts.
//!
//! Each contract is a Rust type implementing [`Contract`]. Deployable code is
//! identified by an [`Artifact`]: init code is the artifact's 32-byte tag
//! followed by its ABI-encoded constructor arguments, so CREATE2 addresses
//! depend on both, exactly like bytecode ++ args does on Ethereum.

pub mod erc20;
pub mod factory;
pub mod identity;
pub mod identity_proxy_factory;
pub mod lock_manager;
pub mod module_manager;
pub mod module_registry;
pub mod modules;
pub mod ownable;
pub mod proxy;

use std::sync::Arc;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::{abi::TokenSeq, SolType, SolValue};

use crate::evm::{math, Code, CodeLoader, Contract, Revert};

use self::erc20::Erc20Token;
use self::factory::Factory;
use self::identity::Identity;
use self::identity_proxy_factory::IdentityProxyFactory;
use self::lock_manager::LockManager;
use self::module_manager::ModuleManager;
use self::module_registry::ModuleRegistry;
use self::modules::{DelegateModule, RelayerModule};
use self::proxy::Proxy;

const TAG_LENGTH: usize = 32;

/// Deployable contract types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Factory,
    IdentityProxyFactory,
    Proxy,
    ModuleRegistry,
    ModuleManager,
    LockManager,
    Identity,
    RelayerModule,
    ArbRelayerModule,
    CoreModuleAggregate,
    DelegateModule,
    Erc20Token,
}

impl Artifact {
    pub const ALL: [Artifact; 12] = [
        Artifact::Factory,
        Artifact::IdentityProxyFactory,
        Artifact::Proxy,
        Artifact::ModuleRegistry,
        Artifact::ModuleManager,
        Artifact::LockManager,
        Artifact::Identity,
        Artifact::RelayerModule,
        Artifact::ArbRelayerModule,
        Artifact::CoreModuleAggregate,
        Artifact::DelegateModule,
        Artifact::Erc20Token,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Artifact::Factory => "Factory",
            Artifact::IdentityProxyFactory => "IdentityProxyFactory",
            Artifact::Proxy => "Proxy",
            Artifact::ModuleRegistry => "ModuleRegistry",
            Artifact::ModuleManager => "ModuleManager",
            Artifact::LockManager => "LockManager",
            Artifact::Identity => "Identity",
            Artifact::RelayerModule => "RelayerModule",
            Artifact::ArbRelayerModule => "ArbRelayerModule",
            Artifact::CoreModuleAggregate => "CoreModuleAggregate",
            Artifact::DelegateModule => "DelegateModule",
            Artifact::Erc20Token => "Erc20Token",
        }
    }

    /// Stand-in for the artifact's creation bytecode.
    pub fn tag(self) -> B256 {
        keccak256(format!("unwallet-identity/{}", self.name()))
    }

    pub fn from_tag(tag: &[u8]) -> Option<Artifact> {
        Self::ALL.into_iter().find(|artifact| artifact.tag().as_slice() == tag)
    }

    /// Init code with ABI-encoded constructor arguments, e.g.
    /// `Artifact::Proxy.init_code(&(implementation,))`.
    pub fn init_code<A>(self, args: &A) -> Bytes
    where
        A: SolValue,
        for<'t> <A::SolType as SolType>::Token<'t>: TokenSeq<'t>,
    {
        let mut code = self.tag().to_vec();
        code.extend(args.abi_encode_params());
        code.into()
    }

    /// Init code for artifacts without constructor arguments.
    pub fn bare_init_code(self) -> Bytes {
        Bytes::copy_from_slice(self.tag().as_slice())
    }

    fn instantiate(self, args: &[u8]) -> Result<Arc<dyn Contract>, Revert> {
        let bad_args = |_: alloy::sol_types::Error| {
            Revert::reason(format!("{}: invalid constructor arguments", self.name()))
        };

        let logic: Arc<dyn Contract> = match self {
            Artifact::Factory => Arc::new(Factory),
            Artifact::IdentityProxyFactory => Arc::new(IdentityProxyFactory),
            Artifact::ModuleRegistry => Arc::new(ModuleRegistry),
            Artifact::Identity => Arc::new(Identity),
            Artifact::DelegateModule => Arc::new(DelegateModule),
            Artifact::Proxy => {
                let (implementation,) = <(Address,)>::abi_decode_params(args).map_err(bad_args)?;
                Arc::new(Proxy::new(implementation))
            }
            Artifact::ModuleManager => {
                let (registry,) = <(Address,)>::abi_decode_params(args).map_err(bad_args)?;
                Arc::new(ModuleManager::new(registry))
            }
            Artifact::LockManager => {
                let (lock_period,) = <(U256,)>::abi_decode_params(args).map_err(bad_args)?;
                Arc::new(LockManager::new(math::to_u64(lock_period)?))
            }
            Artifact::RelayerModule | Artifact::CoreModuleAggregate => {
                let (lock_manager, min_gas, refund_gas) =
                    <(Address, U256, U256)>::abi_decode_params(args).map_err(bad_args)?;
                let (min_gas, refund_gas) = (math::to_u64(min_gas)?, math::to_u64(refund_gas)?);
                if self == Artifact::RelayerModule {
                    Arc::new(RelayerModule::standard(lock_manager, min_gas, refund_gas))
                } else {
                    Arc::new(RelayerModule::core_aggregate(lock_manager, min_gas, refund_gas))
                }
            }
            Artifact::ArbRelayerModule => {
                let (lock_manager,) = <(Address,)>::abi_decode_params(args).map_err(bad_args)?;
                Arc::new(RelayerModule::arbitrum(lock_manager))
            }
            Artifact::Erc20Token => {
                let (name, symbol, supply) =
                    <(String, String, U256)>::abi_decode_params(args).map_err(bad_args)?;
                Arc::new(Erc20Token::new(name, symbol, supply))
            }
        };
        Ok(logic)
    }
}

/// [`CodeLoader`] for every [`Artifact`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Artifacts;

impl CodeLoader for Artifacts {
    fn load(&self, init_code: &[u8]) -> Result<Code, Revert> {
        let artifact = init_code
            .get(..TAG_LENGTH)
            .and_then(Artifact::from_tag)
            .ok_or_else(|| Revert::reason("unknown contract artifact"))?;
        let logic = artifact.instantiate(&init_code[TAG_LENGTH..])?;
        Ok(Code {
            name: artifact.name(),
            hash: keccak256(init_code),
            logic,
        })
    }
}

#[cfg(test)]
pub mod testing {
    //! Shared fixture for contract tests.

    use std::sync::Arc;

    use alloy::primitives::{Address, Bytes, B256, U256};
    use alloy::signers::local::PrivateKeySigner;
    use alloy::sol_types::SolCall;

    use super::{Artifact, Artifacts};
    use crate::evm::abi::{self, IIdentity, IIdentityProxyFactory, IModuleRegistry};
    use crate::evm::{Chain, ChainError, HARDHAT};

    pub const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    pub const OTHER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    pub const LOCK_PERIOD: u64 = 604_800;
    pub const MIN_GAS: u64 = 21_000;
    pub const REFUND_GAS: u64 = 22_000;

    pub fn signer(key: &str) -> PrivateKeySigner {
        key.parse().unwrap()
    }

    pub fn ether(amount: u64) -> U256 {
        U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
    }

    /// Core contracts deployed by [`Fixture::system`].
    #[derive(Debug, Clone, Copy)]
    pub struct System {
        pub factory: Address,
        pub registry: Address,
        pub module_manager: Address,
        pub lock_manager: Address,
        pub identity: Address,
        pub identity_proxy_factory: Address,
        pub relayer: Address,
        pub delegate: Address,
        /// Registered modules with no behaviour of their own; tests send
        /// transactions from them.
        pub module_a: Address,
        pub module_b: Address,
    }

    pub struct Fixture {
        pub chain: Chain,
        pub owner: Address,
        pub other: Address,
        next_salt: u64,
    }

    impl Fixture {
        pub fn new() -> Self {
            let mut chain = Chain::new(HARDHAT, Arc::new(Artifacts));
            let owner = signer(OWNER_KEY).address();
            let other = signer(OTHER_KEY).address();
            chain.set_balance(owner, ether(10_000));
            chain.set_balance(other, ether(10_000));
            Self {
                chain,
                owner,
                other,
                next_salt: 0,
            }
        }

        pub fn deploy(&mut self, init_code: Bytes) -> Address {
            self.chain.deploy(self.owner, init_code).unwrap()
        }

        /// Revert reason of a failed transaction or view.
        pub fn reason(&self, err: ChainError) -> String {
            match err.revert() {
                Some(revert) => revert.message(),
                None => err.to_string(),
            }
        }

        pub fn register(&mut self, registry: Address, module: Address) {
            self.chain
                .send(self.owner, registry, &IModuleRegistry::registerModuleCall { module })
                .unwrap();
        }

        pub fn system(&mut self) -> System {
            let factory = self.deploy(Artifact::Factory.bare_init_code());
            let registry = self.deploy(Artifact::ModuleRegistry.bare_init_code());
            let module_manager = self.deploy(Artifact::ModuleManager.init_code(&(registry,)));
            let lock_manager =
                self.deploy(Artifact::LockManager.init_code(&(U256::from(LOCK_PERIOD),)));
            let identity = self.deploy(Artifact::Identity.bare_init_code());
            let identity_proxy_factory =
                self.deploy(Artifact::IdentityProxyFactory.bare_init_code());
            let relayer = self.deploy(Artifact::RelayerModule.init_code(&(
                lock_manager,
                U256::from(MIN_GAS),
                U256::from(REFUND_GAS),
            )));
            let delegate = self.deploy(Artifact::DelegateModule.bare_init_code());
            let module_a = self.deploy(Artifact::DelegateModule.bare_init_code());
            let module_b = self.deploy(Artifact::DelegateModule.bare_init_code());

            for module in [relayer, delegate, module_a, module_b] {
                self.register(registry, module);
            }

            System {
                factory,
                registry,
                module_manager,
                lock_manager,
                identity,
                identity_proxy_factory,
                relayer,
                delegate,
                module_a,
                module_b,
            }
        }

        /// `initialize` calldata enabling `modules` plus the delegate module,
        /// with the standard interface selectors delegated to it.
        pub fn identity_init(system: &System, owner: Address, modules: &[Address]) -> Bytes {
            let mut enabled = modules.to_vec();
            if !enabled.contains(&system.delegate) {
                enabled.push(system.delegate);
            }
            IIdentity::initializeCall {
                owner,
                moduleManagerImpl: system.module_manager,
                modules: enabled,
                delegateModules: vec![system.delegate; abi::DELEGATE_METHOD_IDS.len()],
                delegateMethodIDs: abi::DELEGATE_METHOD_IDS.iter().map(|id| (*id).into()).collect(),
            }
            .abi_encode()
            .into()
        }

        /// Create an initialized identity proxy through the proxy factory.
        pub fn identity(&mut self, system: &System, owner: Address, modules: &[Address]) -> Address {
            self.next_salt += 1;
            let (proxy, _) = self
                .chain
                .send(
                    self.owner,
                    system.identity_proxy_factory,
                    &IIdentityProxyFactory::createProxyCall {
                        identityImplementation: system.identity,
                        salt: B256::left_padding_from(&self.next_salt.to_be_bytes()),
                        data: Self::identity_init(system, owner, modules),
                    },
                )
                .unwrap();
            proxy
        }
    }
}
