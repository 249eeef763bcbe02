// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Idempotent bootstrap of the core contracts.
//!
//! The [`Factory`](crate::contracts::factory::Factory) is placed at the
//! deployer's first CREATE address; every other contract goes through it with
//! a zero salt, so each address is a pure function of deployer, artifact and
//! constructor arguments. Re-running the deployment against a chain that
//! already has the contracts is a no-op.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;

use super::RelayerError;
use crate::contracts::factory::create2_address;
use crate::contracts::identity_proxy_factory::proxy_address;
use crate::contracts::Artifact;
use crate::evm::abi::{self, IFactory, IIdentity, IModuleRegistry, IOwnable};
use crate::evm::Chain;

const SALT: B256 = B256::ZERO;

/// Constructor parameters of the core contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployConfig {
    pub lock_period: u64,
    pub relay_min_gas: u64,
    pub relay_refund_gas: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            lock_period: 604_800,
            relay_min_gas: 21_000,
            relay_refund_gas: 22_000,
        }
    }
}

/// Addresses of a bootstrapped system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub owner: Address,
    pub factory: Address,
    pub registry: Address,
    pub module_manager: Address,
    pub lock_manager: Address,
    pub identity: Address,
    pub identity_proxy_factory: Address,
    pub relayer_module: Address,
    /// `RelayerModule` or `ArbRelayerModule`.
    pub relayer_artifact: Artifact,
    pub delegate_module: Address,
}

impl Deployment {
    /// Predicted address of the identity proxy created with `salt`.
    pub fn identity_address(&self, salt: B256) -> Address {
        proxy_address(self.identity_proxy_factory, self.identity, salt)
    }

    /// `Identity.initialize` calldata enabling the relayer module and
    /// `modules`. With `delegate_interfaces` the delegate module is enabled
    /// too and receives the standard interface selectors.
    pub fn identity_init(&self, owner: Address, modules: &[Address], delegate_interfaces: bool) -> Bytes {
        let mut enabled = vec![self.relayer_module];
        for module in modules {
            if !enabled.contains(module) {
                enabled.push(*module);
            }
        }

        let (delegate_modules, method_ids) = if delegate_interfaces {
            if !enabled.contains(&self.delegate_module) {
                enabled.push(self.delegate_module);
            }
            (
                vec![self.delegate_module; abi::DELEGATE_METHOD_IDS.len()],
                abi::DELEGATE_METHOD_IDS.iter().map(|id| (*id).into()).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        IIdentity::initializeCall {
            owner,
            moduleManagerImpl: self.module_manager,
            modules: enabled,
            delegateModules: delegate_modules,
            delegateMethodIDs: method_ids,
        }
        .abi_encode()
        .into()
    }
}

pub struct Deployer {
    from: Address,
    config: DeployConfig,
}

impl Deployer {
    pub fn new(from: Address, config: DeployConfig) -> Self {
        Self { from, config }
    }

    pub fn deploy(&self, chain: &mut Chain) -> Result<Deployment, RelayerError> {
        let factory = self.factory(chain)?;
        let transfer: Bytes = IOwnable::transferOwnershipCall { newOwner: self.from }
            .abi_encode()
            .into();

        let registry = self.ensure(
            chain,
            factory,
            Artifact::ModuleRegistry.bare_init_code(),
            &transfer,
        )?;
        let module_manager = self.ensure(
            chain,
            factory,
            Artifact::ModuleManager.init_code(&(registry,)),
            &transfer,
        )?;
        let lock_manager = self.ensure(
            chain,
            factory,
            Artifact::LockManager.init_code(&(U256::from(self.config.lock_period),)),
            &Bytes::new(),
        )?;
        let identity = self.ensure(
            chain,
            factory,
            Artifact::Identity.bare_init_code(),
            &Bytes::new(),
        )?;
        let identity_proxy_factory = self.ensure(
            chain,
            factory,
            Artifact::IdentityProxyFactory.bare_init_code(),
            &transfer,
        )?;

        let (relayer_artifact, relayer_code) = if chain.network().arbitrum {
            (
                Artifact::ArbRelayerModule,
                Artifact::ArbRelayerModule.init_code(&(lock_manager,)),
            )
        } else {
            (
                Artifact::RelayerModule,
                Artifact::RelayerModule.init_code(&(
                    lock_manager,
                    U256::from(self.config.relay_min_gas),
                    U256::from(self.config.relay_refund_gas),
                )),
            )
        };
        let relayer_module = self.ensure(chain, factory, relayer_code, &Bytes::new())?;
        let delegate_module = self.ensure(
            chain,
            factory,
            Artifact::DelegateModule.bare_init_code(),
            &Bytes::new(),
        )?;

        for module in [relayer_module, delegate_module] {
            self.register(chain, registry, module)?;
        }

        tracing::info!(
            chain_id = chain.chain_id(),
            %factory,
            %registry,
            relayer = %relayer_module,
            relayer_kind = relayer_artifact.name(),
            "Core contracts ready"
        );

        Ok(Deployment {
            owner: self.from,
            factory,
            registry,
            module_manager,
            lock_manager,
            identity,
            identity_proxy_factory,
            relayer_module,
            relayer_artifact,
            delegate_module,
        })
    }

    fn factory(&self, chain: &mut Chain) -> Result<Address, RelayerError> {
        let address = self.from.create(0);
        if let Some(code) = chain.code(address) {
            if code.name != Artifact::Factory.name() {
                return Err(RelayerError::Deployment(format!(
                    "deployer {} created a {} at {address}, not a Factory",
                    self.from, code.name
                )));
            }
            return Ok(address);
        }
        if chain.nonce(self.from) != 0 {
            return Err(RelayerError::Deployment(format!(
                "deployer {} has already used nonce 0 and no factory exists at {address}",
                self.from
            )));
        }
        let deployed = chain.deploy(self.from, Artifact::Factory.bare_init_code())?;
        tracing::info!(address = %deployed, "Deployed Factory");
        Ok(deployed)
    }

    fn ensure(
        &self,
        chain: &mut Chain,
        factory: Address,
        code: Bytes,
        init: &Bytes,
    ) -> Result<Address, RelayerError> {
        let name = artifact_name(&code);
        let address = create2_address(factory, SALT, keccak256(&code));
        if chain.has_code(address) {
            tracing::debug!(contract = name, %address, "Already deployed, skipping");
            return Ok(address);
        }

        let (deployed, receipt) = chain.send(
            self.from,
            factory,
            &IFactory::createCall {
                code,
                salt: SALT,
                data: init.clone(),
            },
        )?;
        tracing::info!(
            contract = name,
            address = %deployed,
            gas_used = receipt.gas_used,
            "Deployed contract"
        );
        Ok(deployed)
    }

    fn register(&self, chain: &mut Chain, registry: Address, module: Address) -> Result<(), RelayerError> {
        if chain.call(registry, &IModuleRegistry::isModuleRegisteredCall { module })? {
            return Ok(());
        }
        chain.send(self.from, registry, &IModuleRegistry::registerModuleCall { module })?;
        tracing::info!(%module, "Registered module");
        Ok(())
    }
}

fn artifact_name(code: &[u8]) -> &'static str {
    code.get(..32)
        .and_then(Artifact::from_tag)
        .map(Artifact::name)
        .unwrap_or("unknown")
}
