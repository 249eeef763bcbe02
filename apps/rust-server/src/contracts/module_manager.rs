// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-identity module authorization and method delegation table.
//!
//! Module lifecycle: `Registered -> Enabled -> [Fixed]`. Fixing is a ratchet;
//! a fixed module can never be disabled. Delegations route a 4-byte selector
//! to one enabled module and outlive the module being disabled until they are
//! cleared explicitly.

use alloy::primitives::{Address, Bytes, FixedBytes};

use super::ownable;
use crate::evm::abi::{self, IModuleManager, IModuleRegistry};
use crate::evm::{require, Contract, Env, Revert};

#[derive(Debug, Clone, Copy, Default)]
struct Initialized(bool);

/// Keyed by module address.
#[derive(Debug, Clone, Copy, Default)]
struct ModuleStatus {
    enabled: bool,
    fixed: bool,
}

/// Keyed by method selector; zero when no delegation is set.
#[derive(Debug, Clone, Copy, Default)]
struct Delegate(Address);

pub struct ModuleManager {
    registry: Address,
}

impl ModuleManager {
    pub fn new(registry: Address) -> Self {
        Self { registry }
    }

    fn initialize(&self, env: &mut Env<'_>, owner: Address) -> Result<(), Revert> {
        let Initialized(initialized) = env.load::<Initialized>()?;
        require(!initialized, "MM: contract is already initialized")?;
        env.store(Initialized(true))?;
        ownable::init(env, owner)
    }

    fn enable_module(&self, env: &mut Env<'_>, module: Address) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        let registered = env.view(
            self.registry,
            &IModuleRegistry::isModuleRegisteredCall { module },
        )?;
        require(registered, "MM: module must be registered")?;

        let mut status = env.load_entry::<ModuleStatus>(module)?;
        require(!status.enabled, "MM: module is already enabled")?;
        status.enabled = true;
        env.store_entry(module, status)?;
        env.emit(&IModuleManager::ModuleEnabled { module })?;
        tracing::info!(manager = %env.address(), module = %module, "Module enabled");
        Ok(())
    }

    fn disable_module(&self, env: &mut Env<'_>, module: Address) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        let mut status = env.load_entry::<ModuleStatus>(module)?;
        require(status.enabled, "MM: module is already disabled")?;
        require(!status.fixed, "MM: module is fixed")?;
        status.enabled = false;
        env.store_entry(module, status)?;
        env.emit(&IModuleManager::ModuleDisabled { module })?;
        tracing::info!(manager = %env.address(), module = %module, "Module disabled");
        Ok(())
    }

    fn fix_module(&self, env: &mut Env<'_>, module: Address) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        let mut status = env.load_entry::<ModuleStatus>(module)?;
        require(status.enabled, "MM: module must be enabled")?;
        require(!status.fixed, "MM: module is already fixed")?;
        status.fixed = true;
        env.store_entry(module, status)?;
        env.emit(&IModuleManager::ModuleFixed { module })?;
        tracing::info!(manager = %env.address(), module = %module, "Module fixed");
        Ok(())
    }

    fn enable_delegation(
        &self,
        env: &mut Env<'_>,
        method_id: FixedBytes<4>,
        module: Address,
    ) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        let status = env.load_entry::<ModuleStatus>(module)?;
        require(status.enabled, "MM: module must be enabled")?;
        let Delegate(current) = env.load_entry::<Delegate>(method_id)?;
        require(current.is_zero(), "MM: delegation is already enabled")?;
        env.store_entry(method_id, Delegate(module))?;
        env.emit(&IModuleManager::DelegationEnabled {
            methodID: method_id,
            module,
        })
    }

    fn disable_delegation(&self, env: &mut Env<'_>, method_id: FixedBytes<4>) -> Result<(), Revert> {
        ownable::only_owner(env)?;
        let Delegate(current) = env.load_entry::<Delegate>(method_id)?;
        require(!current.is_zero(), "MM: delegation is already disabled")?;
        env.store_entry(method_id, Delegate(Address::ZERO))?;
        env.emit(&IModuleManager::DelegationDisabled {
            methodID: method_id,
        })
    }
}

impl Contract for ModuleManager {
    /// The implementation itself is born initialized and owned by its
    /// deployer; proxies to it start empty and must call `initialize`.
    fn construct(&self, env: &mut Env<'_>) -> Result<(), Revert> {
        require(
            env.is_contract(self.registry),
            "MM: registry must be an existing contract address",
        )?;
        let deployer = env.caller();
        self.initialize(env, deployer)
    }

    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use IModuleManager::IModuleManagerCalls as Calls;

        if let Some(result) = ownable::dispatch(env, input) {
            return result;
        }
        match abi::decode_call::<Calls>(input)? {
            Calls::initialize(call) => self.initialize(env, call.owner)?,
            Calls::registry(_) => {
                return Ok(abi::encode_return::<IModuleManager::registryCall>(
                    &self.registry,
                ))
            }
            Calls::enableModule(call) => self.enable_module(env, call.module)?,
            Calls::disableModule(call) => self.disable_module(env, call.module)?,
            Calls::fixModule(call) => self.fix_module(env, call.module)?,
            Calls::enableDelegation(call) => {
                self.enable_delegation(env, call.methodID, call.module)?
            }
            Calls::disableDelegation(call) => self.disable_delegation(env, call.methodID)?,
            Calls::isModuleEnabled(call) => {
                let enabled = env.load_entry::<ModuleStatus>(call.module)?.enabled;
                return Ok(abi::encode_return::<IModuleManager::isModuleEnabledCall>(
                    &enabled,
                ));
            }
            Calls::isModuleFixed(call) => {
                let fixed = env.load_entry::<ModuleStatus>(call.module)?.fixed;
                return Ok(abi::encode_return::<IModuleManager::isModuleFixedCall>(
                    &fixed,
                ));
            }
            Calls::getDelegate(call) => {
                let Delegate(delegate) = env.load_entry::<Delegate>(call.methodID)?;
                return Ok(abi::encode_return::<IModuleManager::getDelegateCall>(
                    &delegate,
                ));
            }
        }
        Ok(Bytes::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::fixed_bytes;

    use crate::contracts::testing::Fixture;
    use crate::contracts::Artifact;
    use crate::evm::abi::IOwnable;

    struct Setup {
        fx: Fixture,
        registry: Address,
        manager: Address,
        module: Address,
    }

    fn setup() -> Setup {
        let mut fx = Fixture::new();
        let registry = fx.deploy(Artifact::ModuleRegistry.bare_init_code());
        let manager = fx.deploy(Artifact::ModuleManager.init_code(&(registry,)));
        let module = fx.deploy(Artifact::DelegateModule.bare_init_code());
        fx.chain
            .send(fx.owner, registry, &IModuleRegistry::registerModuleCall { module })
            .unwrap();
        Setup {
            fx,
            registry,
            manager,
            module,
        }
    }

    const METHOD_ID: FixedBytes<4> = fixed_bytes!("01ffc9a7");

    impl Setup {
        fn send<C: alloy::sol_types::SolCall>(&mut self, call: &C) -> Result<(), String> {
            let (owner, manager) = (self.fx.owner, self.manager);
            self.fx
                .chain
                .send(owner, manager, call)
                .map(|_| ())
                .map_err(|err| self.fx.reason(err))
        }

        fn enabled(&self, module: Address) -> bool {
            self.fx
                .chain
                .call(self.manager, &IModuleManager::isModuleEnabledCall { module })
                .unwrap()
        }
    }

    #[test]
    fn constructor_requires_registry_contract() {
        let mut fx = Fixture::new();
        let err = fx
            .chain
            .deploy(
                fx.owner,
                Artifact::ModuleManager.init_code(&(Address::repeat_byte(3),)),
            )
            .err()
            .unwrap();
        assert_eq!(fx.reason(err), "MM: registry must be an existing contract address");
    }

    #[test]
    fn implementation_is_born_initialized() {
        let mut s = setup();
        let other = s.fx.other;
        assert_eq!(
            s.send(&IModuleManager::initializeCall { owner: other }),
            Err("MM: contract is already initialized".to_string())
        );
        assert_eq!(
            s.fx.chain.call(s.manager, &IModuleManager::registryCall {}).unwrap(),
            s.registry
        );
    }

    #[test]
    fn proxy_initializes_once() {
        let mut s = setup();
        let proxy = s.fx.deploy(Artifact::Proxy.init_code(&(s.manager,)));
        let other = s.fx.other;

        s.fx.chain
            .send(other, proxy, &IModuleManager::initializeCall { owner: other })
            .unwrap();
        assert_eq!(s.fx.chain.call(proxy, &IOwnable::ownerCall {}).unwrap(), other);
        // Immutables come from the implementation's code.
        assert_eq!(
            s.fx.chain.call(proxy, &IModuleManager::registryCall {}).unwrap(),
            s.registry
        );

        let err = s
            .fx
            .chain
            .send(other, proxy, &IModuleManager::initializeCall { owner: other })
            .err()
            .unwrap();
        assert_eq!(s.fx.reason(err), "MM: contract is already initialized");
    }

    #[test]
    fn enable_requires_owner_and_registration() {
        let mut s = setup();
        let (other, module) = (s.fx.other, s.module);
        let err = s
            .fx
            .chain
            .send(other, s.manager, &IModuleManager::enableModuleCall { module })
            .err()
            .unwrap();
        assert_eq!(s.fx.reason(err), "O: caller must be the owner");

        assert_eq!(
            s.send(&IModuleManager::enableModuleCall { module: other }),
            Err("MM: module must be registered".to_string())
        );
    }

    #[test]
    fn enable_disable_cycle() {
        let mut s = setup();
        let module = s.module;
        s.send(&IModuleManager::enableModuleCall { module }).unwrap();
        assert!(s.enabled(module));
        assert_eq!(
            s.send(&IModuleManager::enableModuleCall { module }),
            Err("MM: module is already enabled".to_string())
        );

        s.send(&IModuleManager::disableModuleCall { module }).unwrap();
        assert!(!s.enabled(module));
        assert_eq!(
            s.send(&IModuleManager::disableModuleCall { module }),
            Err("MM: module is already disabled".to_string())
        );
    }

    #[test]
    fn fixed_module_cannot_be_disabled_after_owner_changes() {
        let mut s = setup();
        let module = s.module;
        assert_eq!(
            s.send(&IModuleManager::fixModuleCall { module }),
            Err("MM: module must be enabled".to_string())
        );
        s.send(&IModuleManager::enableModuleCall { module }).unwrap();
        s.send(&IModuleManager::fixModuleCall { module }).unwrap();
        assert_eq!(
            s.send(&IModuleManager::fixModuleCall { module }),
            Err("MM: module is already fixed".to_string())
        );

        let mut owner = s.fx.owner;
        for next in [s.fx.other, Address::repeat_byte(0x21), Address::repeat_byte(0x22)] {
            s.fx.chain
                .send(owner, s.manager, &IOwnable::transferOwnershipCall { newOwner: next })
                .unwrap();
            owner = next;
            let err = s
                .fx
                .chain
                .send(owner, s.manager, &IModuleManager::disableModuleCall { module })
                .err()
                .unwrap();
            assert_eq!(s.fx.reason(err), "MM: module is fixed");
            assert!(s.enabled(module));
        }
        assert!(s
            .fx
            .chain
            .call(s.manager, &IModuleManager::isModuleFixedCall { module })
            .unwrap());
    }

    #[test]
    fn delegation_lifecycle() {
        let mut s = setup();
        let module = s.module;
        let enable = IModuleManager::enableDelegationCall {
            methodID: METHOD_ID,
            module,
        };
        let disable = IModuleManager::disableDelegationCall {
            methodID: METHOD_ID,
        };

        assert_eq!(s.send(&enable), Err("MM: module must be enabled".to_string()));
        s.send(&IModuleManager::enableModuleCall { module }).unwrap();
        s.send(&enable).unwrap();
        assert_eq!(
            s.send(&enable),
            Err("MM: delegation is already enabled".to_string())
        );

        // Disabling the module leaves the delegation in place.
        s.send(&IModuleManager::disableModuleCall { module }).unwrap();
        let delegate = s
            .fx
            .chain
            .call(s.manager, &IModuleManager::getDelegateCall { methodID: METHOD_ID })
            .unwrap();
        assert_eq!(delegate, module);

        s.send(&disable).unwrap();
        assert_eq!(
            s.send(&disable),
            Err("MM: delegation is already disabled".to_string())
        );
        let delegate = s
            .fx
            .chain
            .call(s.manager, &IModuleManager::getDelegateCall { methodID: METHOD_ID })
            .unwrap();
        assert_eq!(delegate, Address::ZERO);
    }

    #[test]
    fn deregistration_does_not_cascade() {
        let mut s = setup();
        let module = s.module;
        s.send(&IModuleManager::enableModuleCall { module }).unwrap();
        let (owner, registry) = (s.fx.owner, s.registry);
        s.fx.chain
            .send(owner, registry, &IModuleRegistry::deregisterModuleCall { module })
            .unwrap();
        assert!(s.enabled(module));
    }
}
