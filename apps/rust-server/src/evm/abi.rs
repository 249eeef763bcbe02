// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract ABI.
//!
//! Every entry point and event is declared through alloy's `sol!` macro so
//! selectors, event topics and encodings are the canonical Solidity ones and
//! can be driven by any standard tooling.

use alloy::primitives::{fixed_bytes, Bytes, FixedBytes};
use alloy::sol;
use alloy::sol_types::{SolCall, SolInterface};

use super::revert::Revert;

sol! {
    #[derive(Debug)]
    interface IOwnable {
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

        function owner() external view returns (address);
        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;
    }

    #[derive(Debug)]
    interface IProxy {
        function implementation() external view returns (address);
    }

    #[derive(Debug)]
    interface IFactory {
        event Created(address indexed addr);

        function create(bytes code, bytes32 salt, bytes data) external returns (address);
        function getAddress(bytes32 codeHash, bytes32 salt) external view returns (address);
    }

    #[derive(Debug)]
    interface IIdentityProxyFactory {
        event ProxyCreated(address indexed proxy);

        function createProxy(address identityImplementation, bytes32 salt, bytes data) external returns (address);
        function getProxyAddress(address identityImplementation, bytes32 salt) external view returns (address);
    }

    #[derive(Debug)]
    interface IModuleRegistry {
        event ModuleRegistered(address indexed module);
        event ModuleDeregistered(address indexed module);

        function registerModule(address module) external;
        function deregisterModule(address module) external;
        function isModuleRegistered(address module) external view returns (bool);
    }

    #[derive(Debug)]
    interface IModuleManager {
        event ModuleEnabled(address indexed module);
        event ModuleDisabled(address indexed module);
        event ModuleFixed(address indexed module);
        event DelegationEnabled(bytes4 indexed methodID, address indexed module);
        event DelegationDisabled(bytes4 indexed methodID);

        function initialize(address owner) external;
        function registry() external view returns (address);
        function enableModule(address module) external;
        function disableModule(address module) external;
        function fixModule(address module) external;
        function enableDelegation(bytes4 methodID, address module) external;
        function disableDelegation(bytes4 methodID) external;
        function isModuleEnabled(address module) external view returns (bool);
        function isModuleFixed(address module) external view returns (bool);
        function getDelegate(bytes4 methodID) external view returns (address);
    }

    #[derive(Debug)]
    interface ILockManager {
        event IdentityLocked(address indexed identity, address indexed locker, uint256 expireAt);
        event IdentityUnlocked(address indexed identity);

        function lockPeriod() external view returns (uint256);
        function lockIdentity(address identity) external;
        function unlockIdentity(address identity) external;
        function isIdentityLocked(address identity) external view returns (bool);
        function getIdentityLockExpireAt(address identity) external view returns (uint256);
    }

    #[derive(Debug)]
    interface IIdentity {
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
        event ModuleManagerSwitched(address indexed previousModuleManager, address indexed newModuleManager);
        event Executed(address indexed module, address indexed to, uint256 value, bytes data);

        function initialize(
            address owner,
            address moduleManagerImpl,
            address[] modules,
            address[] delegateModules,
            bytes4[] delegateMethodIDs
        ) external;
        function owner() external view returns (address);
        function moduleManager() external view returns (address);
        function setOwner(address newOwner) external;
        function setModuleManager(address newModuleManager) external;
        function isModuleEnabled(address module) external view returns (bool);
        function getDelegate(bytes4 methodID) external view returns (address);
        function execute(address to, uint256 value, bytes data) external returns (bytes);
    }

    #[derive(Debug)]
    interface IRelayerModule {
        event Executed(address indexed identity, bool success, bytes result, bytes32 txHash);
        event Refunded(address indexed identity, address indexed receiver, address token, uint256 amount);

        function ping() external;
        function lockManager() external view returns (address);
        function getNonce(address identity) external view returns (uint256);
        function getIdentityOpHash(
            address identity,
            bytes data,
            uint256 gasPrice,
            uint256 gasLimit,
            address refundToken,
            address refundTo
        ) external view returns (bytes32);
        function execute(
            address identity,
            bytes data,
            uint256 gasPrice,
            uint256 gasLimit,
            address refundToken,
            address refundTo,
            bytes signatures
        ) external returns (bool);
        function executeThroughIdentity(address identity, address to, uint256 value, bytes data) external returns (bytes);
    }

    #[derive(Debug)]
    interface ICosignerRegistry {
        event CosignersUpdated(address indexed identity, address[] cosigners);

        function setCosigners(address[] cosigners) external;
        function getCosigners(address identity) external view returns (address[]);
    }

    #[derive(Debug)]
    interface IDelegateModule {
        function supportsInterface(bytes4 interfaceID) external view returns (bool);
        function onERC721Received(address operator, address from, uint256 tokenId, bytes data) external returns (bytes4);
        function onERC1155Received(address operator, address from, uint256 id, uint256 value, bytes data) external returns (bytes4);
        function onERC1155BatchReceived(
            address operator,
            address from,
            uint256[] ids,
            uint256[] values,
            bytes data
        ) external returns (bytes4);
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4);
    }

    #[derive(Debug)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);

        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
}

// =============================================================================
// Interface IDs
// =============================================================================

pub const INTERFACE_ID_ERC165: FixedBytes<4> = fixed_bytes!("01ffc9a7");
pub const INTERFACE_ID_ERC721_RECEIVER: FixedBytes<4> = fixed_bytes!("150b7a02");
pub const INTERFACE_ID_ERC1155_RECEIVER: FixedBytes<4> = fixed_bytes!("4e2312e0");
pub const INTERFACE_ID_ERC1271: FixedBytes<4> = fixed_bytes!("1626ba7e");

/// Selectors the delegate module serves when installed on an identity.
pub const DELEGATE_METHOD_IDS: [[u8; 4]; 5] = [
    IDelegateModule::supportsInterfaceCall::SELECTOR,
    IDelegateModule::onERC721ReceivedCall::SELECTOR,
    IDelegateModule::onERC1155ReceivedCall::SELECTOR,
    IDelegateModule::onERC1155BatchReceivedCall::SELECTOR,
    IDelegateModule::isValidSignatureCall::SELECTOR,
];

// =============================================================================
// Dispatch helpers
// =============================================================================

/// First four bytes of calldata.
pub fn selector(input: &[u8]) -> Option<[u8; 4]> {
    input.get(..4)?.try_into().ok()
}

/// Decode calldata against an interface, reverting like a Solidity
/// dispatcher would on unknown selectors or malformed arguments.
pub fn decode_call<I: SolInterface>(input: &[u8]) -> Result<I, Revert> {
    I::abi_decode(input).map_err(|_| match selector(input) {
        Some(sel) if I::valid_selector(sel) => Revert::reason("invalid calldata"),
        _ => Revert::reason("function selector was not recognized"),
    })
}

/// Is `input` a call that interface `I` understands?
pub fn handles<I: SolInterface>(input: &[u8]) -> bool {
    selector(input).is_some_and(I::valid_selector)
}

pub fn encode_return<C: SolCall>(ret: &C::Return) -> Bytes {
    C::abi_encode_returns(ret).into()
}
