// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-165 / ERC-721 / ERC-1155 / ERC-1271 handlers.
//!
//! Installed as the delegate for [`DELEGATE_METHOD_IDS`](crate::evm::abi::DELEGATE_METHOD_IDS)
//! and always invoked through an identity's fallback, so storage reads
//! resolve against the identity.

use alloy::primitives::{Bytes, FixedBytes, B256};
use alloy::sol_types::SolCall;

use crate::contracts::identity::IdentityState;
use crate::evm::abi::{self, IDelegateModule};
use crate::evm::{ecdsa, require, Contract, Env, Revert};

pub struct DelegateModule;

impl DelegateModule {
    fn supports_interface(interface_id: FixedBytes<4>) -> bool {
        [
            abi::INTERFACE_ID_ERC165,
            abi::INTERFACE_ID_ERC721_RECEIVER,
            abi::INTERFACE_ID_ERC1155_RECEIVER,
            abi::INTERFACE_ID_ERC1271,
        ]
        .contains(&interface_id)
    }

    fn is_valid_signature(
        env: &mut Env<'_>,
        hash: B256,
        signature: &[u8],
    ) -> Result<FixedBytes<4>, Revert> {
        require(
            signature.len() == ecdsa::SIGNATURE_LENGTH,
            "DM: invalid signature length",
        )?;
        let signer = ecdsa::recover(hash, signature)?;
        let owner = env.load::<IdentityState>()?.owner;
        require(signer == owner, "DM: invalid signer")?;
        Ok(abi::INTERFACE_ID_ERC1271)
    }
}

impl Contract for DelegateModule {
    fn call(&self, env: &mut Env<'_>, input: &[u8]) -> Result<Bytes, Revert> {
        use IDelegateModule::IDelegateModuleCalls as Calls;

        let output = match abi::decode_call::<Calls>(input)? {
            Calls::supportsInterface(call) => abi::encode_return::<IDelegateModule::supportsInterfaceCall>(
                &Self::supports_interface(call.interfaceID),
            ),
            Calls::onERC721Received(_) => abi::encode_return::<IDelegateModule::onERC721ReceivedCall>(
                &IDelegateModule::onERC721ReceivedCall::SELECTOR.into(),
            ),
            Calls::onERC1155Received(_) => abi::encode_return::<IDelegateModule::onERC1155ReceivedCall>(
                &IDelegateModule::onERC1155ReceivedCall::SELECTOR.into(),
            ),
            Calls::onERC1155BatchReceived(_) => {
                abi::encode_return::<IDelegateModule::onERC1155BatchReceivedCall>(
                    &IDelegateModule::onERC1155BatchReceivedCall::SELECTOR.into(),
                )
            }
            Calls::isValidSignature(call) => {
                let magic = Self::is_valid_signature(env, call.hash, &call.signature)?;
                abi::encode_return::<IDelegateModule::isValidSignatureCall>(&magic)
            }
        };
        Ok(output)
    }
}
