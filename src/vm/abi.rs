//! ABI derivation for built-in contracts.
//!
//! The exported ABI is read from the same declarative tables the executor
//! dispatches through. Methods are keyed by their hex selector
//! (`sha256(name)`, the zero hash for the constructor), events by the hex
//! hash of their type name.

use crate::vm::contract::BuiltinContract;
use crate::vm::errors::VmError;
use crate::vm::nftoken::NFToken;
use crate::vm::token::Token;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One positional method argument.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiArg {
    #[serde(rename = "type")]
    pub arg_type: String,
}

/// One exported method descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiMethod {
    pub name: String,
    pub argc: usize,
    pub args: Vec<AbiArg>,
    /// Declared return type; absent for the constructor.
    #[serde(rename = "returnType", skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

/// One named event payload field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEventArg {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: String,
}

/// One exported event descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    pub argc: usize,
    pub args: Vec<AbiEventArg>,
}

/// Full exported ABI of one built-in contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbi {
    pub methods: BTreeMap<String, AbiMethod>,
    pub events: BTreeMap<String, AbiEvent>,
}

/// Derives the ABI of contract type `C` from its descriptor.
pub fn export_abi<C: BuiltinContract + 'static>() -> ContractAbi {
    let descriptor = C::descriptor();

    let mut methods = BTreeMap::new();
    for method in descriptor.methods {
        methods.insert(
            method.selector().to_hex(),
            AbiMethod {
                name: method.name.to_string(),
                argc: method.params.len(),
                args: method
                    .params
                    .iter()
                    .map(|param| AbiArg {
                        arg_type: param.type_name().to_string(),
                    })
                    .collect(),
                return_type: method.returns.map(|ret| ret.type_name().to_string()),
            },
        );
    }

    let mut events = BTreeMap::new();
    for event in descriptor.events {
        events.insert(
            event.selector().to_hex(),
            AbiEvent {
                name: event.name.to_string(),
                argc: event.params.len(),
                args: event
                    .params
                    .iter()
                    .map(|(name, param)| AbiEventArg {
                        name: name.to_string(),
                        arg_type: param.type_name().to_string(),
                    })
                    .collect(),
            },
        );
    }

    ContractAbi { methods, events }
}

/// Derives the ABI for a catalogue id.
pub fn export_abi_by_id(id: u8) -> Result<ContractAbi, VmError> {
    match id {
        Token::BUILTIN_ID => Ok(export_abi::<Token>()),
        NFToken::BUILTIN_ID => Ok(export_abi::<NFToken>()),
        other => Err(VmError::UnknownContractId(other)),
    }
}
