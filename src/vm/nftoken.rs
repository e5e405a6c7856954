//! Built-in non-fungible token contract (catalogue id 0x02).
//!
//! Storage slots: `Creator`, `Counter`, `Name`, `Symbol`, `Owners`
//! (tokenId → owner), `TokenUris` (tokenId → uri), `Balances`
//! (address → held count), `TokenAllowances` (tokenId → approved address),
//! `Allowances` (owner → operator → approved).
//!
//! Token ids are allocated from the monotonically increasing `Counter`;
//! id 0 is never a valid token, so a zero id doubles as the mint-failure
//! sentinel.

use crate::core::state::StateTree;
use crate::types::address::Address;
use crate::vm::contract::{
    BuiltinContract, ContractContext, ContractDescriptor, EventDesc, MethodDesc, read_slot,
    write_slot,
};
use crate::vm::errors::VmError;
use crate::vm::logger::ContractEvent;
use crate::vm::values::{
    C_BOOL_FALSE, C_BOOL_TRUE, CTypeAddress, CTypeBool, CTypeString, CTypeUint256, CValue,
    ParamType,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Emitted once per successful mint.
#[derive(Serialize)]
pub struct NFTokenMintEvent {
    pub to: CTypeAddress,
    pub token_id: CTypeUint256,
    pub token_uri: CTypeString,
}

impl ContractEvent for NFTokenMintEvent {
    const NAME: &'static str = "NFTokenMintEvent";
}

/// Non-fungible token state, one instance per deployed contract address.
#[derive(Default)]
pub struct NFToken {
    creator: CTypeAddress,
    counter: CTypeUint256,
    name: CTypeString,
    symbol: CTypeString,
    owners: BTreeMap<CTypeUint256, CTypeAddress>,
    token_uris: BTreeMap<CTypeUint256, CTypeString>,
    balances: BTreeMap<CTypeAddress, CTypeUint256>,
    token_allowances: BTreeMap<CTypeUint256, CTypeAddress>,
    allowances: BTreeMap<CTypeAddress, BTreeMap<CTypeAddress, CTypeBool>>,
}

impl NFToken {
    /// Initializes the collection. The caller becomes the creator with
    /// exclusive mint rights.
    pub fn create(&mut self, ctx: &mut ContractContext<'_>, name: CTypeString, symbol: CTypeString) {
        self.creator = CTypeAddress::from(ctx.caller);
        self.name = name;
        self.symbol = symbol;
        self.counter = CTypeUint256::zero();
        self.owners = BTreeMap::new();
        self.token_uris = BTreeMap::new();
        self.balances = BTreeMap::new();
        self.token_allowances = BTreeMap::new();
        self.allowances = BTreeMap::new();
    }

    pub fn get_name(&self) -> CTypeString {
        self.name.clone()
    }

    pub fn get_symbol(&self) -> CTypeString {
        self.symbol.clone()
    }

    fn exists(&self, token_id: CTypeUint256) -> bool {
        self.owners
            .get(&token_id)
            .is_some_and(|owner| !owner.is_zero())
    }

    /// Mints the next token id to `to`. Creator only; returns the zero id
    /// on failure.
    pub fn mint(
        &mut self,
        ctx: &mut ContractContext<'_>,
        to: CTypeAddress,
        token_uri: CTypeString,
    ) -> CTypeUint256 {
        if CTypeAddress::from(ctx.caller) != self.creator {
            return CTypeUint256::zero();
        }
        if to.is_zero() {
            return CTypeUint256::zero();
        }
        let Some(token_id) = self.counter.checked_add(&CTypeUint256::from_u64(1)) else {
            return CTypeUint256::zero();
        };
        let Some(new_balance) = self
            .balance_of(to)
            .checked_add(&CTypeUint256::from_u64(1))
        else {
            return CTypeUint256::zero();
        };
        self.balances.insert(to, new_balance);
        self.owners.insert(token_id, to);
        self.token_uris.insert(token_id, token_uri.clone());
        self.counter = token_id;
        ctx.logger.emit(&NFTokenMintEvent {
            to,
            token_id,
            token_uri,
        });
        token_id
    }

    pub fn balance_of(&self, addr: CTypeAddress) -> CTypeUint256 {
        if addr.is_zero() {
            return CTypeUint256::zero();
        }
        self.balances.get(&addr).copied().unwrap_or_default()
    }

    pub fn owner_of(&self, token_id: CTypeUint256) -> CTypeAddress {
        if token_id.is_zero() {
            return CTypeAddress::zero();
        }
        self.owners.get(&token_id).copied().unwrap_or_default()
    }

    pub fn token_uri(&self, token_id: CTypeUint256) -> CTypeString {
        self.token_uris.get(&token_id).cloned().unwrap_or_default()
    }

    fn is_approved_or_owner(&self, spender: CTypeAddress, token_id: CTypeUint256) -> bool {
        if !self.exists(token_id) {
            return false;
        }
        let owner = self.owner_of(token_id);
        spender == owner
            || self.is_approved_for_all(owner, spender).is_true()
            || self.get_approved(token_id) == spender
    }

    /// Moves `token_id` from `from` to `to`. The caller must be the owner,
    /// the per-token approved address, or an approved operator. Clears the
    /// per-token approval.
    pub fn transfer_from(
        &mut self,
        ctx: &mut ContractContext<'_>,
        from: CTypeAddress,
        to: CTypeAddress,
        token_id: CTypeUint256,
    ) -> CTypeBool {
        if from.is_zero() || to.is_zero() || token_id.is_zero() {
            return C_BOOL_FALSE;
        }
        let caller = CTypeAddress::from(ctx.caller);
        if !self.is_approved_or_owner(caller, token_id) {
            return C_BOOL_FALSE;
        }
        if self.owner_of(token_id) != from {
            return C_BOOL_FALSE;
        }
        let Some(from_balance) = self
            .balance_of(from)
            .checked_sub(&CTypeUint256::from_u64(1))
        else {
            return C_BOOL_FALSE;
        };
        let Some(to_balance) = self
            .balance_of(to)
            .checked_add(&CTypeUint256::from_u64(1))
        else {
            return C_BOOL_FALSE;
        };
        self.token_allowances.insert(token_id, CTypeAddress::zero());
        self.balances.insert(from, from_balance);
        self.balances.insert(to, to_balance);
        self.owners.insert(token_id, to);
        C_BOOL_TRUE
    }

    /// Grants `to` transfer rights over `token_id`. The caller must be the
    /// owner or an approved operator.
    pub fn approve(
        &mut self,
        ctx: &mut ContractContext<'_>,
        to: CTypeAddress,
        token_id: CTypeUint256,
    ) -> CTypeBool {
        if to.is_zero() || token_id.is_zero() {
            return C_BOOL_FALSE;
        }
        let owner = self.owner_of(token_id);
        let caller = CTypeAddress::from(ctx.caller);
        if caller != owner && !self.is_approved_for_all(owner, caller).is_true() {
            return C_BOOL_FALSE;
        }
        self.token_allowances.insert(token_id, to);
        C_BOOL_TRUE
    }

    pub fn get_approved(&self, token_id: CTypeUint256) -> CTypeAddress {
        if !self.exists(token_id) {
            return CTypeAddress::zero();
        }
        self.token_allowances
            .get(&token_id)
            .copied()
            .unwrap_or_default()
    }

    /// Grants or revokes `operator` transfer rights over every token the
    /// caller owns. Self-approval is rejected.
    pub fn set_approval_for_all(
        &mut self,
        ctx: &mut ContractContext<'_>,
        operator: CTypeAddress,
        value: CTypeBool,
    ) -> CTypeBool {
        if operator.is_zero() {
            return C_BOOL_FALSE;
        }
        let owner = CTypeAddress::from(ctx.caller);
        if owner == operator {
            return C_BOOL_FALSE;
        }
        self.allowances
            .entry(owner)
            .or_default()
            .insert(operator, value);
        C_BOOL_TRUE
    }

    pub fn is_approved_for_all(&self, owner: CTypeAddress, spender: CTypeAddress) -> CTypeBool {
        if owner.is_zero() || spender.is_zero() {
            return C_BOOL_FALSE;
        }
        self.allowances
            .get(&owner)
            .and_then(|operators| operators.get(&spender))
            .copied()
            .unwrap_or(C_BOOL_FALSE)
    }
}

mod dispatch {
    use super::*;

    pub fn create(
        t: &mut NFToken,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        t.create(ctx, args[0].as_string()?, args[1].as_string()?);
        Ok(None)
    }

    pub fn mint(
        t: &mut NFToken,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let token_id = t.mint(ctx, args[0].as_address()?, args[1].as_string()?);
        Ok(Some(CValue::Uint256(token_id)))
    }

    pub fn balance_of(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Uint256(t.balance_of(args[0].as_address()?))))
    }

    pub fn owner_of(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Address(t.owner_of(args[0].as_uint256()?))))
    }

    pub fn token_uri(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::String(t.token_uri(args[0].as_uint256()?))))
    }

    pub fn transfer_from(
        t: &mut NFToken,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.transfer_from(
            ctx,
            args[0].as_address()?,
            args[1].as_address()?,
            args[2].as_uint256()?,
        );
        Ok(Some(CValue::Bool(result)))
    }

    pub fn approve(
        t: &mut NFToken,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.approve(ctx, args[0].as_address()?, args[1].as_uint256()?);
        Ok(Some(CValue::Bool(result)))
    }

    pub fn get_approved(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Address(t.get_approved(args[0].as_uint256()?))))
    }

    pub fn set_approval_for_all(
        t: &mut NFToken,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.set_approval_for_all(ctx, args[0].as_address()?, args[1].as_bool()?);
        Ok(Some(CValue::Bool(result)))
    }

    pub fn is_approved_for_all(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Bool(
            t.is_approved_for_all(args[0].as_address()?, args[1].as_address()?),
        )))
    }

    pub fn get_name(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        _args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::String(t.get_name())))
    }

    pub fn get_symbol(
        t: &mut NFToken,
        _ctx: &mut ContractContext<'_>,
        _args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::String(t.get_symbol())))
    }
}

static DESCRIPTOR: ContractDescriptor<NFToken> = ContractDescriptor {
    id: 0x02,
    methods: &[
        MethodDesc {
            name: "Create",
            params: &[ParamType::String, ParamType::String],
            returns: None,
            handler: dispatch::create,
        },
        MethodDesc {
            name: "Mint",
            params: &[ParamType::Address, ParamType::String],
            returns: Some(ParamType::Uint256),
            handler: dispatch::mint,
        },
        MethodDesc {
            name: "BalanceOf",
            params: &[ParamType::Address],
            returns: Some(ParamType::Uint256),
            handler: dispatch::balance_of,
        },
        MethodDesc {
            name: "OwnerOf",
            params: &[ParamType::Uint256],
            returns: Some(ParamType::Address),
            handler: dispatch::owner_of,
        },
        MethodDesc {
            name: "TokenUri",
            params: &[ParamType::Uint256],
            returns: Some(ParamType::String),
            handler: dispatch::token_uri,
        },
        MethodDesc {
            name: "TransferFrom",
            params: &[ParamType::Address, ParamType::Address, ParamType::Uint256],
            returns: Some(ParamType::Bool),
            handler: dispatch::transfer_from,
        },
        MethodDesc {
            name: "Approve",
            params: &[ParamType::Address, ParamType::Uint256],
            returns: Some(ParamType::Bool),
            handler: dispatch::approve,
        },
        MethodDesc {
            name: "GetApproved",
            params: &[ParamType::Uint256],
            returns: Some(ParamType::Address),
            handler: dispatch::get_approved,
        },
        MethodDesc {
            name: "SetApprovalForAll",
            params: &[ParamType::Address, ParamType::Bool],
            returns: Some(ParamType::Bool),
            handler: dispatch::set_approval_for_all,
        },
        MethodDesc {
            name: "IsApprovedForAll",
            params: &[ParamType::Address, ParamType::Address],
            returns: Some(ParamType::Bool),
            handler: dispatch::is_approved_for_all,
        },
        MethodDesc {
            name: "GetName",
            params: &[],
            returns: Some(ParamType::String),
            handler: dispatch::get_name,
        },
        MethodDesc {
            name: "GetSymbol",
            params: &[],
            returns: Some(ParamType::String),
            handler: dispatch::get_symbol,
        },
    ],
    events: &[EventDesc {
        name: "NFTokenMintEvent",
        params: &[
            ("to", ParamType::Address),
            ("token_id", ParamType::Uint256),
            ("token_uri", ParamType::String),
        ],
    }],
};

impl BuiltinContract for NFToken {
    const BUILTIN_ID: u8 = 0x02;

    fn descriptor() -> &'static ContractDescriptor<Self> {
        &DESCRIPTOR
    }

    fn load(tree: &dyn StateTree, address: Address) -> Result<Self, VmError> {
        Ok(NFToken {
            creator: read_slot(tree, address, "Creator")?,
            counter: read_slot(tree, address, "Counter")?,
            name: read_slot(tree, address, "Name")?,
            symbol: read_slot(tree, address, "Symbol")?,
            owners: read_slot(tree, address, "Owners")?,
            token_uris: read_slot(tree, address, "TokenUris")?,
            balances: read_slot(tree, address, "Balances")?,
            token_allowances: read_slot(tree, address, "TokenAllowances")?,
            allowances: read_slot(tree, address, "Allowances")?,
        })
    }

    fn store(&self, tree: &mut dyn StateTree, address: Address) -> Result<(), VmError> {
        write_slot(tree, address, "Creator", &self.creator)?;
        write_slot(tree, address, "Counter", &self.counter)?;
        write_slot(tree, address, "Name", &self.name)?;
        write_slot(tree, address, "Symbol", &self.symbol)?;
        write_slot(tree, address, "Owners", &self.owners)?;
        write_slot(tree, address, "TokenUris", &self.token_uris)?;
        write_slot(tree, address, "Balances", &self.balances)?;
        write_slot(tree, address, "TokenAllowances", &self.token_allowances)?;
        write_slot(tree, address, "Allowances", &self.allowances)?;
        Ok(())
    }
}
