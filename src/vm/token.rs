//! Built-in fungible token contract (catalogue id 0x01).
//!
//! Storage slots: `Name`, `Symbol`, `Decimals`, `TotalSupply`, `Owner`,
//! `Balances` (address → amount), `Allowances` (owner → spender → amount).
//!
//! Every mutating method maintains `sum(Balances) == TotalSupply`. Methods
//! reject in-protocol failures (unauthorized caller, insufficient balance
//! or allowance, zero address) by returning `False` without mutating state.

use crate::core::state::StateTree;
use crate::types::address::Address;
use crate::vm::contract::{
    BuiltinContract, ContractContext, ContractDescriptor, MethodDesc, read_slot, write_slot,
};
use crate::vm::errors::VmError;
use crate::vm::values::{
    C_BOOL_FALSE, C_BOOL_TRUE, CTypeAddress, CTypeBool, CTypeString, CTypeUint8, CTypeUint256,
    CValue, ParamType,
};
use std::collections::BTreeMap;

/// Fungible token state, one instance per deployed contract address.
#[derive(Default)]
pub struct Token {
    name: CTypeString,
    symbol: CTypeString,
    decimals: CTypeUint8,
    total_supply: CTypeUint256,
    owner: CTypeAddress,
    balances: BTreeMap<CTypeAddress, CTypeUint256>,
    allowances: BTreeMap<CTypeAddress, BTreeMap<CTypeAddress, CTypeUint256>>,
}

impl Token {
    /// Initializes all slots. The caller becomes the owner and is credited
    /// the full total supply.
    pub fn create(
        &mut self,
        ctx: &mut ContractContext<'_>,
        name: CTypeString,
        symbol: CTypeString,
        decimals: CTypeUint8,
        total_supply: CTypeUint256,
    ) {
        self.owner = CTypeAddress::from(ctx.caller);
        self.name = name;
        self.symbol = symbol;
        self.decimals = decimals;
        self.total_supply = total_supply;
        self.balances = BTreeMap::new();
        self.allowances = BTreeMap::new();
        self.balances.insert(self.owner, total_supply);
    }

    pub fn get_name(&self) -> CTypeString {
        self.name.clone()
    }

    pub fn get_symbol(&self) -> CTypeString {
        self.symbol.clone()
    }

    pub fn get_decimals(&self) -> CTypeUint8 {
        self.decimals
    }

    pub fn get_total_supply(&self) -> CTypeUint256 {
        self.total_supply
    }

    pub fn balance_of(&self, addr: CTypeAddress) -> CTypeUint256 {
        self.balances.get(&addr).copied().unwrap_or_default()
    }

    /// Creates new supply credited to `addr`. Owner only.
    pub fn mint(
        &mut self,
        ctx: &mut ContractContext<'_>,
        addr: CTypeAddress,
        amount: CTypeUint256,
    ) -> CTypeBool {
        if CTypeAddress::from(ctx.caller) != self.owner {
            return C_BOOL_FALSE;
        }
        if addr.is_zero() {
            return C_BOOL_FALSE;
        }
        let Some(new_total) = self.total_supply.checked_add(&amount) else {
            return C_BOOL_FALSE;
        };
        let Some(new_balance) = self.balance_of(addr).checked_add(&amount) else {
            return C_BOOL_FALSE;
        };
        self.total_supply = new_total;
        self.balances.insert(addr, new_balance);
        C_BOOL_TRUE
    }

    /// Destroys supply held by `addr`. Owner only; `addr` must hold at
    /// least `amount`.
    pub fn burn(
        &mut self,
        ctx: &mut ContractContext<'_>,
        addr: CTypeAddress,
        amount: CTypeUint256,
    ) -> CTypeBool {
        if CTypeAddress::from(ctx.caller) != self.owner {
            return C_BOOL_FALSE;
        }
        let Some(new_balance) = self.balance_of(addr).checked_sub(&amount) else {
            return C_BOOL_FALSE;
        };
        let Some(new_total) = self.total_supply.checked_sub(&amount) else {
            return C_BOOL_FALSE;
        };
        self.balances.insert(addr, new_balance);
        self.total_supply = new_total;
        C_BOOL_TRUE
    }

    /// Moves `amount` from the caller to `to`, creating the recipient
    /// entry if absent.
    pub fn transfer(
        &mut self,
        ctx: &mut ContractContext<'_>,
        to: CTypeAddress,
        amount: CTypeUint256,
    ) -> CTypeBool {
        if to.is_zero() {
            return C_BOOL_FALSE;
        }
        let caller = CTypeAddress::from(ctx.caller);
        let Some(balance) = self.balances.get(&caller).copied() else {
            return C_BOOL_FALSE;
        };
        let Some(residual) = balance.checked_sub(&amount) else {
            return C_BOOL_FALSE;
        };
        self.balances.insert(caller, residual);
        // Recipient balance is re-read after the sender write so a
        // self-transfer nets out to no change.
        let Some(new_target) = self.balance_of(to).checked_add(&amount) else {
            return C_BOOL_FALSE;
        };
        self.balances.insert(to, new_target);
        C_BOOL_TRUE
    }

    /// Moves `amount` from `from` to `to` on behalf of the caller,
    /// consuming the caller's allowance. The balance check precedes the
    /// allowance decrement.
    pub fn transfer_from(
        &mut self,
        ctx: &mut ContractContext<'_>,
        from: CTypeAddress,
        to: CTypeAddress,
        amount: CTypeUint256,
    ) -> CTypeBool {
        if from.is_zero() || to.is_zero() {
            return C_BOOL_FALSE;
        }
        let Some(balance) = self.balances.get(&from).copied() else {
            return C_BOOL_FALSE;
        };
        let Some(residual) = balance.checked_sub(&amount) else {
            return C_BOOL_FALSE;
        };
        let caller = CTypeAddress::from(ctx.caller);
        let Some(new_allowance) = self.allowance(from, caller).checked_sub(&amount) else {
            return C_BOOL_FALSE;
        };
        self.balances.insert(from, residual);
        let Some(new_target) = self.balance_of(to).checked_add(&amount) else {
            return C_BOOL_FALSE;
        };
        self.balances.insert(to, new_target);
        self.allowances
            .entry(from)
            .or_default()
            .insert(caller, new_allowance);
        C_BOOL_TRUE
    }

    /// Sets (overwrites) the caller's allowance for `spender`.
    pub fn approve(
        &mut self,
        ctx: &mut ContractContext<'_>,
        spender: CTypeAddress,
        amount: CTypeUint256,
    ) -> CTypeBool {
        if spender.is_zero() {
            return C_BOOL_FALSE;
        }
        let caller = CTypeAddress::from(ctx.caller);
        self.allowances
            .entry(caller)
            .or_default()
            .insert(spender, amount);
        C_BOOL_TRUE
    }

    pub fn allowance(&self, owner: CTypeAddress, spender: CTypeAddress) -> CTypeUint256 {
        if owner.is_zero() || spender.is_zero() {
            return CTypeUint256::zero();
        }
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or_default()
    }
}

mod dispatch {
    use super::*;

    pub fn create(
        t: &mut Token,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        t.create(
            ctx,
            args[0].as_string()?,
            args[1].as_string()?,
            args[2].as_uint8()?,
            args[3].as_uint256()?,
        );
        Ok(None)
    }

    pub fn mint(
        t: &mut Token,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.mint(ctx, args[0].as_address()?, args[1].as_uint256()?);
        Ok(Some(CValue::Bool(result)))
    }

    pub fn burn(
        t: &mut Token,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.burn(ctx, args[0].as_address()?, args[1].as_uint256()?);
        Ok(Some(CValue::Bool(result)))
    }

    pub fn transfer(
        t: &mut Token,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.transfer(ctx, args[0].as_address()?, args[1].as_uint256()?);
        Ok(Some(CValue::Bool(result)))
    }

    pub fn transfer_from(
        t: &mut Token,
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
        t: &mut Token,
        ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        let result = t.approve(ctx, args[0].as_address()?, args[1].as_uint256()?);
        Ok(Some(CValue::Bool(result)))
    }

    pub fn balance_of(
        t: &mut Token,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Uint256(t.balance_of(args[0].as_address()?))))
    }

    pub fn allowance(
        t: &mut Token,
        _ctx: &mut ContractContext<'_>,
        args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Uint256(
            t.allowance(args[0].as_address()?, args[1].as_address()?),
        )))
    }

    pub fn get_name(
        t: &mut Token,
        _ctx: &mut ContractContext<'_>,
        _args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::String(t.get_name())))
    }

    pub fn get_symbol(
        t: &mut Token,
        _ctx: &mut ContractContext<'_>,
        _args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::String(t.get_symbol())))
    }

    pub fn get_decimals(
        t: &mut Token,
        _ctx: &mut ContractContext<'_>,
        _args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Uint8(t.get_decimals())))
    }

    pub fn get_total_supply(
        t: &mut Token,
        _ctx: &mut ContractContext<'_>,
        _args: &[CValue],
    ) -> Result<Option<CValue>, VmError> {
        Ok(Some(CValue::Uint256(t.get_total_supply())))
    }
}

static DESCRIPTOR: ContractDescriptor<Token> = ContractDescriptor {
    id: 0x01,
    methods: &[
        MethodDesc {
            name: "Create",
            params: &[
                ParamType::String,
                ParamType::String,
                ParamType::Uint8,
                ParamType::Uint256,
            ],
            returns: None,
            handler: dispatch::create,
        },
        MethodDesc {
            name: "Mint",
            params: &[ParamType::Address, ParamType::Uint256],
            returns: Some(ParamType::Bool),
            handler: dispatch::mint,
        },
        MethodDesc {
            name: "Burn",
            params: &[ParamType::Address, ParamType::Uint256],
            returns: Some(ParamType::Bool),
            handler: dispatch::burn,
        },
        MethodDesc {
            name: "Transfer",
            params: &[ParamType::Address, ParamType::Uint256],
            returns: Some(ParamType::Bool),
            handler: dispatch::transfer,
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
            name: "BalanceOf",
            params: &[ParamType::Address],
            returns: Some(ParamType::Uint256),
            handler: dispatch::balance_of,
        },
        MethodDesc {
            name: "Allowance",
            params: &[ParamType::Address, ParamType::Address],
            returns: Some(ParamType::Uint256),
            handler: dispatch::allowance,
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
        MethodDesc {
            name: "GetDecimals",
            params: &[],
            returns: Some(ParamType::Uint8),
            handler: dispatch::get_decimals,
        },
        MethodDesc {
            name: "GetTotalSupply",
            params: &[],
            returns: Some(ParamType::Uint256),
            handler: dispatch::get_total_supply,
        },
    ],
    events: &[],
};

impl BuiltinContract for Token {
    const BUILTIN_ID: u8 = 0x01;

    fn descriptor() -> &'static ContractDescriptor<Self> {
        &DESCRIPTOR
    }

    fn load(tree: &dyn StateTree, address: Address) -> Result<Self, VmError> {
        Ok(Token {
            name: read_slot(tree, address, "Name")?,
            symbol: read_slot(tree, address, "Symbol")?,
            decimals: read_slot(tree, address, "Decimals")?,
            total_supply: read_slot(tree, address, "TotalSupply")?,
            owner: read_slot(tree, address, "Owner")?,
            balances: read_slot(tree, address, "Balances")?,
            allowances: read_slot(tree, address, "Allowances")?,
        })
    }

    fn store(&self, tree: &mut dyn StateTree, address: Address) -> Result<(), VmError> {
        write_slot(tree, address, "Name", &self.name)?;
        write_slot(tree, address, "Symbol", &self.symbol)?;
        write_slot(tree, address, "Decimals", &self.decimals)?;
        write_slot(tree, address, "TotalSupply", &self.total_supply)?;
        write_slot(tree, address, "Owner", &self.owner)?;
        write_slot(tree, address, "Balances", &self.balances)?;
        write_slot(tree, address, "Allowances", &self.allowances)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::MemStateTree;
    use crate::vm::logger::EventLogger;

    fn caddr(seed: u8) -> CTypeAddress {
        let mut bytes = [0u8; crate::types::address::ADDRESS_SIZE];
        bytes[0] = seed;
        CTypeAddress(Address(bytes))
    }

    fn u256(n: u64) -> CTypeUint256 {
        CTypeUint256::from_u64(n)
    }

    fn created_token(logger: &mut EventLogger) -> Token {
        let mut token = Token::default();
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger,
        };
        token.create(
            &mut ctx,
            CTypeString::from("Tether USD"),
            CTypeString::from("USDT"),
            CTypeUint8(18),
            u256(0xff),
        );
        token
    }

    fn balances_sum(token: &Token) -> num_bigint::BigUint {
        token
            .balances
            .values()
            .map(CTypeUint256::to_biguint)
            .sum()
    }

    #[test]
    fn create_initializes_all_slots() {
        let mut logger = EventLogger::new();
        let token = created_token(&mut logger);

        assert_eq!(token.get_name(), CTypeString::from("Tether USD"));
        assert_eq!(token.get_symbol(), CTypeString::from("USDT"));
        assert_eq!(token.get_decimals(), CTypeUint8(18));
        assert_eq!(token.get_total_supply(), u256(0xff));
        assert_eq!(token.owner, caddr(0xff));
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xff));
    }

    #[test]
    fn transfer_moves_funds() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };

        let result = token.transfer(&mut ctx, caddr(0xf1), u256(0x10));
        assert_eq!(result, C_BOOL_TRUE);
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xef));
        assert_eq!(token.balance_of(caddr(0xf1)), u256(0x10));
        assert_eq!(balances_sum(&token), token.total_supply.to_biguint());
    }

    #[test]
    fn transfer_from_unknown_caller_fails() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0x10).address(),
            logger: &mut logger,
        };

        let result = token.transfer(&mut ctx, caddr(0xf1), u256(0x10));
        assert_eq!(result, C_BOOL_FALSE);
        assert_eq!(token.balance_of(caddr(0xf1)), u256(0));
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xff));
    }

    #[test]
    fn transfer_to_zero_address_fails() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };

        let result = token.transfer(&mut ctx, CTypeAddress::zero(), u256(0x10));
        assert_eq!(result, C_BOOL_FALSE);
    }

    #[test]
    fn transfer_beyond_balance_fails() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };

        let result = token.transfer(&mut ctx, caddr(0xf1), u256(0x100));
        assert_eq!(result, C_BOOL_FALSE);
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xff));
    }

    #[test]
    fn self_transfer_nets_to_no_change() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };

        let result = token.transfer(&mut ctx, caddr(0xff), u256(0x10));
        assert_eq!(result, C_BOOL_TRUE);
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xff));
    }

    #[test]
    fn mint_requires_owner_and_nonzero_target() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);

        let mut outsider = ContractContext {
            caller: caddr(0x02).address(),
            logger: &mut logger,
        };
        assert_eq!(token.mint(&mut outsider, caddr(0x02), u256(5)), C_BOOL_FALSE);

        let mut owner = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };
        assert_eq!(
            token.mint(&mut owner, CTypeAddress::zero(), u256(5)),
            C_BOOL_FALSE
        );
        assert_eq!(token.mint(&mut owner, caddr(0x02), u256(5)), C_BOOL_TRUE);
        assert_eq!(token.balance_of(caddr(0x02)), u256(5));
        assert_eq!(token.get_total_supply(), u256(0xff + 5));
        assert_eq!(balances_sum(&token), token.total_supply.to_biguint());
    }

    #[test]
    fn burn_requires_owner_and_sufficient_balance() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);

        let mut outsider = ContractContext {
            caller: caddr(0x02).address(),
            logger: &mut logger,
        };
        assert_eq!(token.burn(&mut outsider, caddr(0xff), u256(1)), C_BOOL_FALSE);

        let mut owner = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };
        assert_eq!(token.burn(&mut owner, caddr(0x02), u256(1)), C_BOOL_FALSE);
        assert_eq!(token.burn(&mut owner, caddr(0xff), u256(0x0f)), C_BOOL_TRUE);
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xf0));
        assert_eq!(token.get_total_supply(), u256(0xf0));
        assert_eq!(balances_sum(&token), token.total_supply.to_biguint());
    }

    #[test]
    fn approve_then_transfer_from() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let (a, b, c) = (caddr(0xff), caddr(0x0b), caddr(0x0c));

        // B (with no balance) approves A for 20.
        let mut b_ctx = ContractContext {
            caller: b.address(),
            logger: &mut logger,
        };
        assert_eq!(token.approve(&mut b_ctx, a, u256(20)), C_BOOL_TRUE);
        assert_eq!(token.allowance(b, a), u256(20));

        // A cannot move funds B does not hold.
        let mut a_ctx = ContractContext {
            caller: a.address(),
            logger: &mut logger,
        };
        assert_eq!(token.transfer_from(&mut a_ctx, b, c, u256(10)), C_BOOL_FALSE);
        assert_eq!(token.allowance(b, a), u256(20));

        // Owner mints 100 to B, then the delegated transfer succeeds and
        // consumes exactly the transferred amount of allowance.
        let mut owner_ctx = ContractContext {
            caller: a.address(),
            logger: &mut logger,
        };
        assert_eq!(token.mint(&mut owner_ctx, b, u256(100)), C_BOOL_TRUE);

        let mut a_ctx = ContractContext {
            caller: a.address(),
            logger: &mut logger,
        };
        assert_eq!(token.transfer_from(&mut a_ctx, b, c, u256(10)), C_BOOL_TRUE);
        assert_eq!(token.allowance(b, a), u256(10));
        assert_eq!(token.balance_of(b), u256(90));
        assert_eq!(token.balance_of(c), u256(10));
        assert_eq!(balances_sum(&token), token.total_supply.to_biguint());
    }

    #[test]
    fn transfer_from_without_allowance_fails() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);

        let mut outsider = ContractContext {
            caller: caddr(0x0a).address(),
            logger: &mut logger,
        };
        let result = token.transfer_from(&mut outsider, caddr(0xff), caddr(0x0c), u256(1));
        assert_eq!(result, C_BOOL_FALSE);
        assert_eq!(token.balance_of(caddr(0xff)), u256(0xff));
    }

    #[test]
    fn approve_zero_spender_fails() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };
        assert_eq!(
            token.approve(&mut ctx, CTypeAddress::zero(), u256(1)),
            C_BOOL_FALSE
        );
    }

    #[test]
    fn approve_overwrites_previous_allowance() {
        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };

        token.approve(&mut ctx, caddr(0x05), u256(7));
        token.approve(&mut ctx, caddr(0x05), u256(3));
        assert_eq!(token.allowance(caddr(0xff), caddr(0x05)), u256(3));
    }

    #[test]
    fn allowance_of_zero_addresses_is_zero() {
        let mut logger = EventLogger::new();
        let token = created_token(&mut logger);
        assert_eq!(token.allowance(CTypeAddress::zero(), caddr(1)), u256(0));
        assert_eq!(token.allowance(caddr(1), CTypeAddress::zero()), u256(0));
    }

    #[test]
    fn storage_round_trip_through_state_tree() {
        let mut tree = MemStateTree::new();
        let contract_addr = caddr(0x77).address();

        let mut logger = EventLogger::new();
        let mut token = created_token(&mut logger);
        let mut ctx = ContractContext {
            caller: caddr(0xff).address(),
            logger: &mut logger,
        };
        token.transfer(&mut ctx, caddr(0xf1), u256(0x10));
        token.store(&mut tree, contract_addr).expect("store");

        let reloaded = Token::load(&tree, contract_addr).expect("load");
        assert_eq!(reloaded.get_name(), CTypeString::from("Tether USD"));
        assert_eq!(reloaded.balance_of(caddr(0xf1)), u256(0x10));
        assert_eq!(reloaded.balance_of(caddr(0xff)), u256(0xef));
        assert_eq!(reloaded.get_total_supply(), u256(0xff));
    }

    #[test]
    fn load_from_empty_tree_yields_defaults() {
        let tree = MemStateTree::new();
        let token = Token::load(&tree, caddr(0x01).address()).expect("load");
        assert!(token.get_name().is_empty());
        assert!(token.get_total_supply().is_zero());
        assert!(token.balances.is_empty());
    }
}
