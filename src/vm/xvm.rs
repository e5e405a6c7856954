//! VM facade: contract code headers, creation, and call routing.
//!
//! Contract code and call input both open with a 3-byte header:
//! `magic (2 bytes little-endian) || contract id (1 byte)`. The facade
//! validates the header, derives addresses for new contracts, and routes
//! the post-header payload to the executor for the contract type the id
//! names. Invalid headers are rejected outright, including on create.

use crate::core::state::StateTree;
use crate::crypto::addresses::create_address;
use crate::types::address::Address;
use crate::types::hash::Hash;
use crate::vm::contract::BuiltinContract;
use crate::vm::errors::VmError;
use crate::vm::exec::{CallKind, run_contract};
use crate::vm::logger::{Event, EventLogger};
use crate::vm::nftoken::NFToken;
use crate::vm::token::Token;

/// Magic constant opening every contract code header.
pub const XVM_MAGIC: u16 = 9168;

/// Header length: magic (2 bytes) + contract id (1 byte).
pub const CODE_HEADER_SIZE: usize = 3;

/// Parses and validates a code header, returning the contract id.
pub fn read_code_header(code: &[u8]) -> Result<u8, VmError> {
    if code.len() < CODE_HEADER_SIZE {
        return Err(VmError::InvalidContractCode);
    }
    let magic = u16::from_le_bytes([code[0], code[1]]);
    if magic != XVM_MAGIC {
        return Err(VmError::UnknownMagicNumber);
    }
    Ok(code[2])
}

/// Builds the 3-byte code header for a contract id.
pub fn code_header(id: u8) -> [u8; CODE_HEADER_SIZE] {
    let magic = XVM_MAGIC.to_le_bytes();
    [magic[0], magic[1], id]
}

/// The contract virtual machine.
///
/// One instance executes against one state tree; its event logger collects
/// everything emitted until the driver drains it. Execution is synchronous
/// and single-threaded from entry to return.
pub struct Xvm<'a> {
    state_tree: &'a mut dyn StateTree,
    logger: EventLogger,
}

impl<'a> Xvm<'a> {
    pub fn new(state_tree: &'a mut dyn StateTree) -> Self {
        Self {
            state_tree,
            logger: EventLogger::new(),
        }
    }

    /// Deploys a new contract.
    ///
    /// The contract address is derived from `sha256(from)` and the
    /// creator's current nonce; the input header is validated, the
    /// constructor runs over `input[3..]`, and on success the code header
    /// is installed at the new address (whose nonce is initialized to 1).
    ///
    /// Returns the new contract address.
    pub fn create(&mut self, from: Address, input: &[u8]) -> Result<Address, VmError> {
        let nonce = self.state_tree.get_nonce(from);
        let from_hash = Hash::sha256_of(from.as_slice());
        let address = create_address(from_hash, nonce);

        let id = read_code_header(input)?;
        self.dispatch(
            id,
            from,
            address,
            &input[CODE_HEADER_SIZE..],
            CallKind::Create,
        )?;
        self.state_tree.add_nonce(address, 1);
        self.state_tree.set_code(address, code_header(id).to_vec());
        Ok(address)
    }

    /// Invokes a method on the contract at `to`.
    ///
    /// A target without installed code is a no-op success. Storage slots
    /// are persisted after the method returns.
    pub fn call(&mut self, from: Address, to: Address, input: &[u8]) -> Result<(), VmError> {
        let Some(code) = self.state_tree.get_code(to) else {
            return Ok(());
        };
        let id = read_code_header(&code)?;
        if input.len() < CODE_HEADER_SIZE {
            return Err(VmError::InvalidContractCode);
        }
        self.dispatch(id, from, to, &input[CODE_HEADER_SIZE..], CallKind::Call)?;
        Ok(())
    }

    /// Invokes a method read-only and returns the raw result buffer.
    ///
    /// Nothing is persisted, so mutating methods can be used as dry-run
    /// queries.
    pub fn call_return(
        &mut self,
        from: Address,
        to: Address,
        input: &[u8],
    ) -> Result<Vec<u8>, VmError> {
        let code = self
            .state_tree
            .get_code(to)
            .ok_or(VmError::InvalidContractCode)?;
        let id = read_code_header(&code)?;
        if input.len() < CODE_HEADER_SIZE {
            return Err(VmError::InvalidContractCode);
        }
        self.dispatch(id, from, to, &input[CODE_HEADER_SIZE..], CallKind::Query)
    }

    /// Routes a validated call to the contract type registered under `id`.
    fn dispatch(
        &mut self,
        id: u8,
        from: Address,
        address: Address,
        payload: &[u8],
        kind: CallKind,
    ) -> Result<Vec<u8>, VmError> {
        match id {
            Token::BUILTIN_ID => run_contract::<Token>(
                &mut *self.state_tree,
                &mut self.logger,
                from,
                address,
                payload,
                kind,
            ),
            NFToken::BUILTIN_ID => run_contract::<NFToken>(
                &mut *self.state_tree,
                &mut self.logger,
                from,
                address,
                payload,
                kind,
            ),
            other => Err(VmError::UnknownContractId(other)),
        }
    }

    /// Returns the events buffered so far, in emission order.
    pub fn events(&self) -> &[Event] {
        self.logger.events()
    }

    /// Drains the buffered events for indexing.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.logger.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::MemStateTree;
    use crate::vm::buffer::Buffer;
    use crate::vm::values::{CTypeAddress, CTypeString, CTypeUint8, CTypeUint256};

    fn addr(seed: u8) -> Address {
        let mut bytes = [0u8; crate::types::address::ADDRESS_SIZE];
        bytes[0] = seed;
        Address(bytes)
    }

    fn token_create_input() -> Vec<u8> {
        let mut buf = Buffer::empty();
        buf.write_bytes(&code_header(Token::BUILTIN_ID));
        buf.write_string(&CTypeString::from("Tether USD"));
        buf.write_string(&CTypeString::from("USDT"));
        buf.write_uint8(CTypeUint8(18));
        buf.write_uint256(&CTypeUint256::from_u64(0xff));
        buf.into_bytes()
    }

    fn call_input(id: u8, method: &str, write_args: impl FnOnce(&mut Buffer)) -> Vec<u8> {
        let mut buf = Buffer::empty();
        buf.write_bytes(&code_header(id));
        buf.write_bytes(Hash::sha256_of(method.as_bytes()).as_slice());
        write_args(&mut buf);
        buf.into_bytes()
    }

    #[test]
    fn header_round_trip() {
        let header = code_header(0x01);
        assert_eq!(header.len(), CODE_HEADER_SIZE);
        assert_eq!(read_code_header(&header).expect("parse"), 0x01);
    }

    #[test]
    fn header_rejects_bad_magic_and_short_code() {
        assert!(matches!(
            read_code_header(&[0x00, 0x00, 0x01]),
            Err(VmError::UnknownMagicNumber)
        ));
        assert!(matches!(
            read_code_header(&[0xd0]),
            Err(VmError::InvalidContractCode)
        ));
    }

    #[test]
    fn create_installs_code_and_runs_constructor() {
        let mut tree = MemStateTree::new();
        let creator = addr(0xff);

        let mut vm = Xvm::new(&mut tree);
        let contract = vm.create(creator, &token_create_input()).expect("create");

        let owner_raw = vm
            .call_return(
                addr(0x01),
                contract,
                &call_input(Token::BUILTIN_ID, "BalanceOf", |buf| {
                    buf.write_address(&CTypeAddress(creator));
                }),
            )
            .expect("query");
        assert_eq!(owner_raw, CTypeUint256::from_u64(0xff).0.to_vec());
        drop(vm);

        assert_eq!(
            tree.get_code(contract),
            Some(code_header(Token::BUILTIN_ID).to_vec())
        );
        assert_eq!(tree.get_nonce(contract), 1);
    }

    #[test]
    fn create_address_depends_on_creator_nonce() {
        let mut tree = MemStateTree::new();
        let creator = addr(0xff);

        let first = Xvm::new(&mut tree)
            .create(creator, &token_create_input())
            .expect("create");
        tree.add_nonce(creator, 1);
        let second = Xvm::new(&mut tree)
            .create(creator, &token_create_input())
            .expect("create");

        assert_ne!(first, second);

        let expected = create_address(Hash::sha256_of(creator.as_slice()), 0);
        assert_eq!(first, expected);
    }

    #[test]
    fn create_rejects_invalid_header() {
        let mut tree = MemStateTree::new();
        let mut vm = Xvm::new(&mut tree);

        let result = vm.create(addr(0xff), &[0x00, 0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(VmError::UnknownMagicNumber)));

        let result = vm.create(addr(0xff), &[0xd0]);
        assert!(matches!(result, Err(VmError::InvalidContractCode)));
    }

    #[test]
    fn create_rejects_unknown_contract_id() {
        let mut tree = MemStateTree::new();
        let mut vm = Xvm::new(&mut tree);

        let mut input = code_header(0x7f).to_vec();
        input.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            vm.create(addr(0xff), &input),
            Err(VmError::UnknownContractId(0x7f))
        ));
    }

    #[test]
    fn call_to_codeless_address_is_noop_success() {
        let mut tree = MemStateTree::new();
        let mut vm = Xvm::new(&mut tree);

        vm.call(
            addr(0x01),
            addr(0x02),
            &call_input(Token::BUILTIN_ID, "Transfer", |_| {}),
        )
        .expect("no-op");
    }

    #[test]
    fn call_transfers_funds_end_to_end() {
        let mut tree = MemStateTree::new();
        let creator = addr(0xff);

        let mut vm = Xvm::new(&mut tree);
        let contract = vm.create(creator, &token_create_input()).expect("create");

        vm.call(
            creator,
            contract,
            &call_input(Token::BUILTIN_ID, "Transfer", |buf| {
                buf.write_address(&CTypeAddress(addr(0xf1)));
                buf.write_uint256(&CTypeUint256::from_u64(0x10));
            }),
        )
        .expect("transfer");

        let balance = |vm: &mut Xvm<'_>, holder: Address| {
            vm.call_return(
                addr(0x01),
                contract,
                &call_input(Token::BUILTIN_ID, "BalanceOf", |buf| {
                    buf.write_address(&CTypeAddress(holder));
                }),
            )
            .expect("query")
        };

        assert_eq!(balance(&mut vm, creator), CTypeUint256::from_u64(0xef).0.to_vec());
        assert_eq!(balance(&mut vm, addr(0xf1)), CTypeUint256::from_u64(0x10).0.to_vec());
    }

    #[test]
    fn call_return_does_not_persist() {
        let mut tree = MemStateTree::new();
        let creator = addr(0xff);

        let mut vm = Xvm::new(&mut tree);
        let contract = vm.create(creator, &token_create_input()).expect("create");

        // Dry-run a transfer, then confirm the balance is unchanged.
        let result = vm
            .call_return(
                creator,
                contract,
                &call_input(Token::BUILTIN_ID, "Transfer", |buf| {
                    buf.write_address(&CTypeAddress(addr(0xf1)));
                    buf.write_uint256(&CTypeUint256::from_u64(0x10));
                }),
            )
            .expect("dry run");
        assert_eq!(result, vec![1]);

        let balance = vm
            .call_return(
                addr(0x01),
                contract,
                &call_input(Token::BUILTIN_ID, "BalanceOf", |buf| {
                    buf.write_address(&CTypeAddress(creator));
                }),
            )
            .expect("query");
        assert_eq!(balance, CTypeUint256::from_u64(0xff).0.to_vec());
    }

    #[test]
    fn call_return_renders_string_returns_raw() {
        let mut tree = MemStateTree::new();
        let mut vm = Xvm::new(&mut tree);
        let contract = vm.create(addr(0xff), &token_create_input()).expect("create");

        let name = vm
            .call_return(
                addr(0x01),
                contract,
                &call_input(Token::BUILTIN_ID, "GetName", |_| {}),
            )
            .expect("query");
        assert_eq!(name, b"Tether USD".to_vec());
    }

    #[test]
    fn call_return_on_codeless_address_errors() {
        let mut tree = MemStateTree::new();
        let mut vm = Xvm::new(&mut tree);
        let result = vm.call_return(
            addr(0x01),
            addr(0x02),
            &call_input(Token::BUILTIN_ID, "GetName", |_| {}),
        );
        assert!(matches!(result, Err(VmError::InvalidContractCode)));
    }

    #[test]
    fn nft_lifecycle_end_to_end() {
        let mut tree = MemStateTree::new();
        let creator = addr(0xff);
        let (a, b, c) = (addr(0x0a), addr(0x0b), addr(0x0c));

        let mut create_buf = Buffer::empty();
        create_buf.write_bytes(&code_header(NFToken::BUILTIN_ID));
        create_buf.write_string(&CTypeString::from("ACollection"));
        create_buf.write_string(&CTypeString::from("AC"));

        let mut vm = Xvm::new(&mut tree);
        let contract = vm
            .create(creator, &create_buf.into_bytes())
            .expect("create");

        // Non-creator mint yields the zero sentinel id.
        let minted = vm
            .call_return(
                a,
                contract,
                &call_input(NFToken::BUILTIN_ID, "Mint", |buf| {
                    buf.write_address(&CTypeAddress(a));
                    buf.write_string(&CTypeString::from("uri"));
                }),
            )
            .expect("query");
        assert_eq!(minted, CTypeUint256::zero().0.to_vec());

        // Creator mints token 1 to B.
        vm.call(
            creator,
            contract,
            &call_input(NFToken::BUILTIN_ID, "Mint", |buf| {
                buf.write_address(&CTypeAddress(b));
                buf.write_string(&CTypeString::from("uri"));
            }),
        )
        .expect("mint");

        let owner = vm
            .call_return(
                a,
                contract,
                &call_input(NFToken::BUILTIN_ID, "OwnerOf", |buf| {
                    buf.write_uint256(&CTypeUint256::from_u64(1));
                }),
            )
            .expect("query");
        assert_eq!(owner, b.as_slice().to_vec());

        // B approves A, A moves the token to C.
        vm.call(
            b,
            contract,
            &call_input(NFToken::BUILTIN_ID, "Approve", |buf| {
                buf.write_address(&CTypeAddress(a));
                buf.write_uint256(&CTypeUint256::from_u64(1));
            }),
        )
        .expect("approve");
        vm.call(
            a,
            contract,
            &call_input(NFToken::BUILTIN_ID, "TransferFrom", |buf| {
                buf.write_address(&CTypeAddress(b));
                buf.write_address(&CTypeAddress(c));
                buf.write_uint256(&CTypeUint256::from_u64(1));
            }),
        )
        .expect("transfer");

        let owner = vm
            .call_return(
                a,
                contract,
                &call_input(NFToken::BUILTIN_ID, "OwnerOf", |buf| {
                    buf.write_uint256(&CTypeUint256::from_u64(1));
                }),
            )
            .expect("query");
        assert_eq!(owner, c.as_slice().to_vec());

        // The mint event is buffered on the VM instance.
        assert_eq!(vm.events().len(), 1);
    }
}
