//! Built-in contract declarations.
//!
//! Each built-in contract registers a declarative descriptor at
//! initialization: its id, its method table (name, parameter types, return
//! type, handler), and its event set. The executor routes calls through the
//! method table and the ABI deriver reads the same table, so the dispatch
//! surface and the exported ABI cannot drift apart.

use crate::core::state::StateTree;
use crate::types::address::Address;
use crate::types::hash::Hash;
use crate::vm::errors::VmError;
use crate::vm::logger::EventLogger;
use crate::vm::values::{CValue, ParamType};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Name of the constructor method. Its selector is the zero hash.
pub const CREATE_METHOD: &str = "Create";

/// Execution context passed implicitly to every built-in method.
///
/// Not encoded on the wire; the executor injects it from the call
/// environment.
pub struct ContractContext<'a> {
    /// Address that initiated the call.
    pub caller: Address,
    /// Event buffer for the enclosing VM instance.
    pub logger: &'a mut EventLogger,
}

/// Handler invoked with type-checked arguments matching the method's
/// declared parameter list. `None` means the method returns nothing
/// (constructors).
pub type MethodHandler<C> =
    fn(&mut C, &mut ContractContext<'_>, &[CValue]) -> Result<Option<CValue>, VmError>;

/// One entry of a contract's method table.
pub struct MethodDesc<C> {
    pub name: &'static str,
    pub params: &'static [ParamType],
    /// Declared return type; `None` for the constructor.
    pub returns: Option<ParamType>,
    pub handler: MethodHandler<C>,
}

impl<C> MethodDesc<C> {
    /// Returns the dispatch selector: `sha256(name)`, or the zero hash for
    /// the constructor.
    pub fn selector(&self) -> Hash {
        if self.name == CREATE_METHOD {
            Hash::zero()
        } else {
            Hash::sha256_of(self.name.as_bytes())
        }
    }
}

/// One entry of a contract's event set.
pub struct EventDesc {
    pub name: &'static str,
    /// Named, typed payload fields in declaration order.
    pub params: &'static [(&'static str, ParamType)],
}

impl EventDesc {
    /// Returns the event selector: `sha256(name)`.
    pub fn selector(&self) -> Hash {
        Hash::sha256_of(self.name.as_bytes())
    }
}

/// Declarative registration record for one built-in contract.
pub struct ContractDescriptor<C: 'static> {
    /// Catalogue id carried in the contract code header.
    pub id: u8,
    pub methods: &'static [MethodDesc<C>],
    pub events: &'static [EventDesc],
}

impl<C> ContractDescriptor<C> {
    /// Finds the method matching a dispatch selector.
    pub fn method(&self, selector: Hash) -> Option<&MethodDesc<C>> {
        self.methods.iter().find(|m| m.selector() == selector)
    }
}

/// A contract compiled into the node binary.
///
/// Implementations declare their storage layout through `load`/`store`:
/// each named slot is rehydrated from (and persisted to) the state tree
/// under the SHA-256 hash of its name.
pub trait BuiltinContract: Default {
    /// Catalogue id carried in the contract code header.
    const BUILTIN_ID: u8;

    /// The contract's declarative method/event tables.
    fn descriptor() -> &'static ContractDescriptor<Self>
    where
        Self: Sized;

    /// Rehydrates all declared slots from the state tree. Absent slots keep
    /// their zero-typed defaults; a slot that fails to decode aborts the
    /// call.
    fn load(tree: &dyn StateTree, address: Address) -> Result<Self, VmError>
    where
        Self: Sized;

    /// Persists all declared slots to the state tree. Writes every slot
    /// unconditionally; each write is a complete value replacement, so
    /// unchanged slots are idempotent.
    fn store(&self, tree: &mut dyn StateTree, address: Address) -> Result<(), VmError>;
}

/// Reads one named storage slot, decoding its JSON form into the declared
/// type. Absent slots yield the type's zero default.
pub fn read_slot<T>(tree: &dyn StateTree, address: Address, name: &str) -> Result<T, VmError>
where
    T: Default + DeserializeOwned,
{
    let key = Hash::sha256_of(name.as_bytes());
    match tree.get_state_value(address, key) {
        None => Ok(T::default()),
        Some(raw) => Ok(serde_json::from_slice(&raw)?),
    }
}

/// JSON-encodes and writes one named storage slot.
pub fn write_slot<T: Serialize>(
    tree: &mut dyn StateTree,
    address: Address,
    name: &str,
    value: &T,
) -> Result<(), VmError> {
    let key = Hash::sha256_of(name.as_bytes());
    let raw = serde_json::to_vec(value)?;
    tree.set_state(address, key, raw);
    Ok(())
}
