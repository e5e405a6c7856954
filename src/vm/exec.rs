//! Per-call contract execution.
//!
//! One call runs through a fixed sequence: rehydrate the contract's storage
//! slots from the state tree, resolve the method selector against the
//! declarative method table, decode the typed arguments, invoke the handler,
//! serialize the return value into the result buffer, and (for mutating
//! calls) persist every slot back to the tree. Dispatch and decoding errors
//! abort the call before any state is written.

use crate::core::state::StateTree;
use crate::types::address::Address;
use crate::types::hash::Hash;
use crate::vm::buffer::Buffer;
use crate::vm::contract::{BuiltinContract, ContractContext};
use crate::vm::errors::VmError;
use crate::vm::logger::EventLogger;

/// How the executor treats the call's selector and persistence.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// Constructor invocation: the selector is implicitly zero and the
    /// input carries constructor arguments only.
    Create,
    /// Regular mutating call: input is `selector || args`; slots are
    /// persisted after a successful return.
    Call,
    /// Read-only query: as [`CallKind::Call`] but nothing is persisted and
    /// the result buffer is handed back to the caller.
    Query,
}

/// Executes one call against contract type `C` at `address`.
///
/// `input` carries the post-header payload: `selector || args` for calls
/// and queries, constructor arguments for creates. Returns the raw result
/// buffer.
pub fn run_contract<C: BuiltinContract + 'static>(
    tree: &mut dyn StateTree,
    logger: &mut EventLogger,
    caller: Address,
    address: Address,
    input: &[u8],
    kind: CallKind,
) -> Result<Vec<u8>, VmError> {
    let mut contract = C::load(&*tree, address)?;

    let mut buf = Buffer::new(input);
    let selector = match kind {
        CallKind::Create => Hash::zero(),
        CallKind::Call | CallKind::Query => buf.read_selector()?,
    };

    let descriptor = C::descriptor();
    let method = descriptor
        .method(selector)
        .ok_or(VmError::NotFoundMethod(selector))?;

    let mut args = Vec::with_capacity(method.params.len());
    for param in method.params {
        args.push(buf.read_value(*param)?);
    }

    let mut ctx = ContractContext { caller, logger };
    let returned = (method.handler)(&mut contract, &mut ctx, &args)?;

    let mut result = Vec::new();
    if let Some(value) = returned {
        result.extend_from_slice(&value.to_wire_bytes());
    }

    if kind != CallKind::Query {
        contract.store(tree, address)?;
    }
    Ok(result)
}
