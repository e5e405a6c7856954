//! Built-in contract virtual machine.
//!
//! Executes a fixed catalogue of contracts compiled into the node binary
//! against the account state tree. A call travels through a deterministic
//! pipeline: header validation ([`xvm`]), storage rehydration and typed
//! argument decoding ([`exec`], [`buffer`]), method dispatch through
//! declarative tables ([`contract`]), and event collection ([`logger`])
//! feeding the block-scoped index ([`log_store`]).
//!
//! # Modules
//!
//! - [`values`]: the typed value system (address, uint8, uint256, bool, string)
//! - [`buffer`]: the binary calling convention
//! - [`contract`]: contract declarations and dispatch tables
//! - [`token`] / [`nftoken`]: the built-in contract catalogue
//! - [`abi`]: ABI derivation from the dispatch tables
//! - [`exec`]: the per-call executor
//! - [`xvm`]: the VM facade (create / call / read-only query)
//! - [`logger`] / [`log_store`]: event emission and indexed persistence
//! - [`errors`]: the error taxonomy

pub mod abi;
pub mod buffer;
pub mod contract;
pub mod errors;
pub mod exec;
pub mod log_store;
pub mod logger;
pub mod nftoken;
pub mod token;
pub mod values;
pub mod xvm;
