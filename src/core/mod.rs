//! Core blockchain data structures and state management:
//! - `Account`: per-address state object (nonce, code, storage slots)
//! - `state`: the [`StateTree`](state::StateTree) interface consumed by the VM
//!   and an in-memory implementation
//! - `Block`/`Header`: minimal block container for event indexing
//! - `processor`: block-scoped transaction driver feeding the VM and the
//!   event index

pub mod account;
pub mod block;
pub mod processor;
pub mod state;
