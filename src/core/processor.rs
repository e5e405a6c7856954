//! Block-scoped transaction driver.
//!
//! Applies a block's contract calls sequentially against the state tree,
//! buffers each transaction's events in the log storage, and commits the
//! block's event index in a single batch. A call that fails is skipped with
//! a warning; the sender nonce advances either way so later transactions
//! keep their positions.

use crate::core::block::Block;
use crate::core::state::StateTree;
use crate::storage::kv::{KvError, KvStorage};
use crate::types::address::Address;
use crate::types::hash::Hash;
use crate::vm::log_store::LogStorage;
use crate::vm::xvm::Xvm;
use crate::{info, warn};

/// One contract-touching transaction scheduled in a block.
///
/// A zero `to` address deploys a new contract from `input`; otherwise
/// `input` is a method call on the contract at `to`.
#[derive(Clone, Debug)]
pub struct CallTask {
    pub tx_hash: Hash,
    pub from: Address,
    pub to: Address,
    pub input: Vec<u8>,
}

impl CallTask {
    pub fn is_create(&self) -> bool {
        self.to.is_zero()
    }
}

/// Executes `tasks` for `block` and commits their events.
///
/// Each task runs on a fresh VM instance; its buffered events are stamped
/// with the target contract address and cached under the transaction hash.
/// After all tasks, the block's events are written in one batch.
pub fn apply_block<S: KvStorage>(
    tree: &mut dyn StateTree,
    log_store: &LogStorage<S>,
    block: &Block,
    tasks: &[CallTask],
) -> Result<(), KvError> {
    for task in tasks {
        let mut vm = Xvm::new(tree);
        let outcome = if task.is_create() {
            vm.create(task.from, &task.input)
        } else {
            vm.call(task.from, task.to, &task.input).map(|()| task.to)
        };

        let events = vm.take_events();
        drop(vm);
        tree.add_nonce(task.from, 1);

        match outcome {
            Ok(target) => {
                if !events.is_empty() {
                    log_store.put_all_events(task.tx_hash, target, events);
                }
            }
            Err(err) => {
                warn!("tx {} failed: {}", task.tx_hash, err);
            }
        }
    }

    log_store.save_events(block)?;
    info!(
        "applied block {} ({} transactions)",
        block.height(),
        tasks.len()
    );
    Ok(())
}
