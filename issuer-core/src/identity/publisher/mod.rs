//! `publisher` anchors identity states on chain
//!
//! Only a single transaction per identity may be in flight. A publish computes
//! the new state, records it, optionally pushes the changed tree nodes to a
//! reverse hash service and finally submits it to the chain. The chain outcome is
//! applied later through the confirmation methods, usually driven by a watcher.
mod transaction;
pub use transaction::TransactionRecord;

mod rhs;
pub use rhs::{collect_changed_nodes, RhsNode, RhsReader};

mod usecase;
pub use usecase::{Usecase, DEFAULT_SUBMISSION_TIMEOUT_SECS};

pub mod types;
