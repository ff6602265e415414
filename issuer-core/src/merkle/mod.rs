//! `merkle` is the sparse merkle tree engine shared by every identity
//!
//! Each identity owns three trees, claims, revocations and roots of roots. All
//! of them are keyed by BN254 field elements and hashed with the circom
//! compatible Poseidon, so the generated proofs can be checked by the same
//! verifiers that read the identity state from the chain.
//!
//! Nodes are content addressed: a node is stored under its own hash, which
//! makes every historical root of a tree readable as long as its nodes are kept.
pub mod hash;
pub use hash::Hash;

mod node;
pub use node::Node;

mod proof;
pub use proof::{generate_proof, NodeAux, Proof};

mod tree;
pub use tree::MerkleTree;

mod memory;
pub use memory::MemoryStorage;

pub mod types;
