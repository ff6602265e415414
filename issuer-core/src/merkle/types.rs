use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use super::{Hash, Node};

/// Maximum depth of every identity tree
pub const MAX_LEVELS: usize = 40;

/// `MerkleError` contains all possible failures of the sparse merkle tree engine
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum MerkleError {
    #[error("entry index already exists")]
    EntryIndexAlreadyExists,

    #[error("key not found")]
    KeyNotFound,

    #[error("reached maximum level of the tree")]
    ReachedMaxLevel,

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("hash error: {0}")]
    HashError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("integrity error: {0}")]
    IntegrityError(String),
}

/// `NodeReader` resolves node hashes into nodes
///
/// The zero hash must always resolve to [`Node::Empty`], any other unknown hash
/// must fail with [`MerkleError::NodeNotFound`]. Proof generation only needs this
/// trait so it can run against the local storage or a remote node store.
#[async_trait]
pub trait NodeReader: Send + Sync {
    async fn get_node(&self, hash: &Hash) -> Result<Node, MerkleError>;
}

/// `NodeStorage` is a content addressed node store, nodes are never overwritten
/// since a node hash fully determines its content
#[async_trait]
pub trait NodeStorage: NodeReader + Clone {
    async fn put_node(&self, node: &Node) -> Result<Hash, MerkleError>;
}
