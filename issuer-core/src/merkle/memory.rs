use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rst_common::standard::async_trait::async_trait;

use super::types::{MerkleError, NodeReader, NodeStorage};
use super::{Hash, Node};

/// `MemoryStorage` keeps nodes in a shared map, clones share the same nodes
#[derive(Clone, Default)]
pub struct MemoryStorage {
    nodes: Arc<RwLock<HashMap<Hash, Node>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().map(|nodes| nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NodeReader for MemoryStorage {
    async fn get_node(&self, hash: &Hash) -> Result<Node, MerkleError> {
        if hash.is_zero() {
            return Ok(Node::Empty);
        }

        let nodes = self
            .nodes
            .read()
            .map_err(|err| MerkleError::StorageError(err.to_string()))?;

        nodes
            .get(hash)
            .cloned()
            .ok_or_else(|| MerkleError::NodeNotFound(hash.to_hex()))
    }
}

#[async_trait]
impl NodeStorage for MemoryStorage {
    async fn put_node(&self, node: &Node) -> Result<Hash, MerkleError> {
        let hash = node.key()?;
        if matches!(node, Node::Empty) {
            return Ok(hash);
        }

        let mut nodes = self
            .nodes
            .write()
            .map_err(|err| MerkleError::StorageError(err.to_string()))?;

        nodes.entry(hash).or_insert_with(|| node.clone());
        Ok(hash)
    }
}
