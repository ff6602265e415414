use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::identity::state::{compute_state, IdentityState};
use crate::merkle::types::{MerkleError, NodeReader, NodeStorage};
use crate::merkle::{Hash, MerkleTree, Node};

use super::types::{PublisherError, RhsClientBuilder};

/// `RhsNode` is the reverse hash service representation of a node, its hash and
/// the preimage of that hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct RhsNode {
    pub hash: Hash,
    pub children: Vec<Hash>,
}

impl RhsNode {
    pub fn from_node(node: &Node) -> Result<Self, MerkleError> {
        Ok(Self {
            hash: node.key()?,
            children: node.children(),
        })
    }

    /// `from_state` is the node binding a state to the three roots it commits to
    pub fn from_state(state: &IdentityState) -> Self {
        Self {
            hash: state.state,
            children: vec![state.claims_root, state.revocation_root, state.roots_root],
        }
    }

    /// `state_roots` reads `[claims, revocation, roots]` back out of a state node,
    /// checking that they really hash to the node hash
    pub fn state_roots(&self) -> Result<(Hash, Hash, Hash), MerkleError> {
        let [claims, revocation, roots] = self.children.as_slice() else {
            return Err(MerkleError::IntegrityError(format!(
                "state node {} must have three children",
                self.hash
            )));
        };

        let computed = compute_state(claims, revocation, roots)
            .map_err(|err| MerkleError::HashError(err.to_string()))?;

        if computed != self.hash {
            return Err(MerkleError::IntegrityError(format!(
                "state node {} does not match its roots",
                self.hash
            )));
        }

        Ok((*claims, *revocation, *roots))
    }
}

/// `RhsReader` lets the merkle proof generator walk nodes kept by a reverse hash service
pub struct RhsReader<'a, TRhs>
where
    TRhs: RhsClientBuilder,
{
    client: &'a TRhs,
}

impl<'a, TRhs> RhsReader<'a, TRhs>
where
    TRhs: RhsClientBuilder,
{
    pub fn new(client: &'a TRhs) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, TRhs> NodeReader for RhsReader<'a, TRhs>
where
    TRhs: RhsClientBuilder,
{
    async fn get_node(&self, hash: &Hash) -> Result<Node, MerkleError> {
        if hash.is_zero() {
            return Ok(Node::Empty);
        }

        let found = self
            .client
            .get_node(*hash)
            .await
            .map_err(|err| MerkleError::StorageError(err.to_string()))?;

        match found {
            Some(node) => Node::from_children(hash, &node.children),
            None => Err(MerkleError::NodeNotFound(hash.to_hex())),
        }
    }
}

/// `collect_changed_nodes` builds the RHS payload of a state
///
/// It contains the nodes of the three trees that are new since `base`, plus the
/// state node itself. Without a base every node of the state is collected.
pub async fn collect_changed_nodes<S>(
    storage: &S,
    state: &IdentityState,
    base: Option<&IdentityState>,
) -> Result<Vec<RhsNode>, PublisherError>
where
    S: NodeStorage,
{
    let pairs = [
        (state.claims_root, base.map(|b| b.claims_root)),
        (state.revocation_root, base.map(|b| b.revocation_root)),
        (state.roots_root, base.map(|b| b.roots_root)),
    ];

    let mut collected = Vec::new();
    for (root, since) in pairs {
        let tree = MerkleTree::with_root(storage.clone(), root);
        let changed = tree
            .changed_nodes(&since.unwrap_or_else(Hash::zero))
            .await
            .map_err(|err| PublisherError::MerkleError(err.to_string()))?;

        for node in changed {
            let rhs_node =
                RhsNode::from_node(&node).map_err(|err| PublisherError::MerkleError(err.to_string()))?;
            collected.push(rhs_node);
        }
    }

    collected.push(RhsNode::from_state(state));
    Ok(collected)
}
