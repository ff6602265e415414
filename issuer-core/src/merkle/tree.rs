use rst_common::with_logging::log::debug;

use super::proof::generate_proof;
use super::types::{MerkleError, NodeStorage, MAX_LEVELS};
use super::{Hash, Node, Proof};

/// `MerkleTree` is a sparse merkle tree view over a content addressed storage
///
/// The tree itself only owns its current root. Every mutation writes new nodes
/// and moves the root, older roots stay readable from the same storage, which is
/// how snapshots of an identity's trees are taken.
#[derive(Clone)]
pub struct MerkleTree<S>
where
    S: NodeStorage,
{
    storage: S,
    root: Hash,
    max_levels: usize,
}

impl<S> MerkleTree<S>
where
    S: NodeStorage,
{
    pub fn new(storage: S) -> Self {
        Self::with_root(storage, Hash::zero())
    }

    pub fn with_root(storage: S, root: Hash) -> Self {
        Self {
            storage,
            root,
            max_levels: MAX_LEVELS,
        }
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn root(&self) -> Hash {
        self.root
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// `get` returns the value of `key`, if any, with its proof against the current root
    pub async fn get(&self, key: &Hash) -> Result<(Option<Hash>, Proof), MerkleError> {
        let (proof, value) = generate_proof(&self.storage, &self.root, key, self.max_levels).await?;
        Ok((value, proof))
    }

    pub async fn generate_proof(&self, key: &Hash) -> Result<Proof, MerkleError> {
        let (proof, _) = generate_proof(&self.storage, &self.root, key, self.max_levels).await?;
        Ok(proof)
    }

    pub async fn add(&mut self, key: Hash, value: Hash) -> Result<Hash, MerkleError> {
        self.ensure_field_element(&key)?;
        self.ensure_field_element(&value)?;

        let new_leaf = Node::leaf(key, value);
        let mut siblings = Vec::new();
        let mut next = self.root;

        for level in 0..self.max_levels {
            match self.storage.get_node(&next).await? {
                Node::Empty => {
                    let leaf_hash = self.storage.put_node(&new_leaf).await?;
                    return self.rebuild(&key, &siblings, leaf_hash).await;
                }
                Node::Leaf { key: old_key, .. } => {
                    if old_key == key {
                        return Err(MerkleError::EntryIndexAlreadyExists);
                    }

                    return self.push_leaf(&key, &old_key, next, &new_leaf, siblings, level).await;
                }
                Node::Middle { left, right } => {
                    if key.path_bit(level) {
                        siblings.push(left);
                        next = right;
                    } else {
                        siblings.push(right);
                        next = left;
                    }
                }
            }
        }

        Err(MerkleError::ReachedMaxLevel)
    }

    /// `delete` removes `key` and collapses the path so the tree stays canonical,
    /// deleting a key restores the exact root the tree had before adding it
    pub async fn delete(&mut self, key: &Hash) -> Result<Hash, MerkleError> {
        let mut siblings: Vec<Hash> = Vec::new();
        let mut next = self.root;

        for level in 0..self.max_levels {
            match self.storage.get_node(&next).await? {
                Node::Empty => return Err(MerkleError::KeyNotFound),
                Node::Leaf { key: found, .. } => {
                    if found != *key {
                        return Err(MerkleError::KeyNotFound);
                    }

                    return self.remove_leaf(key, siblings).await;
                }
                Node::Middle { left, right } => {
                    if key.path_bit(level) {
                        siblings.push(left);
                        next = right;
                    } else {
                        siblings.push(right);
                        next = left;
                    }
                }
            }
        }

        Err(MerkleError::KeyNotFound)
    }

    /// `changed_nodes` lists every node reachable from the current root that is
    /// not reachable from `since`
    ///
    /// Both trees are walked in parallel and shared subtrees are skipped, so the
    /// output is the minimal set of nodes a remote store needs to serve proofs
    /// against the current root, given it already holds `since`.
    pub async fn changed_nodes(&self, since: &Hash) -> Result<Vec<Node>, MerkleError> {
        let mut changed = Vec::new();
        let mut pending = vec![(self.root, *since)];

        while let Some((current, previous)) = pending.pop() {
            if current == previous || current.is_zero() {
                continue;
            }

            let node = self.storage.get_node(&current).await?;
            if let Node::Middle { left, right } = &node {
                let (old_left, old_right) = match self.storage.get_node(&previous).await? {
                    Node::Middle { left, right } => (left, right),
                    _ => (Hash::zero(), Hash::zero()),
                };

                pending.push((*right, old_right));
                pending.push((*left, old_left));
            }

            changed.push(node);
        }

        debug!(
            "changed nodes since {}: {} nodes, current root: {}",
            since,
            changed.len(),
            self.root
        );

        Ok(changed)
    }

    fn ensure_field_element(&self, value: &Hash) -> Result<(), MerkleError> {
        if !value.is_valid_field_element() {
            return Err(MerkleError::InvalidFieldElement(value.to_hex()));
        }

        Ok(())
    }

    async fn push_leaf(
        &mut self,
        key: &Hash,
        old_key: &Hash,
        old_hash: Hash,
        new_leaf: &Node,
        mut siblings: Vec<Hash>,
        level: usize,
    ) -> Result<Hash, MerkleError> {
        let mut depth = level;
        while depth < self.max_levels && key.path_bit(depth) == old_key.path_bit(depth) {
            siblings.push(Hash::zero());
            depth += 1;
        }

        if depth >= self.max_levels {
            return Err(MerkleError::ReachedMaxLevel);
        }

        let new_hash = self.storage.put_node(new_leaf).await?;
        let middle = if key.path_bit(depth) {
            Node::middle(old_hash, new_hash)
        } else {
            Node::middle(new_hash, old_hash)
        };

        let middle_hash = self.storage.put_node(&middle).await?;
        self.rebuild(key, &siblings, middle_hash).await
    }

    async fn remove_leaf(&mut self, key: &Hash, siblings: Vec<Hash>) -> Result<Hash, MerkleError> {
        let Some(last) = siblings.last().copied() else {
            self.root = Hash::zero();
            return Ok(self.root);
        };

        match self.storage.get_node(&last).await? {
            Node::Leaf { .. } => {
                // the remaining leaf moves up to the deepest non empty sibling
                let upper = siblings[..siblings.len() - 1]
                    .iter()
                    .rposition(|sibling| !sibling.is_zero());

                match upper {
                    Some(idx) => self.rebuild(key, &siblings[..=idx], last).await,
                    None => {
                        self.root = last;
                        Ok(self.root)
                    }
                }
            }
            _ => self.rebuild(key, &siblings, Hash::zero()).await,
        }
    }

    async fn rebuild(&mut self, key: &Hash, siblings: &[Hash], bottom: Hash) -> Result<Hash, MerkleError> {
        let mut current = bottom;
        for level in (0..siblings.len()).rev() {
            let node = if key.path_bit(level) {
                Node::middle(siblings[level], current)
            } else {
                Node::middle(current, siblings[level])
            };

            current = self.storage.put_node(&node).await?;
        }

        self.root = current;
        Ok(current)
    }
}
