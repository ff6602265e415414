use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::hash::{hash_leaf, hash_middle};
use super::types::MerkleError;
use super::Hash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Empty,
    Leaf { key: Hash, value: Hash },
    Middle { left: Hash, right: Hash },
}

impl Node {
    pub fn leaf(key: Hash, value: Hash) -> Self {
        Node::Leaf { key, value }
    }

    pub fn middle(left: Hash, right: Hash) -> Self {
        Node::Middle { left, right }
    }

    /// `key` is the content address of the node
    pub fn key(&self) -> Result<Hash, MerkleError> {
        match self {
            Node::Empty => Ok(Hash::zero()),
            Node::Leaf { key, value } => hash_leaf(key, value),
            Node::Middle { left, right } => hash_middle(left, right),
        }
    }

    /// `children` lists the hashes a remote node store keeps for this node
    ///
    /// A leaf is stored as `[key, value, 1]` and a middle node as `[left, right]`,
    /// which are exactly the Poseidon inputs of the node hash
    pub fn children(&self) -> Vec<Hash> {
        match self {
            Node::Empty => vec![],
            Node::Leaf { key, value } => vec![*key, *value, Hash::from_u64(1)],
            Node::Middle { left, right } => vec![*left, *right],
        }
    }

    /// `from_children` rebuilds a node from its stored children and checks that
    /// they really hash to the expected address
    pub fn from_children(hash: &Hash, children: &[Hash]) -> Result<Self, MerkleError> {
        let node = match children {
            [] => Node::Empty,
            [left, right] => Node::middle(*left, *right),
            [key, value, marker] if *marker == Hash::from_u64(1) => Node::leaf(*key, *value),
            _ => {
                return Err(MerkleError::IntegrityError(format!(
                    "unexpected children layout for node {}",
                    hash
                )))
            }
        };

        if node.key()? != *hash {
            return Err(MerkleError::IntegrityError(format!(
                "node content does not match its hash: {}",
                hash
            )));
        }

        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_roundtrip() {
        let leaf = Node::leaf(Hash::from_u64(3), Hash::from_u64(4));
        let hash = leaf.key().unwrap();
        let rebuilt = Node::from_children(&hash, &leaf.children());
        assert!(!rebuilt.is_err());
        assert_eq!(rebuilt.unwrap(), leaf)
    }

    #[test]
    fn test_from_children_detects_tampering() {
        let middle = Node::middle(Hash::from_u64(3), Hash::from_u64(4));
        let hash = middle.key().unwrap();

        let tampered = Node::from_children(&hash, &[Hash::from_u64(4), Hash::from_u64(3)]);
        assert!(matches!(tampered, Err(MerkleError::IntegrityError(_))));

        let malformed = Node::from_children(&hash, &[Hash::from_u64(4)]);
        assert!(matches!(malformed, Err(MerkleError::IntegrityError(_))))
    }

    #[test]
    fn test_empty_key_is_zero() {
        assert!(Node::Empty.key().unwrap().is_zero())
    }
}
