use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::hash::{hash_leaf, hash_middle};
use super::types::{MerkleError, NodeReader};
use super::{Hash, Node};

/// `NodeAux` is the leaf found at the end of a non existence path, a verifier
/// uses it to confirm that the path really diverges from the requested key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct NodeAux {
    pub key: Hash,
    pub value: Hash,
}

/// `Proof` is a membership or non membership proof of a key
///
/// `siblings[i]` is the hash of the child not taken at depth `i`. The same proof
/// format is used by the revocation status resolver and by remote verifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Proof {
    pub existence: bool,
    pub siblings: Vec<Hash>,

    #[serde(rename = "nodeAux")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_aux: Option<NodeAux>,
}

impl Proof {
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// `root_from_proof` folds the siblings back up to the root
    ///
    /// For an existence proof `value` is the value of `key`, for a non existence
    /// proof it is ignored.
    pub fn root_from_proof(&self, key: &Hash, value: &Hash) -> Result<Hash, MerkleError> {
        let mut current = if self.existence {
            hash_leaf(key, value)?
        } else {
            match &self.node_aux {
                Some(aux) => {
                    if aux.key == *key {
                        return Err(MerkleError::IntegrityError(
                            "non existence proof carries the requested key".to_string(),
                        ));
                    }

                    hash_leaf(&aux.key, &aux.value)?
                }
                None => Hash::zero(),
            }
        };

        for level in (0..self.siblings.len()).rev() {
            let sibling = &self.siblings[level];
            current = if key.path_bit(level) {
                hash_middle(sibling, &current)?
            } else {
                hash_middle(&current, sibling)?
            };
        }

        Ok(current)
    }

    pub fn verify(&self, root: &Hash, key: &Hash, value: &Hash) -> bool {
        match self.root_from_proof(key, value) {
            Ok(computed) => computed == *root,
            Err(_) => false,
        }
    }
}

/// `generate_proof` walks `root` down to the position of `key`
///
/// It returns the proof and, when the key exists, its value. Any [`NodeReader`]
/// works here, so proofs can be built against a historical root or a remote
/// node store.
pub async fn generate_proof<R>(
    reader: &R,
    root: &Hash,
    key: &Hash,
    max_levels: usize,
) -> Result<(Proof, Option<Hash>), MerkleError>
where
    R: NodeReader + ?Sized,
{
    let mut siblings = Vec::new();
    let mut next = *root;

    for level in 0..max_levels {
        match reader.get_node(&next).await? {
            Node::Empty => {
                let proof = Proof {
                    existence: false,
                    siblings,
                    node_aux: None,
                };

                return Ok((proof, None));
            }
            Node::Leaf {
                key: leaf_key,
                value,
            } => {
                if leaf_key == *key {
                    let proof = Proof {
                        existence: true,
                        siblings,
                        node_aux: None,
                    };

                    return Ok((proof, Some(value)));
                }

                let proof = Proof {
                    existence: false,
                    siblings,
                    node_aux: Some(NodeAux {
                        key: leaf_key,
                        value,
                    }),
                };

                return Ok((proof, None));
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
