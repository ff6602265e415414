use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::merkle::types::{MerkleError, NodeStorage};
use crate::merkle::{Hash, MerkleTree};

use super::compute_state;
use super::types::IdentityError;

/// `Identity` is the issuer identity, it keeps the current roots of the three
/// identity trees, the tree nodes themselves live in the node storage
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Identity {
    pub(crate) id: String,
    pub(crate) did: String,

    #[serde(rename = "claimsRoot")]
    pub(crate) claims_root: Hash,

    #[serde(rename = "revocationRoot")]
    pub(crate) revocation_root: Hash,

    #[serde(rename = "rootsRoot")]
    pub(crate) roots_root: Hash,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(did: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            did,
            claims_root: Hash::zero(),
            revocation_root: Hash::zero(),
            roots_root: Hash::zero(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn compute_state(&self) -> Result<Hash, IdentityError> {
        compute_state(&self.claims_root, &self.revocation_root, &self.roots_root)
    }

    pub fn get_id(&self) -> String {
        self.id.to_owned()
    }

    pub fn get_did(&self) -> String {
        self.did.to_owned()
    }

    pub fn get_claims_root(&self) -> Hash {
        self.claims_root
    }

    pub fn get_revocation_root(&self) -> Hash {
        self.revocation_root
    }

    pub fn get_roots_root(&self) -> Hash {
        self.roots_root
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl ToJSON for Identity {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

impl TryInto<Vec<u8>> for Identity {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::EntityError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Identity {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::EntityError(err.to_string()))
    }
}

/// `IdentityTrees` opens the three trees of an identity at its current roots
pub struct IdentityTrees<S>
where
    S: NodeStorage,
{
    pub claims: MerkleTree<S>,
    pub revocations: MerkleTree<S>,
    pub roots: MerkleTree<S>,
}

impl<S> IdentityTrees<S>
where
    S: NodeStorage,
{
    pub fn load(identity: &Identity, storage: S) -> Self {
        Self {
            claims: MerkleTree::with_root(storage.clone(), identity.claims_root),
            revocations: MerkleTree::with_root(storage.clone(), identity.revocation_root),
            roots: MerkleTree::with_root(storage, identity.roots_root),
        }
    }

    /// `add_claims_root` commits the current claims root into the roots tree, a
    /// root already committed leaves the tree untouched
    pub async fn add_claims_root(&mut self) -> Result<Hash, MerkleError> {
        let claims_root = self.claims.root();
        match self.roots.add(claims_root, Hash::zero()).await {
            Ok(root) => Ok(root),
            Err(MerkleError::EntryIndexAlreadyExists) => Ok(self.roots.root()),
            Err(err) => Err(err),
        }
    }

    /// `apply` moves the identity roots to the current roots of the trees
    pub fn apply(&self, identity: &mut Identity) {
        identity.claims_root = self.claims.root();
        identity.revocation_root = self.revocations.root();
        identity.roots_root = self.roots.root();
        identity.updated_at = Utc::now();
    }
}
