use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::merkle::Hash;

use super::{Identity, IdentityState};

/// `IdentityError` provides all specific error types relate with the identity
/// and its trees management
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum IdentityError {
    #[error("identity not found: {0}")]
    IdentityNotFound(String),

    #[error("identity already exists: {0}")]
    IdentityAlreadyExists(String),

    #[error("identity state not found: {0}")]
    StateNotFound(String),

    #[error("claim already exists")]
    ClaimAlreadyExists,

    #[error("revocation nonce already revoked: {0}")]
    AlreadyRevoked(u64),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("merkle error: {0}")]
    MerkleError(String),

    #[error("entity error: {0}")]
    EntityError(String),

    #[error("repo error: {0}")]
    RepoError(String),
}

/// `StateStatus` is the lifecycle of an [`IdentityState`]
///
/// A state starts as [`StateStatus::Created`] when it is computed locally, moves to
/// [`StateStatus::PendingPublish`] once submitted to the chain, and ends either
/// [`StateStatus::Published`] or [`StateStatus::Failed`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub enum StateStatus {
    Created,
    PendingPublish,
    Published,
    Failed,
}

/// `IdentityAPI` is the identity domain entrypoint
///
/// Every tree mutation happens while holding the identity's write lock, reads
/// never wait for it since they work on an immutable root snapshot.
#[async_trait]
pub trait IdentityAPI: Clone + Send + Sync {
    /// `create_identity` creates the identity with empty trees, its genesis state
    /// is stored as already published
    async fn create_identity(&self, did: String) -> Result<IdentityState, IdentityError>;

    async fn get_identity(&self, did: String) -> Result<Identity, IdentityError>;

    /// `compute_state` combines the current roots of the identity trees
    async fn compute_state(&self, did: String) -> Result<Hash, IdentityError>;

    /// `has_pending_changes` is `true` when the computed state differs from the
    /// latest published state
    async fn has_pending_changes(&self, did: String) -> Result<bool, IdentityError>;

    /// `add_claim` adds a claim into the claims tree and returns the new claims root
    async fn add_claim(&self, did: String, index: Hash, value: Hash) -> Result<Hash, IdentityError>;

    /// `add_root_to_roots` commits the current claims root into the roots tree and
    /// returns the new roots root
    async fn add_root_to_roots(&self, did: String) -> Result<Hash, IdentityError>;

    /// `revoke_nonce` adds the nonce into the revocation tree, a nonce is never
    /// removed once revoked
    async fn revoke_nonce(&self, did: String, nonce: u64) -> Result<Hash, IdentityError>;
}

#[async_trait]
pub trait RepoBuilder: Clone + Send + Sync {
    async fn save_identity(&self, identity: &Identity) -> Result<(), IdentityError>;
    async fn get_identity(&self, did: String) -> Result<Identity, IdentityError>;

    async fn save_state(&self, state: &IdentityState) -> Result<(), IdentityError>;
    async fn get_state(&self, id: String) -> Result<IdentityState, IdentityError>;

    /// `list_states` must return the identity states ordered newest first
    async fn list_states(&self, did: String) -> Result<Vec<IdentityState>, IdentityError>;
}
