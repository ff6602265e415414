use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::verifiable::credential::Credential;
use crate::merkle::{Hash, Proof};

use super::{StatusDescriptor, StatusKind};

#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum StatusError {
    #[error("credential status resolution error: {0}")]
    CredentialStatusResolutionError(String),

    #[error("integrity error: {0}")]
    IntegrityError(String),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("state not found: {0}")]
    StateNotFound(String),

    #[error("identity error: {0}")]
    IdentityError(String),

    #[error("merkle error: {0}")]
    MerkleError(String),
}

/// `IssuerStateInfo` is the identity state a revocation proof is anchored to
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct IssuerStateInfo {
    pub state: Hash,

    #[serde(rename = "claimsTreeRoot")]
    pub claims_tree_root: Hash,

    #[serde(rename = "revocationTreeRoot")]
    pub revocation_tree_root: Hash,

    #[serde(rename = "rootOfRoots")]
    pub root_of_roots: Hash,
}

/// `RevocationStatus` is what a verifier receives for a revocation nonce
///
/// An existence proof inside [`RevocationStatus::Proof`] means the nonce is revoked
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(tag = "kind")]
pub enum RevocationStatus {
    Proof {
        issuer: IssuerStateInfo,
        mtp: Proof,
    },
    OnChain {
        #[serde(rename = "contractAddress")]
        contract_address: String,

        #[serde(rename = "chainID")]
        chain_id: u64,

        state: Option<Hash>,

        #[serde(rename = "revocationNonce")]
        revocation_nonce: u64,
    },
    Disabled,
}

impl RevocationStatus {
    /// `is_revoked` is only known for proof based statuses
    pub fn is_revoked(&self) -> Option<bool> {
        match self {
            RevocationStatus::Proof { mtp, .. } => Some(mtp.existence),
            _ => None,
        }
    }
}

#[async_trait]
pub trait ResolverAPI: Clone + Send + Sync {
    fn kind(&self) -> StatusKind;

    /// `build_descriptor` is the `credentialStatus` of a credential issued now
    fn build_descriptor(&self, did: String, nonce: u64) -> Option<StatusDescriptor>;

    async fn resolve(&self, credential: &Credential) -> Result<RevocationStatus, StatusError>;

    async fn resolve_nonce(&self, did: String, nonce: u64)
        -> Result<RevocationStatus, StatusError>;
}
