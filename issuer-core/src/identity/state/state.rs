use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::merkle::hash::hash_elems;
use crate::merkle::Hash;

use super::types::{IdentityError, StateStatus};
use super::Identity;

/// `compute_state` is the identity state hash, `Poseidon(claims, revocation, roots)`
pub fn compute_state(
    claims_root: &Hash,
    revocation_root: &Hash,
    roots_root: &Hash,
) -> Result<Hash, IdentityError> {
    hash_elems(&[*claims_root, *revocation_root, *roots_root])
        .map_err(|err| IdentityError::MerkleError(err.to_string()))
}

/// `IdentityState` is an immutable snapshot of the identity roots together with
/// its publishing status
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct IdentityState {
    pub(crate) id: String,
    pub(crate) did: String,
    pub(crate) state: Hash,

    #[serde(rename = "claimsRoot")]
    pub(crate) claims_root: Hash,

    #[serde(rename = "revocationRoot")]
    pub(crate) revocation_root: Hash,

    #[serde(rename = "rootsRoot")]
    pub(crate) roots_root: Hash,

    #[serde(rename = "previousState")]
    pub(crate) previous_state: Option<Hash>,

    pub(crate) status: StateStatus,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl IdentityState {
    /// `compute` builds a new, not yet submitted, snapshot of the identity
    pub fn compute(identity: &Identity, previous_state: Option<Hash>) -> Result<Self, IdentityError> {
        let state = identity.compute_state()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            did: identity.did.to_owned(),
            state,
            claims_root: identity.claims_root,
            revocation_root: identity.revocation_root,
            roots_root: identity.roots_root,
            previous_state,
            status: StateStatus::Created,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    /// `genesis` is the state of a freshly created identity, it never goes through
    /// the chain so it starts as published
    pub fn genesis(identity: &Identity) -> Result<Self, IdentityError> {
        let mut state = Self::compute(identity, None)?;
        state.status = StateStatus::Published;
        Ok(state)
    }

    pub fn update_status(&mut self, status: StateStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_state.is_none()
    }

    pub fn get_id(&self) -> String {
        self.id.to_owned()
    }

    pub fn get_did(&self) -> String {
        self.did.to_owned()
    }

    pub fn get_state(&self) -> Hash {
        self.state
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

    pub fn get_previous_state(&self) -> Option<Hash> {
        self.previous_state
    }

    pub fn get_status(&self) -> StateStatus {
        self.status
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl ToJSON for IdentityState {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

impl TryInto<Vec<u8>> for IdentityState {
    type Error = IdentityError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::EntityError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for IdentityState {
    type Error = IdentityError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| IdentityError::EntityError(err.to_string()))
    }
}
