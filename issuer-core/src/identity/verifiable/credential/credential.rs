use rst_common::standard::chrono::serde::{ts_seconds, ts_seconds_option};
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::identity::verifiable::status::StatusDescriptor;
use crate::merkle::hash::{hash_bytes, hash_elems};
use crate::merkle::Hash;

use super::types::{CredentialError, IssueRequest};

fn hash_err(err: impl ToString) -> CredentialError {
    CredentialError::HashError(err.to_string())
}

/// `Credential` is an issued credential together with the claim committed into
/// the issuer claims tree
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Credential {
    pub(crate) id: String,

    #[serde(rename = "issuerDID")]
    pub(crate) issuer_did: String,

    #[serde(rename = "subjectDID")]
    pub(crate) subject_did: String,

    #[serde(rename = "schemaID")]
    pub(crate) schema_id: String,

    #[serde(rename = "revocationNonce")]
    pub(crate) revocation_nonce: u64,

    #[serde(rename = "claimData")]
    pub(crate) claim_data: Value,

    #[serde(rename = "claimIndex")]
    pub(crate) claim_index: Hash,

    #[serde(rename = "claimValue")]
    pub(crate) claim_value: Hash,

    #[serde(rename = "credentialStatus")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) credential_status: Option<StatusDescriptor>,

    #[serde(with = "ts_seconds_option")]
    pub(crate) expiration: Option<DateTime<Utc>>,

    pub(crate) revoked: bool,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Credential {
    /// `generate` builds the credential and its claim, `nonce` must not be used by
    /// any other credential of the issuer
    pub fn generate(request: IssueRequest, nonce: u64) -> Result<Self, CredentialError> {
        if request.issuer_did.is_empty() {
            return Err(CredentialError::ValidationError(
                "issuer_did was missing".to_string(),
            ));
        }

        if request.subject_did.is_empty() {
            return Err(CredentialError::ValidationError(
                "subject_did was missing".to_string(),
            ));
        }

        if request.schema_id.is_empty() {
            return Err(CredentialError::ValidationError(
                "schema_id was missing".to_string(),
            ));
        }

        if !request.claim_data.is_object() {
            return Err(CredentialError::ValidationError(
                "claim_data must be an object".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let claim_index = hash_elems(&[
            hash_bytes(id.as_bytes()).map_err(hash_err)?,
            hash_bytes(request.schema_id.as_bytes()).map_err(hash_err)?,
            hash_bytes(request.subject_did.as_bytes()).map_err(hash_err)?,
        ])
        .map_err(hash_err)?;

        let data = serde_json::to_vec(&request.claim_data)
            .map_err(|err| CredentialError::EntityError(err.to_string()))?;

        let expires = request
            .expiration
            .map(|at| at.timestamp().max(0) as u64)
            .unwrap_or(0);

        let claim_value = hash_elems(&[
            Hash::from_u64(nonce),
            Hash::from_u64(expires),
            hash_bytes(&data).map_err(hash_err)?,
        ])
        .map_err(hash_err)?;

        Ok(Self {
            id,
            issuer_did: request.issuer_did,
            subject_did: request.subject_did,
            schema_id: request.schema_id,
            revocation_nonce: nonce,
            claim_data: request.claim_data,
            claim_index,
            claim_value,
            credential_status: None,
            expiration: request.expiration,
            revoked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    pub fn with_status(mut self, status: Option<StatusDescriptor>) -> Self {
        self.credential_status = status;
        self
    }

    pub fn revoke(&mut self) {
        self.revoked = true;
        self.updated_at = Utc::now();
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration.map(|at| at <= now).unwrap_or(false)
    }

    pub fn get_id(&self) -> String {
        self.id.to_owned()
    }

    pub fn get_issuer_did(&self) -> String {
        self.issuer_did.to_owned()
    }

    pub fn get_subject_did(&self) -> String {
        self.subject_did.to_owned()
    }

    pub fn get_schema_id(&self) -> String {
        self.schema_id.to_owned()
    }

    pub fn get_revocation_nonce(&self) -> u64 {
        self.revocation_nonce
    }

    pub fn get_claim_data(&self) -> Value {
        self.claim_data.to_owned()
    }

    pub fn get_claim_index(&self) -> Hash {
        self.claim_index
    }

    pub fn get_claim_value(&self) -> Hash {
        self.claim_value
    }

    pub fn get_credential_status(&self) -> Option<StatusDescriptor> {
        self.credential_status.to_owned()
    }

    pub fn get_expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl ToJSON for Credential {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

impl TryInto<Vec<u8>> for Credential {
    type Error = CredentialError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| CredentialError::EntityError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Credential {
    type Error = CredentialError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| CredentialError::EntityError(err.to_string()))
    }
}
