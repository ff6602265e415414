use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::verifiable::status::types::RevocationStatus;

use super::Credential;

#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum CredentialError {
    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("credential already revoked: {0}")]
    AlreadyRevoked(u64),

    #[error("claim already exists")]
    ClaimAlreadyExists,

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("identity error: {0}")]
    IdentityError(String),

    #[error("status error: {0}")]
    StatusError(String),

    #[error("hash error: {0}")]
    HashError(String),

    #[error("entity error: {0}")]
    EntityError(String),

    #[error("repo error: {0}")]
    RepoError(String),
}

/// `IssueRequest` carries everything needed to issue a credential
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct IssueRequest {
    pub issuer_did: String,
    pub subject_did: String,
    pub schema_id: String,
    pub claim_data: Value,
    pub expiration: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CredentialAPI: Clone + Send + Sync {
    /// `issue_credential` assigns a fresh revocation nonce, adds the claim into the
    /// issuer claims tree and stores the credential
    ///
    /// The claims tree change is not visible on chain until the issuer state is published
    async fn issue_credential(&self, request: IssueRequest) -> Result<Credential, CredentialError>;

    async fn revoke_credential(&self, did: String, nonce: u64) -> Result<Credential, CredentialError>;

    async fn get_revocation_status(
        &self,
        did: String,
        nonce: u64,
    ) -> Result<RevocationStatus, CredentialError>;

    async fn get_credential(&self, id: String) -> Result<Credential, CredentialError>;

    /// `list_credentials` lists the credentials issued by `did`, newest first
    async fn list_credentials(&self, did: String) -> Result<Vec<Credential>, CredentialError>;

    /// `delete_credential` drops the stored credential, its claim stays in the
    /// claims tree and its nonce keeps its revocation state
    async fn delete_credential(&self, did: String, id: String) -> Result<(), CredentialError>;
}

#[async_trait]
pub trait RepoBuilder: Clone + Send + Sync {
    async fn save_credential(&self, credential: &Credential) -> Result<(), CredentialError>;
    async fn get_credential(&self, id: String) -> Result<Credential, CredentialError>;

    /// `get_credential_by_nonce` fails with [`CredentialError::CredentialNotFound`] when
    /// the issuer never used the nonce
    async fn get_credential_by_nonce(
        &self,
        did: String,
        nonce: u64,
    ) -> Result<Credential, CredentialError>;

    async fn list_credentials(&self, did: String) -> Result<Vec<Credential>, CredentialError>;
    async fn delete_credential(&self, id: String) -> Result<(), CredentialError>;
}
