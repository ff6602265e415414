use derive_more::{AsRef, From, Into};
use the_newtype::Newtype;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::publisher::TransactionRecord;
use crate::identity::verifiable::credential::Credential;

use super::{Link, LinkSession};

#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum LinkError {
    #[error("link not found: {0}")]
    LinkNotFound(String),

    #[error("link already expired")]
    LinkAlreadyExpired,

    #[error("link max issuance exceeded")]
    LinkMaxExceeded,

    #[error("link is inactive")]
    LinkInactive,

    #[error("link is already active")]
    LinkAlreadyActive,

    #[error("link is already inactive")]
    LinkAlreadyInactive,

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session expired")]
    SessionExpired,

    #[error("session failed: {0}")]
    SessionFailed(String),

    #[error("invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("credential error: {0}")]
    CredentialError(String),

    #[error("publisher error: {0}")]
    PublisherError(String),

    #[error("entity error: {0}")]
    EntityError(String),

    #[error("repo error: {0}")]
    RepoError(String),
}

/// Unique identifier of a link session, it travels inside the QR code callback url
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Newtype, From, Into, AsRef)]
#[serde(crate = "self::serde")]
pub struct SessionID(String);

impl SessionID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `SessionStatus` is the link session state machine
///
/// `Pending` waits for the holder authentication. `PendingPublish` waits for the
/// issuer state that contains the credential claim. `Done` and `Failed` are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub enum SessionStatus {
    Pending,
    PendingPublish,
    Done,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Done | SessionStatus::Failed)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub enum LinkFilter {
    All,
    Active,
    Inactive,
    Exceeded,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct CreateLinkRequest {
    pub issuer_did: String,
    pub schema_id: String,
    pub credential_subject: Value,
    pub signature_proof: bool,
    pub mt_proof: bool,
    pub max_issuance: Option<u64>,
    pub valid_until: Option<DateTime<Utc>>,
    pub credential_expiration: Option<DateTime<Utc>>,
}

/// `AuthenticationMessage` is the decoded holder authentication response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct AuthenticationMessage {
    pub from: String,

    #[serde(rename = "sessionID")]
    pub session_id: String,

    pub body: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct QrCode {
    #[serde(rename = "sessionID")]
    pub session_id: SessionID,

    #[serde(rename = "qrPayload")]
    pub qr_payload: Value,

    pub link: Link,
}

/// `QrCodeStatus` is what a holder polling a session sees
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct QrCodeStatus {
    pub status: SessionStatus,
    pub payload: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<Credential>,
}

#[async_trait]
pub trait LinkAPI: Clone + Send + Sync {
    async fn create_link(&self, request: CreateLinkRequest) -> Result<Link, LinkError>;
    async fn activate_link(&self, did: String, id: String, active: bool) -> Result<Link, LinkError>;
    async fn get_link(&self, did: String, id: String) -> Result<Link, LinkError>;
    async fn delete_link(&self, did: String, id: String) -> Result<(), LinkError>;

    /// `list_links` narrows the issuer links by `filter`, a `query` is matched
    /// against the schema and the subject template
    async fn list_links(
        &self,
        did: String,
        filter: LinkFilter,
        query: Option<String>,
    ) -> Result<Vec<Link>, LinkError>;

    /// `create_qr_code` opens a new session on a usable link, the QR payload is an
    /// authorization request the holder answers through the callback url
    async fn create_qr_code(&self, link_id: String) -> Result<QrCode, LinkError>;

    /// `handle_authentication_callback` issues the credential of an authenticated holder
    async fn handle_authentication_callback(
        &self,
        session_id: SessionID,
        message: String,
    ) -> Result<LinkSession, LinkError>;

    /// `get_qr_code` never mutates the session, a waiting session reports the
    /// status of the transaction it depends on
    async fn get_qr_code(&self, session_id: SessionID) -> Result<QrCodeStatus, LinkError>;

    /// `on_transaction_finalized` moves the sessions waiting on `record` to their
    /// terminal status and returns them
    async fn on_transaction_finalized(
        &self,
        record: &TransactionRecord,
    ) -> Result<Vec<LinkSession>, LinkError>;
}

#[async_trait]
pub trait RepoBuilder: Clone + Send + Sync {
    async fn save_link(&self, link: &Link) -> Result<(), LinkError>;
    async fn get_link(&self, id: String) -> Result<Link, LinkError>;
    async fn delete_link(&self, id: String) -> Result<(), LinkError>;

    /// `list_links` returns the links of the issuer, newest first
    async fn list_links(&self, did: String) -> Result<Vec<Link>, LinkError>;

    /// `try_increment_issued` must check the issuance cap and increment the counter
    /// as a single atomic step, it fails with [`LinkError::LinkMaxExceeded`] once
    /// the cap is reached
    async fn try_increment_issued(&self, id: String) -> Result<Link, LinkError>;

    /// `set_active` flips the active flag in place, the issued counter of the
    /// stored row is left untouched
    async fn set_active(&self, id: String, active: bool) -> Result<Link, LinkError>;
}

#[async_trait]
pub trait SessionRepoBuilder: Clone + Send + Sync {
    async fn save_session(&self, session: &LinkSession) -> Result<(), LinkError>;
    async fn get_session(&self, id: SessionID) -> Result<LinkSession, LinkError>;
    async fn list_sessions_by_status(
        &self,
        status: SessionStatus,
    ) -> Result<Vec<LinkSession>, LinkError>;
}

/// `ProtocolCodecBuilder` decodes holder messages, signatures and envelopes are
/// owned by the implementer
#[async_trait]
pub trait ProtocolCodecBuilder: Clone + Send + Sync {
    async fn decode_authentication(&self, message: String)
        -> Result<AuthenticationMessage, LinkError>;
}
