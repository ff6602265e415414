use rst_common::standard::chrono::serde::{ts_seconds, ts_seconds_option};
use rst_common::standard::chrono::{DateTime, Duration, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::identity::publisher::types::TransactionStatus;
use crate::identity::publisher::TransactionRecord;

use super::types::{LinkError, SessionID, SessionStatus};
use super::Link;

/// `LinkSession` is a single holder going through a link QR code
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct LinkSession {
    pub(crate) id: SessionID,

    #[serde(rename = "linkID")]
    pub(crate) link_id: String,

    #[serde(rename = "issuerDID")]
    pub(crate) issuer_did: String,

    #[serde(rename = "holderDID")]
    pub(crate) holder_did: Option<String>,

    pub(crate) status: SessionStatus,

    #[serde(rename = "qrPayload")]
    pub(crate) qr_payload: Value,

    #[serde(rename = "credentialID")]
    pub(crate) credential_id: Option<String>,

    /// the publish record the session waits on, `None` until bound
    #[serde(rename = "transactionID")]
    pub(crate) transaction_id: Option<String>,

    pub(crate) failure: Option<String>,

    #[serde(with = "ts_seconds_option")]
    #[serde(rename = "issuedAt")]
    pub(crate) issued_at: Option<DateTime<Utc>>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "expiresAt")]
    pub(crate) expires_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl LinkSession {
    pub fn new(id: SessionID, link: &Link, qr_payload: Value, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            link_id: link.id.to_owned(),
            issuer_did: link.issuer_did.to_owned(),
            holder_did: None,
            status: SessionStatus::Pending,
            qr_payload,
            credential_id: None,
            transaction_id: None,
            failure: None,
            issued_at: None,
            expires_at: now + ttl,
            created_at: now,
            updated_at: now,
        }
    }

    /// only a session still waiting for its holder expires
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == SessionStatus::Pending && self.expires_at <= now
    }

    fn touch(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    fn ensure(&self, allowed: &[SessionStatus], action: &str) -> Result<(), LinkError> {
        if allowed.contains(&self.status) {
            return Ok(());
        }

        Err(LinkError::InvalidSessionState(format!(
            "cannot {} a {:?} session",
            action, self.status
        )))
    }

    /// `issued` records the credential given to the holder, the session stays
    /// `Pending` until its publish requirement is known
    pub fn issued(&mut self, holder_did: String, credential_id: String) -> Result<(), LinkError> {
        self.ensure(&[SessionStatus::Pending], "issue")?;

        self.holder_did = Some(holder_did);
        self.credential_id = Some(credential_id);
        self.issued_at = Some(Utc::now());
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn await_publish(&mut self, transaction_id: Option<String>) -> Result<(), LinkError> {
        self.ensure(&[SessionStatus::Pending], "await publish of")?;

        self.transaction_id = transaction_id;
        self.touch(SessionStatus::PendingPublish);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), LinkError> {
        self.ensure(
            &[SessionStatus::Pending, SessionStatus::PendingPublish],
            "complete",
        )?;

        self.touch(SessionStatus::Done);
        Ok(())
    }

    pub fn fail(&mut self, reason: String) -> Result<(), LinkError> {
        self.ensure(
            &[SessionStatus::Pending, SessionStatus::PendingPublish],
            "fail",
        )?;

        self.failure = Some(reason);
        self.touch(SessionStatus::Failed);
        Ok(())
    }

    /// `waits_on` tells whether `record` is the publish this session depends on
    ///
    /// A bound session only follows its own record. An unbound session follows the
    /// first state submission made after its credential was issued, a retry reuses
    /// an older state and never carries the claim.
    pub fn waits_on(&self, record: &TransactionRecord) -> bool {
        if self.status != SessionStatus::PendingPublish || record.did != self.issuer_did {
            return false;
        }

        match (&self.transaction_id, self.issued_at) {
            (Some(bound), _) => bound == &record.id,
            (None, Some(issued_at)) => record.attempt == 1 && record.submitted_at >= issued_at,
            (None, None) => false,
        }
    }

    /// `settle` applies a terminal record the session waits on
    pub fn settle(&mut self, record: &TransactionRecord) -> Result<bool, LinkError> {
        if !self.waits_on(record) {
            return Ok(false);
        }

        match record.status {
            TransactionStatus::Published => {
                self.transaction_id = Some(record.id.to_owned());
                self.complete()?;
                Ok(true)
            }
            TransactionStatus::Failed => {
                self.transaction_id = Some(record.id.to_owned());
                let reason = record
                    .error
                    .to_owned()
                    .unwrap_or_else(|| "state transaction failed".to_string());

                self.fail(reason)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn get_id(&self) -> SessionID {
        self.id.to_owned()
    }

    pub fn get_link_id(&self) -> String {
        self.link_id.to_owned()
    }

    pub fn get_issuer_did(&self) -> String {
        self.issuer_did.to_owned()
    }

    pub fn get_holder_did(&self) -> Option<String> {
        self.holder_did.to_owned()
    }

    pub fn get_status(&self) -> SessionStatus {
        self.status
    }

    pub fn get_qr_payload(&self) -> Value {
        self.qr_payload.to_owned()
    }

    pub fn get_credential_id(&self) -> Option<String> {
        self.credential_id.to_owned()
    }

    pub fn get_transaction_id(&self) -> Option<String> {
        self.transaction_id.to_owned()
    }

    pub fn get_failure(&self) -> Option<String> {
        self.failure.to_owned()
    }

    pub fn get_expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl ToJSON for LinkSession {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

impl TryInto<Vec<u8>> for LinkSession {
    type Error = LinkError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| LinkError::EntityError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for LinkSession {
    type Error = LinkError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| LinkError::EntityError(err.to_string()))
    }
}
