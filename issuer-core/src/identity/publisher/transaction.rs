use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::identity::state::IdentityState;
use crate::merkle::Hash;

use super::types::{PublisherError, TransactionStatus};

/// `TransactionRecord` is one submission attempt of an identity state
///
/// Records are append only, a retry never rewrites the failed record, it adds
/// a new one for the same state with the next attempt number
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct TransactionRecord {
    pub(crate) id: String,
    pub(crate) did: String,

    #[serde(rename = "stateID")]
    pub(crate) state_id: String,
    pub(crate) state: Hash,

    #[serde(rename = "txID")]
    pub(crate) tx_id: Option<String>,
    pub(crate) status: TransactionStatus,
    pub(crate) attempt: u32,
    pub(crate) error: Option<String>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "submittedAt")]
    pub(crate) submitted_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(state: &IdentityState) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            did: state.did.to_owned(),
            state_id: state.id.to_owned(),
            state: state.state,
            tx_id: None,
            status: TransactionStatus::Created,
            attempt: 1,
            error: None,
            submitted_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// `retry` opens the next attempt for the same state
    pub fn retry(&self) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            did: self.did.to_owned(),
            state_id: self.state_id.to_owned(),
            state: self.state,
            tx_id: None,
            status: TransactionStatus::Created,
            attempt: self.attempt + 1,
            error: None,
            submitted_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn mark_pending(&mut self, tx_id: String) {
        self.tx_id = Some(tx_id);
        self.update_status(TransactionStatus::Pending);
    }

    pub fn mark_failed(&mut self, reason: String) {
        self.error = Some(reason);
        self.update_status(TransactionStatus::Failed);
    }

    pub fn update_status(&mut self, status: TransactionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn is_in_flight(&self) -> bool {
        self.status.is_in_flight()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn get_id(&self) -> String {
        self.id.to_owned()
    }

    pub fn get_did(&self) -> String {
        self.did.to_owned()
    }

    pub fn get_state_id(&self) -> String {
        self.state_id.to_owned()
    }

    pub fn get_state(&self) -> Hash {
        self.state
    }

    pub fn get_tx_id(&self) -> Option<String> {
        self.tx_id.to_owned()
    }

    pub fn get_status(&self) -> TransactionStatus {
        self.status
    }

    pub fn get_attempt(&self) -> u32 {
        self.attempt
    }

    pub fn get_error(&self) -> Option<String> {
        self.error.to_owned()
    }

    pub fn get_submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl ToJSON for TransactionRecord {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

impl TryInto<Vec<u8>> for TransactionRecord {
    type Error = PublisherError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| PublisherError::EntityError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for TransactionRecord {
    type Error = PublisherError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| PublisherError::EntityError(err.to_string()))
    }
}
