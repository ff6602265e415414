use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::state::IdentityState;
use crate::merkle::Hash;

use super::{RhsNode, TransactionRecord};

/// `PublisherError` is the failure taxonomy of the state publishing pipeline
///
/// - [`PublisherError::StateBeingProcessed`] is retryable later by the caller
/// - [`PublisherError::NoStatesToProcess`] and [`PublisherError::NoFailedStatesToProcess`]
///   are caller logic errors
/// - [`PublisherError::ChainSubmissionError`] and [`PublisherError::RhsPushError`] are
///   transient, the state can be submitted again through `retry_publish_state`
#[derive(Debug, PartialEq, Error, Clone, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub enum PublisherError {
    #[error("state is being processed")]
    StateBeingProcessed,

    #[error("no states to process")]
    NoStatesToProcess,

    #[error("no failed states to process")]
    NoFailedStatesToProcess,

    #[error("chain submission error: {0}")]
    ChainSubmissionError(String),

    #[error("rhs push error: {0}")]
    RhsPushError(String),

    #[error("rhs error: {0}")]
    RhsError(String),

    #[error("chain error: {0}")]
    ChainError(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("identity error: {0}")]
    IdentityError(String),

    #[error("merkle error: {0}")]
    MerkleError(String),

    #[error("entity error: {0}")]
    EntityError(String),

    #[error("repo error: {0}")]
    RepoError(String),
}

/// `TransactionStatus` follows a state transaction from its creation until
/// the chain finalizes it
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Created,
    Pending,
    Transacted,
    Published,
    Failed,
}

impl TransactionStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Created | TransactionStatus::Pending | TransactionStatus::Transacted
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Published | TransactionStatus::Failed)
    }
}

/// `Confirmation` is what the chain reports about a submitted transaction
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub enum Confirmation {
    Pending,
    Mined,
    Published,
    Failed(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct StateStatusSummary {
    #[serde(rename = "pendingActions")]
    pub pending_actions: bool,
}

#[async_trait]
pub trait PublisherAPI: Clone + Send + Sync {
    /// `publish_state` computes a new identity state and submits it to the chain
    ///
    /// The returned record is `pending`, the confirmation itself is reported later
    /// through [`PublisherAPI::confirm_transaction`]
    async fn publish_state(&self, did: String) -> Result<TransactionRecord, PublisherError>;

    /// `retry_publish_state` submits the state of the latest failed transaction again
    async fn retry_publish_state(&self, did: String) -> Result<TransactionRecord, PublisherError>;

    async fn get_state_status(&self, did: String) -> Result<StateStatusSummary, PublisherError>;

    /// `get_state_transactions` lists the identity transactions, newest first
    async fn get_state_transactions(
        &self,
        did: String,
    ) -> Result<Vec<TransactionRecord>, PublisherError>;

    async fn confirm_transaction(
        &self,
        did: String,
        record_id: String,
        confirmation: Confirmation,
    ) -> Result<TransactionRecord, PublisherError>;

    /// `check_pending_transactions` polls the chain for every in flight transaction
    /// and returns the records that reached a terminal status
    async fn check_pending_transactions(&self) -> Result<Vec<TransactionRecord>, PublisherError>;
}

#[async_trait]
pub trait RepoBuilder: Clone + Send + Sync {
    async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), PublisherError>;
    async fn get_transaction(&self, id: String) -> Result<TransactionRecord, PublisherError>;

    /// `list_transactions` must return the identity transactions ordered newest first
    async fn list_transactions(&self, did: String)
        -> Result<Vec<TransactionRecord>, PublisherError>;

    /// `list_in_flight_transactions` returns records of every identity which are
    /// still `created`, `pending` or `transacted`
    async fn list_in_flight_transactions(&self) -> Result<Vec<TransactionRecord>, PublisherError>;
}

/// `ChainClientBuilder` is the blockchain collaborator, signing and the contract
/// call itself are owned by the implementer
#[async_trait]
pub trait ChainClientBuilder: Clone + Send + Sync {
    /// `submit_state` returns the transaction id, failures must be reported as
    /// [`PublisherError::ChainSubmissionError`]
    async fn submit_state(&self, state: &IdentityState) -> Result<String, PublisherError>;

    async fn watch_confirmation(&self, tx_id: String) -> Result<Confirmation, PublisherError>;

    /// `latest_state` is the latest state of the identity known by the state contract
    async fn latest_state(&self, did: String) -> Result<Option<Hash>, PublisherError>;
}

/// `RhsClientBuilder` is the reverse hash service collaborator
#[async_trait]
pub trait RhsClientBuilder: Clone + Send + Sync {
    async fn push_nodes(&self, did: String, nodes: Vec<RhsNode>) -> Result<(), PublisherError>;
    async fn get_node(&self, hash: Hash) -> Result<Option<RhsNode>, PublisherError>;
}
