use rst_common::standard::async_trait::async_trait;

use prople_issuer_core::identity::publisher::types::{PublisherError, RepoBuilder};
use prople_issuer_core::identity::publisher::TransactionRecord;

use super::table::Table;

fn repo_err(err: String) -> PublisherError {
    PublisherError::RepoError(err)
}

#[derive(Clone, Default)]
pub struct TransactionRepository {
    records: Table<TransactionRecord>,
}

impl TransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepoBuilder for TransactionRepository {
    async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), PublisherError> {
        let id = record.get_id();
        self.records
            .upsert(record.to_owned(), |row| row.get_id() == id)
            .map_err(repo_err)
    }

    async fn get_transaction(&self, id: String) -> Result<TransactionRecord, PublisherError> {
        self.records
            .find(|row| row.get_id() == id)
            .map_err(repo_err)?
            .ok_or(PublisherError::TransactionNotFound(id))
    }

    async fn list_transactions(
        &self,
        did: String,
    ) -> Result<Vec<TransactionRecord>, PublisherError> {
        self.records
            .newest_first(|row| row.get_did() == did)
            .map_err(repo_err)
    }

    async fn list_in_flight_transactions(&self) -> Result<Vec<TransactionRecord>, PublisherError> {
        self.records
            .newest_first(|row| row.is_in_flight())
            .map_err(repo_err)
    }
}
