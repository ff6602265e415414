use rst_common::standard::async_trait::async_trait;

use prople_issuer_core::identity::verifiable::credential::types::{CredentialError, RepoBuilder};
use prople_issuer_core::identity::verifiable::credential::Credential;

use super::table::Table;

fn repo_err(err: String) -> CredentialError {
    CredentialError::RepoError(err)
}

#[derive(Clone, Default)]
pub struct CredentialRepository {
    credentials: Table<Credential>,
}

impl CredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepoBuilder for CredentialRepository {
    async fn save_credential(&self, credential: &Credential) -> Result<(), CredentialError> {
        let id = credential.get_id();
        self.credentials
            .upsert(credential.to_owned(), |row| row.get_id() == id)
            .map_err(repo_err)
    }

    async fn get_credential(&self, id: String) -> Result<Credential, CredentialError> {
        self.credentials
            .find(|row| row.get_id() == id)
            .map_err(repo_err)?
            .ok_or(CredentialError::CredentialNotFound(id))
    }

    async fn get_credential_by_nonce(
        &self,
        did: String,
        nonce: u64,
    ) -> Result<Credential, CredentialError> {
        self.credentials
            .find(|row| row.get_issuer_did() == did && row.get_revocation_nonce() == nonce)
            .map_err(repo_err)?
            .ok_or_else(|| CredentialError::CredentialNotFound(format!("{}:{}", did, nonce)))
    }

    async fn list_credentials(&self, did: String) -> Result<Vec<Credential>, CredentialError> {
        self.credentials
            .newest_first(|row| row.get_issuer_did() == did)
            .map_err(repo_err)
    }

    async fn delete_credential(&self, id: String) -> Result<(), CredentialError> {
        let removed = self
            .credentials
            .remove(|row| row.get_id() == id)
            .map_err(repo_err)?;

        if !removed {
            return Err(CredentialError::CredentialNotFound(id));
        }

        Ok(())
    }
}
