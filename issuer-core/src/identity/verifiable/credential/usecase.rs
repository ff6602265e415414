use rand::random;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info};

use crate::identity::state::types::{IdentityAPI, IdentityError};
use crate::identity::verifiable::status::types::{ResolverAPI, RevocationStatus};

use super::types::{CredentialAPI, CredentialError, IssueRequest, RepoBuilder};
use super::Credential;

const MAX_NONCE_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct Usecase<TRepo, TIdentity, TResolver>
where
    TRepo: RepoBuilder,
    TIdentity: IdentityAPI,
    TResolver: ResolverAPI,
{
    repo: TRepo,
    identity: TIdentity,
    resolver: TResolver,
}

impl<TRepo, TIdentity, TResolver> Usecase<TRepo, TIdentity, TResolver>
where
    TRepo: RepoBuilder,
    TIdentity: IdentityAPI,
    TResolver: ResolverAPI,
{
    pub fn new(repo: TRepo, identity: TIdentity, resolver: TResolver) -> Self {
        Self {
            repo,
            identity,
            resolver,
        }
    }

    async fn unused_nonce(&self, did: &str) -> Result<u64, CredentialError> {
        for _ in 0..MAX_NONCE_ATTEMPTS {
            let nonce: u64 = random();
            match self.repo.get_credential_by_nonce(did.to_string(), nonce).await {
                Err(CredentialError::CredentialNotFound(_)) => return Ok(nonce),
                Err(err) => return Err(err),
                Ok(_) => debug!("revocation nonce {} already used by {}", nonce, did),
            }
        }

        Err(CredentialError::RepoError(
            "unable to allocate a revocation nonce".to_string(),
        ))
    }
}

#[async_trait]
impl<TRepo, TIdentity, TResolver> CredentialAPI for Usecase<TRepo, TIdentity, TResolver>
where
    TRepo: RepoBuilder,
    TIdentity: IdentityAPI,
    TResolver: ResolverAPI,
{
    async fn issue_credential(&self, request: IssueRequest) -> Result<Credential, CredentialError> {
        let did = request.issuer_did.to_owned();
        let nonce = self.unused_nonce(&did).await?;

        let descriptor = self.resolver.build_descriptor(did.to_owned(), nonce);
        let credential = Credential::generate(request, nonce)?.with_status(descriptor);

        self.identity
            .add_claim(
                did.to_owned(),
                credential.get_claim_index(),
                credential.get_claim_value(),
            )
            .await
            .map_err(|err| match err {
                IdentityError::ClaimAlreadyExists => CredentialError::ClaimAlreadyExists,
                _ => CredentialError::IdentityError(err.to_string()),
            })?;

        self.repo.save_credential(&credential).await?;

        info!(
            "credential {} issued by {} to {}",
            credential.id, did, credential.subject_did
        );
        Ok(credential)
    }

    async fn revoke_credential(&self, did: String, nonce: u64) -> Result<Credential, CredentialError> {
        let mut credential = self
            .repo
            .get_credential_by_nonce(did.to_owned(), nonce)
            .await?;

        if credential.revoked {
            return Err(CredentialError::AlreadyRevoked(nonce));
        }

        self.identity
            .revoke_nonce(did.to_owned(), nonce)
            .await
            .map_err(|err| match err {
                IdentityError::AlreadyRevoked(nonce) => CredentialError::AlreadyRevoked(nonce),
                _ => CredentialError::IdentityError(err.to_string()),
            })?;

        credential.revoke();
        self.repo.save_credential(&credential).await?;

        info!("credential {} revoked by {}", credential.id, did);
        Ok(credential)
    }

    async fn get_revocation_status(
        &self,
        did: String,
        nonce: u64,
    ) -> Result<RevocationStatus, CredentialError> {
        self.resolver
            .resolve_nonce(did, nonce)
            .await
            .map_err(|err| CredentialError::StatusError(err.to_string()))
    }

    async fn get_credential(&self, id: String) -> Result<Credential, CredentialError> {
        self.repo.get_credential(id).await
    }

    async fn list_credentials(&self, did: String) -> Result<Vec<Credential>, CredentialError> {
        self.repo.list_credentials(did).await
    }

    async fn delete_credential(&self, did: String, id: String) -> Result<(), CredentialError> {
        let credential = self.repo.get_credential(id.to_owned()).await?;
        if credential.issuer_did != did {
            return Err(CredentialError::CredentialNotFound(id));
        }

        self.repo.delete_credential(id).await?;

        info!("credential {} deleted by {}", credential.id, did);
        Ok(())
    }
}
