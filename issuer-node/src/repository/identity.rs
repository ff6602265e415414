use rst_common::standard::async_trait::async_trait;

use prople_issuer_core::identity::state::types::{IdentityError, RepoBuilder};
use prople_issuer_core::identity::state::{Identity, IdentityState};

use super::table::Table;

fn repo_err(err: String) -> IdentityError {
    IdentityError::RepoError(err)
}

#[derive(Clone, Default)]
pub struct IdentityRepository {
    identities: Table<Identity>,
    states: Table<IdentityState>,
}

impl IdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepoBuilder for IdentityRepository {
    async fn save_identity(&self, identity: &Identity) -> Result<(), IdentityError> {
        let did = identity.get_did();
        self.identities
            .upsert(identity.to_owned(), |row| row.get_did() == did)
            .map_err(repo_err)
    }

    async fn get_identity(&self, did: String) -> Result<Identity, IdentityError> {
        self.identities
            .find(|row| row.get_did() == did)
            .map_err(repo_err)?
            .ok_or(IdentityError::IdentityNotFound(did))
    }

    async fn save_state(&self, state: &IdentityState) -> Result<(), IdentityError> {
        let id = state.get_id();
        self.states
            .upsert(state.to_owned(), |row| row.get_id() == id)
            .map_err(repo_err)
    }

    async fn get_state(&self, id: String) -> Result<IdentityState, IdentityError> {
        self.states
            .find(|row| row.get_id() == id)
            .map_err(repo_err)?
            .ok_or(IdentityError::StateNotFound(id))
    }

    async fn list_states(&self, did: String) -> Result<Vec<IdentityState>, IdentityError> {
        self.states
            .newest_first(|row| row.get_did() == did)
            .map_err(repo_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::with_tokio::tokio;

    use prople_issuer_core::identity::state::types::StateStatus;

    #[tokio::test]
    async fn test_states_newest_first() {
        let repo = IdentityRepository::new();
        let identity = Identity::new("did:iden3:issuer".to_string());
        repo.save_identity(&identity).await.unwrap();

        let genesis = IdentityState::genesis(&identity).unwrap();
        repo.save_state(&genesis).await.unwrap();

        let mut next = IdentityState::compute(&identity, Some(genesis.get_state())).unwrap();
        repo.save_state(&next).await.unwrap();

        next.update_status(StateStatus::PendingPublish);
        repo.save_state(&next).await.unwrap();

        let states = repo.list_states("did:iden3:issuer".to_string()).await.unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].get_id(), next.get_id());
        assert_eq!(states[0].get_status(), StateStatus::PendingPublish);

        let missing = repo.get_identity("did:iden3:unknown".to_string()).await;
        assert!(matches!(missing, Err(IdentityError::IdentityNotFound(_))))
    }
}
