use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info};

use crate::identity::locks::IdentityLocks;
use crate::merkle::types::{MerkleError, NodeStorage};
use crate::merkle::Hash;

use super::types::{IdentityAPI, IdentityError, RepoBuilder, StateStatus};
use super::{Identity, IdentityState, IdentityTrees};

#[derive(Clone)]
pub struct Usecase<TRepo, TNodes>
where
    TRepo: RepoBuilder,
    TNodes: NodeStorage,
{
    repo: TRepo,
    nodes: TNodes,
    locks: IdentityLocks,
}

impl<TRepo, TNodes> Usecase<TRepo, TNodes>
where
    TRepo: RepoBuilder,
    TNodes: NodeStorage,
{
    pub fn new(repo: TRepo, nodes: TNodes, locks: IdentityLocks) -> Self {
        Self { repo, nodes, locks }
    }

    async fn load(&self, did: &str) -> Result<(Identity, IdentityTrees<TNodes>), IdentityError> {
        let identity = self.repo.get_identity(did.to_string()).await?;
        let trees = IdentityTrees::load(&identity, self.nodes.clone());
        Ok((identity, trees))
    }
}

#[async_trait]
impl<TRepo, TNodes> IdentityAPI for Usecase<TRepo, TNodes>
where
    TRepo: RepoBuilder,
    TNodes: NodeStorage,
{
    async fn create_identity(&self, did: String) -> Result<IdentityState, IdentityError> {
        if did.is_empty() {
            return Err(IdentityError::ValidationError("did was missing".to_string()));
        }

        let _guard = self.locks.acquire(&did).await;
        match self.repo.get_identity(did.to_owned()).await {
            Ok(_) => return Err(IdentityError::IdentityAlreadyExists(did)),
            Err(IdentityError::IdentityNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        let identity = Identity::new(did.to_owned());
        let genesis = IdentityState::genesis(&identity)?;

        self.repo.save_identity(&identity).await?;
        self.repo.save_state(&genesis).await?;

        info!("identity created: {}, genesis state: {}", did, genesis.state);
        Ok(genesis)
    }

    async fn get_identity(&self, did: String) -> Result<Identity, IdentityError> {
        self.repo.get_identity(did).await
    }

    async fn compute_state(&self, did: String) -> Result<Hash, IdentityError> {
        let identity = self.repo.get_identity(did).await?;
        identity.compute_state()
    }

    async fn has_pending_changes(&self, did: String) -> Result<bool, IdentityError> {
        let identity = self.repo.get_identity(did.to_owned()).await?;
        let current = identity.compute_state()?;

        let states = self.repo.list_states(did).await?;
        let published = states
            .iter()
            .find(|state| state.status == StateStatus::Published);

        Ok(published.map(|state| state.state != current).unwrap_or(true))
    }

    async fn add_claim(&self, did: String, index: Hash, value: Hash) -> Result<Hash, IdentityError> {
        let _guard = self.locks.acquire(&did).await;
        let (mut identity, mut trees) = self.load(&did).await?;

        let root = trees
            .claims
            .add(index, value)
            .await
            .map_err(|err| match err {
                MerkleError::EntryIndexAlreadyExists => IdentityError::ClaimAlreadyExists,
                _ => IdentityError::MerkleError(err.to_string()),
            })?;

        trees.apply(&mut identity);
        self.repo.save_identity(&identity).await?;

        debug!("claim added to {}, claims root: {}", did, root);
        Ok(root)
    }

    async fn add_root_to_roots(&self, did: String) -> Result<Hash, IdentityError> {
        let _guard = self.locks.acquire(&did).await;
        let (mut identity, mut trees) = self.load(&did).await?;

        let root = trees
            .add_claims_root()
            .await
            .map_err(|err| IdentityError::MerkleError(err.to_string()))?;

        trees.apply(&mut identity);
        self.repo.save_identity(&identity).await?;

        debug!("claims root of {} committed, roots root: {}", did, root);
        Ok(root)
    }

    async fn revoke_nonce(&self, did: String, nonce: u64) -> Result<Hash, IdentityError> {
        let _guard = self.locks.acquire(&did).await;
        let (mut identity, mut trees) = self.load(&did).await?;

        let root = trees
            .revocations
            .add(Hash::from_u64(nonce), Hash::zero())
            .await
            .map_err(|err| match err {
                MerkleError::EntryIndexAlreadyExists => IdentityError::AlreadyRevoked(nonce),
                _ => IdentityError::MerkleError(err.to_string()),
            })?;

        trees.apply(&mut identity);
        self.repo.save_identity(&identity).await?;

        info!("nonce {} revoked by {}, revocation root: {}", nonce, did, root);
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::eq;

    use rst_common::with_tokio::tokio;

    use crate::merkle::MemoryStorage;

    mock!(
        FakeRepo{}

        impl Clone for FakeRepo {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl RepoBuilder for FakeRepo {
            async fn save_identity(&self, identity: &Identity) -> Result<(), IdentityError>;
            async fn get_identity(&self, did: String) -> Result<Identity, IdentityError>;
            async fn save_state(&self, state: &IdentityState) -> Result<(), IdentityError>;
            async fn get_state(&self, id: String) -> Result<IdentityState, IdentityError>;
            async fn list_states(&self, did: String) -> Result<Vec<IdentityState>, IdentityError>;
        }
    );

    const DID: &str = "did:iden3:polygon:amoy:issuer";

    fn generate_usecase(repo: MockFakeRepo) -> Usecase<MockFakeRepo, MemoryStorage> {
        Usecase::new(repo, MemoryStorage::new(), IdentityLocks::new())
    }

    #[tokio::test]
    async fn test_create_identity_success() {
        let mut repo = MockFakeRepo::new();
        repo.expect_get_identity()
            .with(eq(DID.to_string()))
            .times(1)
            .returning(|did| Err(IdentityError::IdentityNotFound(did)));

        repo.expect_save_identity()
            .times(1)
            .withf(|identity: &Identity| identity.did == DID && identity.claims_root.is_zero())
            .returning(|_| Ok(()));

        repo.expect_save_state()
            .times(1)
            .withf(|state: &IdentityState| state.status == StateStatus::Published)
            .returning(|_| Ok(()));

        let usecase = generate_usecase(repo);
        let genesis = usecase.create_identity(DID.to_string()).await;
        assert!(!genesis.is_err());
        assert!(genesis.unwrap().is_genesis())
    }

    #[tokio::test]
    async fn test_create_identity_already_exists() {
        let mut repo = MockFakeRepo::new();
        repo.expect_get_identity()
            .times(1)
            .returning(|did| Ok(Identity::new(did)));

        let usecase = generate_usecase(repo);
        let result = usecase.create_identity(DID.to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            IdentityError::IdentityAlreadyExists(_)
        ))
    }

    #[tokio::test]
    async fn test_create_identity_missing_did() {
        let usecase = generate_usecase(MockFakeRepo::new());
        let result = usecase.create_identity("".to_string()).await;
        assert!(matches!(
            result.unwrap_err(),
            IdentityError::ValidationError(_)
        ))
    }

    #[tokio::test]
    async fn test_add_claim_updates_identity_root() {
        let mut repo = MockFakeRepo::new();
        repo.expect_get_identity()
            .times(1)
            .returning(|did| Ok(Identity::new(did)));

        repo.expect_save_identity()
            .times(1)
            .withf(|identity: &Identity| !identity.claims_root.is_zero())
            .returning(|_| Ok(()));

        let usecase = generate_usecase(repo);
        let root = usecase
            .add_claim(DID.to_string(), Hash::from_u64(1), Hash::from_u64(2))
            .await;
        assert!(!root.is_err());
        assert!(!root.unwrap().is_zero())
    }

    #[tokio::test]
    async fn test_revoke_nonce_twice() {
        let nodes = MemoryStorage::new();
        let mut identity = Identity::new(DID.to_string());
        let mut trees = IdentityTrees::load(&identity, nodes.clone());
        let _ = trees
            .revocations
            .add(Hash::from_u64(99), Hash::zero())
            .await
            .unwrap();
        trees.apply(&mut identity);

        let mut repo = MockFakeRepo::new();
        repo.expect_get_identity()
            .times(1)
            .return_once(move |_| Ok(identity));

        let usecase = Usecase::new(repo, nodes, IdentityLocks::new());
        let result = usecase.revoke_nonce(DID.to_string(), 99).await;
        assert!(matches!(result.unwrap_err(), IdentityError::AlreadyRevoked(99)))
    }

    fn identity_repo(identity: Identity, states: Vec<IdentityState>) -> MockFakeRepo {
        let mut repo = MockFakeRepo::new();
        repo.expect_get_identity()
            .times(1)
            .return_once(move |_| Ok(identity));

        repo.expect_list_states()
            .times(1)
            .return_once(move |_| Ok(states));

        repo
    }

    #[tokio::test]
    async fn test_has_pending_changes() {
        let nodes = MemoryStorage::new();
        let mut identity = Identity::new(DID.to_string());
        let genesis = IdentityState::genesis(&identity).unwrap();

        let repo = identity_repo(identity.clone(), vec![genesis.clone()]);
        let usecase = Usecase::new(repo, nodes.clone(), IdentityLocks::new());
        let pending = usecase.has_pending_changes(DID.to_string()).await;
        assert!(!pending.unwrap());

        let mut trees = IdentityTrees::load(&identity, nodes.clone());
        let _ = trees
            .claims
            .add(Hash::from_u64(10), Hash::from_u64(20))
            .await
            .unwrap();
        trees.apply(&mut identity);

        let repo = identity_repo(identity, vec![genesis]);
        let usecase = Usecase::new(repo, nodes, IdentityLocks::new());
        let pending = usecase.has_pending_changes(DID.to_string()).await;
        assert!(pending.unwrap())
    }

    #[tokio::test]
    async fn test_add_root_to_roots() {
        let mut identity = Identity::new(DID.to_string());
        identity.claims_root = Hash::from_u64(5);

        let mut repo = MockFakeRepo::new();
        repo.expect_get_identity()
            .times(1)
            .return_once(move |_| Ok(identity));

        repo.expect_save_identity()
            .times(1)
            .withf(|identity: &Identity| !identity.roots_root.is_zero())
            .returning(|_| Ok(()));

        let usecase = generate_usecase(repo);
        let root = usecase.add_root_to_roots(DID.to_string()).await;
        assert!(!root.unwrap().is_zero())
    }
}
