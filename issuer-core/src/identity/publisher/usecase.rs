use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{Duration, Utc};
use rst_common::with_logging::log::{debug, info, warn};

use crate::identity::locks::IdentityLocks;
use crate::identity::state::types::{RepoBuilder as IdentityRepoBuilder, StateStatus};
use crate::identity::state::{IdentityState, IdentityTrees};
use crate::merkle::types::NodeStorage;

use super::rhs::collect_changed_nodes;
use super::types::{
    ChainClientBuilder, Confirmation, PublisherAPI, PublisherError, RepoBuilder,
    RhsClientBuilder, StateStatusSummary, TransactionStatus,
};
use super::TransactionRecord;

/// Default age after which a `created` record is considered an interrupted submission
pub const DEFAULT_SUBMISSION_TIMEOUT_SECS: i64 = 300;

fn identity_err(err: impl ToString) -> PublisherError {
    PublisherError::IdentityError(err.to_string())
}

#[derive(Clone)]
pub struct Usecase<TIdentityRepo, TNodes, TRepo, TChain, TRhs>
where
    TIdentityRepo: IdentityRepoBuilder,
    TNodes: NodeStorage,
    TRepo: RepoBuilder,
    TChain: ChainClientBuilder,
    TRhs: RhsClientBuilder,
{
    identity_repo: TIdentityRepo,
    nodes: TNodes,
    repo: TRepo,
    chain: TChain,
    rhs: Option<TRhs>,
    locks: IdentityLocks,
    submission_timeout: Duration,
}

impl<TIdentityRepo, TNodes, TRepo, TChain, TRhs> Usecase<TIdentityRepo, TNodes, TRepo, TChain, TRhs>
where
    TIdentityRepo: IdentityRepoBuilder,
    TNodes: NodeStorage,
    TRepo: RepoBuilder,
    TChain: ChainClientBuilder,
    TRhs: RhsClientBuilder,
{
    /// `new` builds the publisher, the `rhs` client is only given when states must
    /// be pushed to a reverse hash service
    pub fn new(
        identity_repo: TIdentityRepo,
        nodes: TNodes,
        repo: TRepo,
        chain: TChain,
        rhs: Option<TRhs>,
        locks: IdentityLocks,
    ) -> Self {
        Self {
            identity_repo,
            nodes,
            repo,
            chain,
            rhs,
            locks,
            submission_timeout: Duration::seconds(DEFAULT_SUBMISSION_TIMEOUT_SECS),
        }
    }

    pub fn submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    /// `submit` pushes the state to the RHS when configured, then to the chain
    ///
    /// The record must already be saved as `created`, any failure from here is
    /// written back to both the record and the state before returning.
    async fn submit(
        &self,
        state: &mut IdentityState,
        record: &mut TransactionRecord,
        base: Option<&IdentityState>,
    ) -> Result<TransactionRecord, PublisherError> {
        if let Some(rhs) = &self.rhs {
            let pushed = match collect_changed_nodes(&self.nodes, state, base).await {
                Ok(nodes) => {
                    debug!("pushing {} nodes of state {} to rhs", nodes.len(), state.state);
                    rhs.push_nodes(state.did.to_owned(), nodes).await
                }
                Err(err) => Err(err),
            };

            if let Err(err) = pushed {
                let reason = err.to_string();
                self.fail(state, record, reason.to_owned()).await?;
                return Err(PublisherError::RhsPushError(reason));
            }
        }

        match self.chain.submit_state(state).await {
            Ok(tx_id) => {
                record.mark_pending(tx_id.to_owned());
                state.update_status(StateStatus::PendingPublish);

                self.repo.save_transaction(record).await?;
                self.identity_repo
                    .save_state(state)
                    .await
                    .map_err(identity_err)?;

                info!(
                    "state {} of {} submitted, tx: {}, attempt: {}",
                    state.state, state.did, tx_id, record.attempt
                );

                Ok(record.to_owned())
            }
            Err(err) => {
                let reason = match err {
                    PublisherError::ChainSubmissionError(msg) => msg,
                    other => other.to_string(),
                };

                self.fail(state, record, reason.to_owned()).await?;
                Err(PublisherError::ChainSubmissionError(reason))
            }
        }
    }

    async fn fail(
        &self,
        state: &mut IdentityState,
        record: &mut TransactionRecord,
        reason: String,
    ) -> Result<(), PublisherError> {
        warn!(
            "state {} of {} failed, attempt: {}, reason: {}",
            state.state, state.did, record.attempt, reason
        );

        record.mark_failed(reason);
        state.update_status(StateStatus::Failed);

        self.repo.save_transaction(record).await?;
        self.identity_repo
            .save_state(state)
            .await
            .map_err(identity_err)
    }

    async fn apply_confirmation(
        &self,
        record: &mut TransactionRecord,
        confirmation: Confirmation,
    ) -> Result<(), PublisherError> {
        let state_status = match confirmation {
            Confirmation::Pending => return Ok(()),
            Confirmation::Mined => {
                record.update_status(TransactionStatus::Transacted);
                None
            }
            Confirmation::Published => {
                record.update_status(TransactionStatus::Published);
                Some(StateStatus::Published)
            }
            Confirmation::Failed(reason) => {
                record.mark_failed(reason);
                Some(StateStatus::Failed)
            }
        };

        self.repo.save_transaction(record).await?;

        if let Some(status) = state_status {
            let mut state = self
                .identity_repo
                .get_state(record.state_id.to_owned())
                .await
                .map_err(identity_err)?;

            state.update_status(status);
            self.identity_repo
                .save_state(&state)
                .await
                .map_err(identity_err)?;
        }

        info!(
            "transaction {} of {} is now {:?}",
            record.id, record.did, record.status
        );

        Ok(())
    }

    /// `expire_submission` fails a record stuck as `created`, which happens when a
    /// publish was cancelled between writing the record and submitting it
    async fn expire_submission(
        &self,
        record: &TransactionRecord,
    ) -> Result<Option<TransactionRecord>, PublisherError> {
        let _guard = self.locks.acquire(&record.did).await;
        let mut current = self.repo.get_transaction(record.id.to_owned()).await?;
        if current.status != TransactionStatus::Created {
            return Ok(None);
        }

        self.apply_confirmation(
            &mut current,
            Confirmation::Failed("submission interrupted".to_string()),
        )
        .await?;

        Ok(Some(current))
    }
}

#[async_trait]
impl<TIdentityRepo, TNodes, TRepo, TChain, TRhs> PublisherAPI
    for Usecase<TIdentityRepo, TNodes, TRepo, TChain, TRhs>
where
    TIdentityRepo: IdentityRepoBuilder,
    TNodes: NodeStorage,
    TRepo: RepoBuilder,
    TChain: ChainClientBuilder,
    TRhs: RhsClientBuilder,
{
    async fn publish_state(&self, did: String) -> Result<TransactionRecord, PublisherError> {
        let _guard = self.locks.acquire(&did).await;

        let mut identity = self
            .identity_repo
            .get_identity(did.to_owned())
            .await
            .map_err(identity_err)?;

        let states = self
            .identity_repo
            .list_states(did.to_owned())
            .await
            .map_err(identity_err)?;

        let transactions = self.repo.list_transactions(did.to_owned()).await?;

        let current = identity.compute_state().map_err(identity_err)?;
        if states.first().map(|s| s.state == current).unwrap_or(false) {
            return Err(PublisherError::NoStatesToProcess);
        }

        if transactions.first().map(|t| t.is_in_flight()).unwrap_or(false) {
            return Err(PublisherError::StateBeingProcessed);
        }

        let published = states
            .iter()
            .find(|s| s.status == StateStatus::Published)
            .cloned()
            .ok_or_else(|| identity_err(format!("no published state for {}", did)))?;

        if identity.claims_root != published.claims_root {
            let mut trees = IdentityTrees::load(&identity, self.nodes.clone());
            trees
                .add_claims_root()
                .await
                .map_err(|err| PublisherError::MerkleError(err.to_string()))?;

            trees.apply(&mut identity);
            self.identity_repo
                .save_identity(&identity)
                .await
                .map_err(identity_err)?;
        }

        let mut state =
            IdentityState::compute(&identity, Some(published.state)).map_err(identity_err)?;

        self.identity_repo
            .save_state(&state)
            .await
            .map_err(identity_err)?;

        let mut record = TransactionRecord::new(&state);
        self.repo.save_transaction(&record).await?;

        debug!(
            "publishing state {} of {}, previous: {}",
            state.state, did, published.state
        );

        self.submit(&mut state, &mut record, Some(&published)).await
    }

    async fn retry_publish_state(&self, did: String) -> Result<TransactionRecord, PublisherError> {
        let _guard = self.locks.acquire(&did).await;

        let transactions = self.repo.list_transactions(did.to_owned()).await?;
        let latest = transactions
            .first()
            .cloned()
            .ok_or(PublisherError::NoFailedStatesToProcess)?;

        if latest.is_in_flight() {
            return Err(PublisherError::StateBeingProcessed);
        }

        if latest.status != TransactionStatus::Failed {
            return Err(PublisherError::NoFailedStatesToProcess);
        }

        let mut state = self
            .identity_repo
            .get_state(latest.state_id.to_owned())
            .await
            .map_err(identity_err)?;

        let states = self
            .identity_repo
            .list_states(did.to_owned())
            .await
            .map_err(identity_err)?;

        let base = states
            .iter()
            .find(|s| s.status == StateStatus::Published && Some(s.state) == state.previous_state)
            .cloned();

        state.update_status(StateStatus::Created);
        self.identity_repo
            .save_state(&state)
            .await
            .map_err(identity_err)?;

        let mut record = latest.retry();
        self.repo.save_transaction(&record).await?;

        debug!(
            "retrying state {} of {}, attempt: {}",
            state.state, did, record.attempt
        );

        self.submit(&mut state, &mut record, base.as_ref()).await
    }

    async fn get_state_status(&self, did: String) -> Result<StateStatusSummary, PublisherError> {
        let identity = self
            .identity_repo
            .get_identity(did.to_owned())
            .await
            .map_err(identity_err)?;

        let current = identity.compute_state().map_err(identity_err)?;
        let states = self
            .identity_repo
            .list_states(did.to_owned())
            .await
            .map_err(identity_err)?;

        let unpublished = states
            .iter()
            .find(|s| s.status == StateStatus::Published)
            .map(|s| s.state != current)
            .unwrap_or(true);

        let transactions = self.repo.list_transactions(did).await?;
        let unsettled = transactions
            .first()
            .map(|t| t.is_in_flight() || t.status == TransactionStatus::Failed)
            .unwrap_or(false);

        Ok(StateStatusSummary {
            pending_actions: unpublished || unsettled,
        })
    }

    async fn get_state_transactions(
        &self,
        did: String,
    ) -> Result<Vec<TransactionRecord>, PublisherError> {
        self.repo.list_transactions(did).await
    }

    async fn confirm_transaction(
        &self,
        did: String,
        record_id: String,
        confirmation: Confirmation,
    ) -> Result<TransactionRecord, PublisherError> {
        let _guard = self.locks.acquire(&did).await;

        let mut record = self.repo.get_transaction(record_id.to_owned()).await?;
        if record.did != did {
            return Err(PublisherError::TransactionNotFound(record_id));
        }

        if record.is_terminal() {
            return Ok(record);
        }

        self.apply_confirmation(&mut record, confirmation).await?;
        Ok(record)
    }

    async fn check_pending_transactions(&self) -> Result<Vec<TransactionRecord>, PublisherError> {
        let records = self.repo.list_in_flight_transactions().await?;
        let stale_before = Utc::now() - self.submission_timeout;

        let mut finalized = Vec::new();
        for record in records {
            if record.status == TransactionStatus::Created {
                if record.submitted_at > stale_before {
                    continue;
                }

                match self.expire_submission(&record).await {
                    Ok(Some(expired)) => finalized.push(expired),
                    Ok(None) => {}
                    Err(err) => warn!("unable to expire transaction {}: {}", record.id, err),
                }

                continue;
            }

            let Some(tx_id) = record.tx_id.to_owned() else {
                continue;
            };

            let confirmation = match self.chain.watch_confirmation(tx_id.to_owned()).await {
                Ok(confirmation) => confirmation,
                Err(err) => {
                    warn!("unable to watch transaction {}: {}", tx_id, err);
                    continue;
                }
            };

            match self
                .confirm_transaction(record.did.to_owned(), record.id.to_owned(), confirmation)
                .await
            {
                Ok(updated) if updated.is_terminal() => finalized.push(updated),
                Ok(_) => {}
                Err(err) => warn!("unable to confirm transaction {}: {}", tx_id, err),
            }
        }

        Ok(finalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    use std::sync::{Arc, Mutex};

    use rst_common::with_tokio::tokio;

    use crate::identity::publisher::RhsNode;
    use crate::identity::state::types::IdentityError;
    use crate::identity::state::Identity;
    use crate::merkle::{Hash, MemoryStorage};

    mock!(
        FakeChain{}

        impl Clone for FakeChain {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl ChainClientBuilder for FakeChain {
            async fn submit_state(&self, state: &IdentityState) -> Result<String, PublisherError>;
            async fn watch_confirmation(&self, tx_id: String) -> Result<Confirmation, PublisherError>;
            async fn latest_state(&self, did: String) -> Result<Option<Hash>, PublisherError>;
        }
    );

    mock!(
        FakeRhs{}

        impl Clone for FakeRhs {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl RhsClientBuilder for FakeRhs {
            async fn push_nodes(&self, did: String, nodes: Vec<RhsNode>) -> Result<(), PublisherError>;
            async fn get_node(&self, hash: Hash) -> Result<Option<RhsNode>, PublisherError>;
        }
    );

    /// in memory identity store shared by the repository fakes
    #[derive(Clone, Default)]
    struct FakeIdentityRepo {
        identities: Arc<Mutex<Vec<Identity>>>,
        states: Arc<Mutex<Vec<IdentityState>>>,
    }

    #[async_trait]
    impl IdentityRepoBuilder for FakeIdentityRepo {
        async fn save_identity(&self, identity: &Identity) -> Result<(), IdentityError> {
            let mut identities = self.identities.lock().unwrap();
            identities.retain(|i| i.did != identity.did);
            identities.push(identity.clone());
            Ok(())
        }

        async fn get_identity(&self, did: String) -> Result<Identity, IdentityError> {
            let identities = self.identities.lock().unwrap();
            identities
                .iter()
                .find(|i| i.did == did)
                .cloned()
                .ok_or(IdentityError::IdentityNotFound(did))
        }

        async fn save_state(&self, state: &IdentityState) -> Result<(), IdentityError> {
            let mut states = self.states.lock().unwrap();
            match states.iter_mut().find(|s| s.id == state.id) {
                Some(existing) => *existing = state.clone(),
                None => states.push(state.clone()),
            }
            Ok(())
        }

        async fn get_state(&self, id: String) -> Result<IdentityState, IdentityError> {
            let states = self.states.lock().unwrap();
            states
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(IdentityError::StateNotFound(id))
        }

        async fn list_states(&self, did: String) -> Result<Vec<IdentityState>, IdentityError> {
            let states = self.states.lock().unwrap();
            Ok(states.iter().rev().filter(|s| s.did == did).cloned().collect())
        }
    }

    #[derive(Clone, Default)]
    struct FakeTransactionRepo {
        records: Arc<Mutex<Vec<TransactionRecord>>>,
    }

    #[async_trait]
    impl RepoBuilder for FakeTransactionRepo {
        async fn save_transaction(&self, record: &TransactionRecord) -> Result<(), PublisherError> {
            let mut records = self.records.lock().unwrap();
            match records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
            Ok(())
        }

        async fn get_transaction(&self, id: String) -> Result<TransactionRecord, PublisherError> {
            let records = self.records.lock().unwrap();
            records
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or(PublisherError::TransactionNotFound(id))
        }

        async fn list_transactions(
            &self,
            did: String,
        ) -> Result<Vec<TransactionRecord>, PublisherError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().rev().filter(|r| r.did == did).cloned().collect())
        }

        async fn list_in_flight_transactions(
            &self,
        ) -> Result<Vec<TransactionRecord>, PublisherError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().filter(|r| r.is_in_flight()).cloned().collect())
        }
    }

    const DID: &str = "did:iden3:polygon:amoy:issuer";

    type PublisherUsecase =
        Usecase<FakeIdentityRepo, MemoryStorage, FakeTransactionRepo, MockFakeChain, MockFakeRhs>;

    struct Fixture {
        identities: FakeIdentityRepo,
        nodes: MemoryStorage,
        transactions: FakeTransactionRepo,
    }

    impl Fixture {
        async fn new() -> Self {
            let identities = FakeIdentityRepo::default();
            let identity = Identity::new(DID.to_string());
            let genesis = IdentityState::genesis(&identity).unwrap();
            identities.save_identity(&identity).await.unwrap();
            identities.save_state(&genesis).await.unwrap();

            Self {
                identities,
                nodes: MemoryStorage::new(),
                transactions: FakeTransactionRepo::default(),
            }
        }

        async fn add_claim(&self, idx: u64) {
            let mut identity = self.identities.get_identity(DID.to_string()).await.unwrap();
            let mut trees = IdentityTrees::load(&identity, self.nodes.clone());
            let _ = trees
                .claims
                .add(Hash::from_u64(idx), Hash::from_u64(idx))
                .await
                .unwrap();
            trees.apply(&mut identity);
            self.identities.save_identity(&identity).await.unwrap();
        }

        fn publisher(&self, chain: MockFakeChain, rhs: Option<MockFakeRhs>) -> PublisherUsecase {
            Usecase::new(
                self.identities.clone(),
                self.nodes.clone(),
                self.transactions.clone(),
                chain,
                rhs,
                IdentityLocks::new(),
            )
        }
    }

    fn accepting_chain(times: usize) -> MockFakeChain {
        let mut chain = MockFakeChain::new();
        chain
            .expect_submit_state()
            .times(times)
            .returning(|state| Ok(format!("0x{}", state.get_state().to_be_hex())));
        chain
    }

    #[tokio::test]
    async fn test_publish_state_success() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let publisher = fixture.publisher(accepting_chain(1), None);
        let record = publisher.publish_state(DID.to_string()).await;
        assert!(!record.is_err());

        let record = record.unwrap();
        assert_eq!(record.get_status(), TransactionStatus::Pending);
        assert!(record.get_tx_id().is_some());

        let state = fixture
            .identities
            .get_state(record.get_state_id())
            .await
            .unwrap();
        assert_eq!(state.get_status(), StateStatus::PendingPublish);
        assert!(!state.get_roots_root().is_zero());

        let identity = fixture.identities.get_identity(DID.to_string()).await.unwrap();
        assert_eq!(identity.compute_state().unwrap(), state.get_state())
    }

    #[tokio::test]
    async fn test_publish_state_without_changes() {
        let fixture = Fixture::new().await;
        let publisher = fixture.publisher(accepting_chain(0), None);

        let result = publisher.publish_state(DID.to_string()).await;
        assert!(matches!(result, Err(PublisherError::NoStatesToProcess)))
    }

    #[tokio::test]
    async fn test_publish_state_twice() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let publisher = fixture.publisher(accepting_chain(1), None);
        let first = publisher.publish_state(DID.to_string()).await;
        assert!(!first.is_err());

        let second = publisher.publish_state(DID.to_string()).await;
        assert!(matches!(second, Err(PublisherError::NoStatesToProcess)))
    }

    #[tokio::test]
    async fn test_publish_state_while_pending() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let publisher = fixture.publisher(accepting_chain(1), None);
        let _ = publisher.publish_state(DID.to_string()).await.unwrap();

        fixture.add_claim(2).await;
        let result = publisher.publish_state(DID.to_string()).await;
        assert!(matches!(result, Err(PublisherError::StateBeingProcessed)))
    }

    #[tokio::test]
    async fn test_publish_state_chain_failure_then_retry() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let mut chain = MockFakeChain::new();
        chain
            .expect_submit_state()
            .times(1)
            .returning(|_| Err(PublisherError::ChainSubmissionError("rpc unreachable".to_string())));

        let publisher = fixture.publisher(chain, None);
        let result = publisher.publish_state(DID.to_string()).await;
        assert!(matches!(
            result,
            Err(PublisherError::ChainSubmissionError(ref msg)) if msg == "rpc unreachable"
        ));

        let records = publisher.get_state_transactions(DID.to_string()).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get_status(), TransactionStatus::Failed);

        let status = publisher.get_state_status(DID.to_string()).await.unwrap();
        assert!(status.pending_actions);

        let again = publisher.publish_state(DID.to_string()).await;
        assert!(matches!(again, Err(PublisherError::NoStatesToProcess)));

        let retry_publisher = fixture.publisher(accepting_chain(1), None);
        let retried = retry_publisher.retry_publish_state(DID.to_string()).await;
        assert!(!retried.is_err());

        let retried = retried.unwrap();
        assert_eq!(retried.get_attempt(), 2);
        assert_eq!(retried.get_state_id(), records[0].get_state_id());
        assert_eq!(retried.get_status(), TransactionStatus::Pending);

        let records = retry_publisher
            .get_state_transactions(DID.to_string())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get_id(), retried.get_id())
    }

    #[tokio::test]
    async fn test_retry_requires_failed_transaction() {
        let fixture = Fixture::new().await;
        let publisher = fixture.publisher(accepting_chain(1), None);

        let nothing = publisher.retry_publish_state(DID.to_string()).await;
        assert!(matches!(nothing, Err(PublisherError::NoFailedStatesToProcess)));

        fixture.add_claim(1).await;
        let record = publisher.publish_state(DID.to_string()).await.unwrap();

        let in_flight = publisher.retry_publish_state(DID.to_string()).await;
        assert!(matches!(in_flight, Err(PublisherError::StateBeingProcessed)));

        let _ = publisher
            .confirm_transaction(DID.to_string(), record.get_id(), Confirmation::Published)
            .await
            .unwrap();

        let published = publisher.retry_publish_state(DID.to_string()).await;
        assert!(matches!(
            published,
            Err(PublisherError::NoFailedStatesToProcess)
        ))
    }

    #[tokio::test]
    async fn test_confirmation_publishes_state() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let publisher = fixture.publisher(accepting_chain(1), None);
        let record = publisher.publish_state(DID.to_string()).await.unwrap();

        let status = publisher.get_state_status(DID.to_string()).await.unwrap();
        assert!(status.pending_actions);

        let mined = publisher
            .confirm_transaction(DID.to_string(), record.get_id(), Confirmation::Mined)
            .await
            .unwrap();
        assert_eq!(mined.get_status(), TransactionStatus::Transacted);

        let published = publisher
            .confirm_transaction(DID.to_string(), record.get_id(), Confirmation::Published)
            .await
            .unwrap();
        assert_eq!(published.get_status(), TransactionStatus::Published);

        let state = fixture
            .identities
            .get_state(record.get_state_id())
            .await
            .unwrap();
        assert_eq!(state.get_status(), StateStatus::Published);

        let status = publisher.get_state_status(DID.to_string()).await.unwrap();
        assert!(!status.pending_actions);

        let late = publisher
            .confirm_transaction(
                DID.to_string(),
                record.get_id(),
                Confirmation::Failed("reorg".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(late.get_status(), TransactionStatus::Published)
    }

    #[tokio::test]
    async fn test_confirm_transaction_of_another_did() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let publisher = fixture.publisher(accepting_chain(1), None);
        let record = publisher.publish_state(DID.to_string()).await.unwrap();

        let result = publisher
            .confirm_transaction(
                "did:iden3:someone".to_string(),
                record.get_id(),
                Confirmation::Published,
            )
            .await;
        assert!(matches!(result, Err(PublisherError::TransactionNotFound(_))))
    }

    #[tokio::test]
    async fn test_publish_state_pushes_rhs_nodes() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let mut rhs = MockFakeRhs::new();
        rhs.expect_push_nodes()
            .times(1)
            .withf(|did: &String, nodes: &Vec<RhsNode>| {
                did == DID && nodes.last().map(|n| n.children.len() == 3).unwrap_or(false)
            })
            .returning(|_, _| Ok(()));

        let publisher = fixture.publisher(accepting_chain(1), Some(rhs));
        let record = publisher.publish_state(DID.to_string()).await;
        assert!(!record.is_err())
    }

    #[tokio::test]
    async fn test_publish_state_rhs_failure() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let mut rhs = MockFakeRhs::new();
        rhs.expect_push_nodes()
            .times(1)
            .returning(|_, _| Err(PublisherError::RhsError("rhs down".to_string())));

        let publisher = fixture.publisher(accepting_chain(0), Some(rhs));
        let result = publisher.publish_state(DID.to_string()).await;
        assert!(matches!(result, Err(PublisherError::RhsPushError(_))));

        let records = publisher.get_state_transactions(DID.to_string()).await.unwrap();
        assert_eq!(records[0].get_status(), TransactionStatus::Failed)
    }

    #[tokio::test]
    async fn test_check_pending_transactions() {
        let fixture = Fixture::new().await;
        fixture.add_claim(1).await;

        let mut chain = accepting_chain(1);
        chain
            .expect_watch_confirmation()
            .times(1)
            .returning(|_| Ok(Confirmation::Published));

        let publisher = fixture.publisher(chain, None);
        let record = publisher.publish_state(DID.to_string()).await.unwrap();

        let finalized = publisher.check_pending_transactions().await.unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].get_id(), record.get_id());
        assert_eq!(finalized[0].get_status(), TransactionStatus::Published);

        let nothing = publisher.check_pending_transactions().await.unwrap();
        assert!(nothing.is_empty())
    }

    #[tokio::test]
    async fn test_check_pending_transactions_expires_interrupted_submission() {
        let fixture = Fixture::new().await;
        let identity = fixture.identities.get_identity(DID.to_string()).await.unwrap();
        let state = IdentityState::compute(&identity, None).unwrap();
        fixture.identities.save_state(&state).await.unwrap();

        let mut record = TransactionRecord::new(&state);
        record.submitted_at = Utc::now() - Duration::seconds(600);
        fixture.transactions.save_transaction(&record).await.unwrap();

        let publisher = fixture.publisher(MockFakeChain::new(), None);
        let finalized = publisher.check_pending_transactions().await.unwrap();
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].get_status(), TransactionStatus::Failed);

        let state = fixture.identities.get_state(state.get_id()).await.unwrap();
        assert_eq!(state.get_status(), StateStatus::Failed)
    }
}
