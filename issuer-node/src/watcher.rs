use std::time::Duration;

use rst_common::with_logging::log::{debug, info, warn};
use rst_common::with_tokio::tokio::{self, sync::watch, task::JoinHandle};

use prople_issuer_core::identity::link::types::LinkAPI;
use prople_issuer_core::identity::link::LinkSession;
use prople_issuer_core::identity::publisher::types::{PublisherAPI, PublisherError};

/// `Watcher` drives the confirmation of in flight state transactions and hands
/// every finalized record to the link sessions waiting on it
#[derive(Clone)]
pub struct Watcher<TPublisher, TLinks>
where
    TPublisher: PublisherAPI + 'static,
    TLinks: LinkAPI + 'static,
{
    publisher: TPublisher,
    links: TLinks,
    interval: Duration,
}

impl<TPublisher, TLinks> Watcher<TPublisher, TLinks>
where
    TPublisher: PublisherAPI + 'static,
    TLinks: LinkAPI + 'static,
{
    pub fn new(publisher: TPublisher, links: TLinks, interval: Duration) -> Self {
        Self {
            publisher,
            links,
            interval,
        }
    }

    /// `run_once` is a single watcher tick, it returns the sessions it settled
    pub async fn run_once(&self) -> Result<Vec<LinkSession>, PublisherError> {
        let finalized = self.publisher.check_pending_transactions().await?;
        debug!("watcher: {} finalized transactions", finalized.len());

        let mut settled = Vec::new();
        for record in finalized.iter() {
            match self.links.on_transaction_finalized(record).await {
                Ok(sessions) => settled.extend(sessions),
                Err(err) => warn!(
                    "watcher: unable to settle sessions of transaction {}: {}",
                    record.get_id(),
                    err
                ),
            }
        }

        Ok(settled)
    }

    /// `spawn` ticks until `shutdown` turns `true` or its sender is dropped
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            info!("watcher: started, interval {:?}", self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = self.run_once().await {
                            warn!("watcher: tick failed: {}", err);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            info!("watcher: stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;

    use rst_common::standard::async_trait::async_trait;

    use prople_issuer_core::identity::link::types::{
        CreateLinkRequest, LinkError, LinkFilter, QrCode, QrCodeStatus, SessionID,
    };
    use prople_issuer_core::identity::link::Link;
    use prople_issuer_core::identity::publisher::types::{Confirmation, StateStatusSummary};
    use prople_issuer_core::identity::publisher::TransactionRecord;
    use prople_issuer_core::identity::state::{Identity, IdentityState};

    mock!(
        FakePublisher{}

        impl Clone for FakePublisher {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl PublisherAPI for FakePublisher {
            async fn publish_state(&self, did: String) -> Result<TransactionRecord, PublisherError>;
            async fn retry_publish_state(&self, did: String) -> Result<TransactionRecord, PublisherError>;
            async fn get_state_status(&self, did: String) -> Result<StateStatusSummary, PublisherError>;
            async fn get_state_transactions(&self, did: String) -> Result<Vec<TransactionRecord>, PublisherError>;
            async fn confirm_transaction(&self, did: String, record_id: String, confirmation: Confirmation) -> Result<TransactionRecord, PublisherError>;
            async fn check_pending_transactions(&self) -> Result<Vec<TransactionRecord>, PublisherError>;
        }
    );

    mock!(
        FakeLinks{}

        impl Clone for FakeLinks {
            fn clone(&self) -> Self;
        }

        #[async_trait]
        impl LinkAPI for FakeLinks {
            async fn create_link(&self, request: CreateLinkRequest) -> Result<Link, LinkError>;
            async fn activate_link(&self, did: String, id: String, active: bool) -> Result<Link, LinkError>;
            async fn get_link(&self, did: String, id: String) -> Result<Link, LinkError>;
            async fn delete_link(&self, did: String, id: String) -> Result<(), LinkError>;
            async fn list_links(&self, did: String, filter: LinkFilter, query: Option<String>) -> Result<Vec<Link>, LinkError>;
            async fn create_qr_code(&self, link_id: String) -> Result<QrCode, LinkError>;
            async fn handle_authentication_callback(&self, session_id: SessionID, message: String) -> Result<LinkSession, LinkError>;
            async fn get_qr_code(&self, session_id: SessionID) -> Result<QrCodeStatus, LinkError>;
            async fn on_transaction_finalized(&self, record: &TransactionRecord) -> Result<Vec<LinkSession>, LinkError>;
        }
    );

    fn record() -> TransactionRecord {
        let identity = Identity::new("did:iden3:issuer".to_string());
        let state = IdentityState::compute(&identity, None).unwrap();
        TransactionRecord::new(&state)
    }

    #[tokio::test]
    async fn test_run_once_keeps_going_after_settle_failure() {
        let mut publisher = MockFakePublisher::new();
        publisher
            .expect_check_pending_transactions()
            .times(1)
            .returning(|| Ok(vec![record(), record()]));

        let mut links = MockFakeLinks::new();
        links
            .expect_on_transaction_finalized()
            .times(2)
            .returning(|_| Err(LinkError::RepoError("unavailable".to_string())));

        let watcher = Watcher::new(publisher, links, Duration::from_secs(1));
        let settled = watcher.run_once().await;
        assert!(settled.is_ok());
        assert!(settled.unwrap().is_empty())
    }

    #[tokio::test]
    async fn test_run_once_reports_publisher_failure() {
        let mut publisher = MockFakePublisher::new();
        publisher
            .expect_check_pending_transactions()
            .times(1)
            .returning(|| Err(PublisherError::RepoError("unavailable".to_string())));

        let mut links = MockFakeLinks::new();
        links.expect_on_transaction_finalized().times(0);

        let watcher = Watcher::new(publisher, links, Duration::from_secs(1));
        let result = watcher.run_once().await;
        assert!(matches!(result, Err(PublisherError::RepoError(_))))
    }
}
