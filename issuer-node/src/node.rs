use std::future::Future;
use std::time::Duration;

use rst_common::standard::chrono::Duration as ChronoDuration;
use rst_common::with_errors::thiserror::{self, Error};
use rst_common::with_logging::log::{info, warn};
use rst_common::with_tokio::tokio;

use prople_issuer_core::identity::link::types::{
    CreateLinkRequest, LinkAPI, LinkError, LinkFilter, ProtocolCodecBuilder, QrCode, QrCodeStatus,
    SessionID,
};
use prople_issuer_core::identity::link::{self, Link, LinkSession, LinkSettings};
use prople_issuer_core::identity::locks::IdentityLocks;
use prople_issuer_core::identity::publisher::types::{
    ChainClientBuilder, Confirmation, PublisherAPI, PublisherError, RhsClientBuilder,
    StateStatusSummary,
};
use prople_issuer_core::identity::publisher::{self, TransactionRecord};
use prople_issuer_core::identity::state::types::{IdentityAPI, IdentityError};
use prople_issuer_core::identity::state::{self, IdentityState};
use prople_issuer_core::identity::verifiable::credential::types::{
    CredentialAPI, CredentialError, IssueRequest,
};
use prople_issuer_core::identity::verifiable::credential::{self, Credential};
use prople_issuer_core::identity::verifiable::status::types::{
    ResolverAPI, RevocationStatus, StatusError,
};
use prople_issuer_core::identity::verifiable::status::Resolver;
use prople_issuer_core::merkle::MemoryStorage;

use crate::common::helpers;
use crate::common::types::CommonError;
use crate::config::{Config, Parser};
use crate::repository::{
    CredentialRepository, IdentityRepository, LinkRepository, SessionRepository,
    TransactionRepository,
};
use crate::watcher::Watcher;

pub type IdentityUsecase = state::Usecase<IdentityRepository, MemoryStorage>;

pub type PublisherUsecase<C, R> =
    publisher::Usecase<IdentityRepository, MemoryStorage, TransactionRepository, C, R>;

pub type StatusResolver<C, R> = Resolver<IdentityRepository, MemoryStorage, C, R>;

pub type CredentialUsecase<C, R> =
    credential::Usecase<CredentialRepository, IdentityUsecase, StatusResolver<C, R>>;

pub type LinkUsecase<C, R, P> = link::Usecase<
    LinkRepository,
    SessionRepository,
    CredentialUsecase<C, R>,
    PublisherUsecase<C, R>,
    P,
>;

#[derive(Debug, PartialEq, Error)]
pub enum NodeError {
    #[error("common error: {0}")]
    CommonError(#[from] CommonError),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("identity error: {0}")]
    IdentityError(#[from] IdentityError),

    #[error("publisher error: {0}")]
    PublisherError(#[from] PublisherError),

    #[error("credential error: {0}")]
    CredentialError(#[from] CredentialError),

    #[error("status error: {0}")]
    StatusError(#[from] StatusError),

    #[error("link error: {0}")]
    LinkError(#[from] LinkError),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// `Node` wires the issuer usecases over the in memory repositories and exposes
/// the issuer boundary operations
///
/// The identity usecase and the publisher share one set of per DID locks, so a
/// tree mutation never interleaves with a state publication of the same DID.
/// Every operation runs under the configured request deadline, an expired
/// operation is dropped and reported as [`NodeError::DeadlineExceeded`].
#[derive(Clone)]
pub struct Node<C, R, P>
where
    C: ChainClientBuilder + 'static,
    R: RhsClientBuilder + 'static,
    P: ProtocolCodecBuilder + 'static,
{
    config: Config,
    identity: IdentityUsecase,
    publisher: PublisherUsecase<C, R>,
    resolver: StatusResolver<C, R>,
    credential: CredentialUsecase<C, R>,
    links: LinkUsecase<C, R, P>,
    deadline: Duration,
}

impl<C, R, P> Node<C, R, P>
where
    C: ChainClientBuilder + 'static,
    R: RhsClientBuilder + 'static,
    P: ProtocolCodecBuilder + 'static,
{
    pub fn new(config: Config, chain: C, rhs: Option<R>, codec: P) -> Result<Self, NodeError> {
        helpers::validate(config.clone())?;

        let settings = config.credential_status().to_settings();
        let kind = settings.kind()?;

        let locks = IdentityLocks::new();
        let nodes = MemoryStorage::new();
        let identity_repo = IdentityRepository::new();

        let identity = IdentityUsecase::new(identity_repo.clone(), nodes.clone(), locks.clone());

        let publisher_rhs = if kind.pushes_to_rhs() {
            rhs.clone()
        } else {
            None
        };

        let publisher = PublisherUsecase::new(
            identity_repo.clone(),
            nodes.clone(),
            TransactionRepository::new(),
            chain.clone(),
            publisher_rhs,
            locks,
        )
        .submission_timeout(ChronoDuration::seconds(
            config.publisher().get_submission_timeout_secs(),
        ));

        let resolver = StatusResolver::new(identity_repo, nodes, chain, rhs, settings)?;
        let credential =
            CredentialUsecase::new(CredentialRepository::new(), identity.clone(), resolver.clone());

        let link_settings = LinkSettings::new(config.app().get_server_url(), kind.clone())
            .session_ttl(ChronoDuration::seconds(
                config.publisher().get_session_ttl_secs(),
            ));

        let links = LinkUsecase::new(
            LinkRepository::new(),
            SessionRepository::new(),
            credential.clone(),
            publisher.clone(),
            codec,
            link_settings,
        );

        info!("node ready, credential status: {:?}", kind);
        Ok(Self {
            deadline: Duration::from_secs(config.app().get_request_timeout_secs()),
            config,
            identity,
            publisher,
            resolver,
            credential,
            links,
        })
    }

    /// `from_file` loads and validates a TOML config before building the node
    pub fn from_file(conf_file: String, chain: C, rhs: Option<R>, codec: P) -> Result<Self, NodeError> {
        let config = Parser::new(conf_file)
            .parse()
            .map_err(|err| NodeError::ConfigError(err.to_string()))?;

        Self::new(config, chain, rhs, codec)
    }

    async fn bounded<T, E>(&self, op: impl Future<Output = Result<T, E>>) -> Result<T, NodeError>
    where
        NodeError: From<E>,
    {
        match tokio::time::timeout(self.deadline, op).await {
            Ok(result) => result.map_err(NodeError::from),
            Err(_) => {
                warn!("operation dropped after {:?}", self.deadline);
                Err(NodeError::DeadlineExceeded)
            }
        }
    }

    /// `bootstrap` creates the configured issuer identity on first start
    pub async fn bootstrap(&self) -> Result<(), NodeError> {
        match self.create_identity(self.config.app().get_issuer_did()).await {
            Ok(_) | Err(NodeError::IdentityError(IdentityError::IdentityAlreadyExists(_))) => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `watcher` builds the confirmation watcher over this node's publisher and links
    pub fn watcher(&self) -> Watcher<PublisherUsecase<C, R>, LinkUsecase<C, R, P>> {
        let interval = Duration::from_secs(self.config.publisher().get_watch_interval_secs());
        Watcher::new(self.publisher.clone(), self.links.clone(), interval)
    }

    pub async fn create_identity(&self, did: String) -> Result<IdentityState, NodeError> {
        self.bounded(self.identity.create_identity(did)).await
    }

    pub async fn publish_state(&self, did: String) -> Result<TransactionRecord, NodeError> {
        self.bounded(self.publisher.publish_state(did)).await
    }

    pub async fn retry_publish_state(&self, did: String) -> Result<TransactionRecord, NodeError> {
        self.bounded(self.publisher.retry_publish_state(did)).await
    }

    pub async fn get_state_status(&self, did: String) -> Result<StateStatusSummary, NodeError> {
        self.bounded(self.publisher.get_state_status(did)).await
    }

    pub async fn get_state_transactions(
        &self,
        did: String,
    ) -> Result<Vec<TransactionRecord>, NodeError> {
        self.bounded(self.publisher.get_state_transactions(did)).await
    }

    /// `confirm_transaction` applies a confirmation pushed by the chain side
    pub async fn confirm_transaction(
        &self,
        did: String,
        record_id: String,
        confirmation: Confirmation,
    ) -> Result<TransactionRecord, NodeError> {
        let record = self
            .bounded(self.publisher.confirm_transaction(did, record_id, confirmation))
            .await?;

        if record.is_terminal() {
            self.bounded(self.links.on_transaction_finalized(&record))
                .await?;
        }

        Ok(record)
    }

    pub async fn get_revocation_status(
        &self,
        did: String,
        nonce: u64,
    ) -> Result<RevocationStatus, NodeError> {
        self.bounded(self.resolver.resolve_nonce(did, nonce)).await
    }

    pub async fn issue_credential(&self, request: IssueRequest) -> Result<Credential, NodeError> {
        self.bounded(self.credential.issue_credential(request)).await
    }

    pub async fn revoke_credential(&self, did: String, nonce: u64) -> Result<Credential, NodeError> {
        self.bounded(self.credential.revoke_credential(did, nonce))
            .await
    }

    pub async fn get_credential(&self, id: String) -> Result<Credential, NodeError> {
        self.bounded(self.credential.get_credential(id)).await
    }

    pub async fn list_credentials(&self, did: String) -> Result<Vec<Credential>, NodeError> {
        self.bounded(self.credential.list_credentials(did)).await
    }

    pub async fn delete_credential(&self, did: String, id: String) -> Result<(), NodeError> {
        self.bounded(self.credential.delete_credential(did, id))
            .await
    }

    pub async fn create_link(&self, request: CreateLinkRequest) -> Result<Link, NodeError> {
        self.bounded(self.links.create_link(request)).await
    }

    pub async fn activate_link(
        &self,
        did: String,
        id: String,
        active: bool,
    ) -> Result<Link, NodeError> {
        self.bounded(self.links.activate_link(did, id, active))
            .await
    }

    pub async fn get_link(&self, did: String, id: String) -> Result<Link, NodeError> {
        self.bounded(self.links.get_link(did, id)).await
    }

    pub async fn delete_link(&self, did: String, id: String) -> Result<(), NodeError> {
        self.bounded(self.links.delete_link(did, id)).await
    }

    pub async fn list_links(
        &self,
        did: String,
        filter: LinkFilter,
        query: Option<String>,
    ) -> Result<Vec<Link>, NodeError> {
        self.bounded(self.links.list_links(did, filter, query))
            .await
    }

    pub async fn create_link_qr_code(&self, link_id: String) -> Result<QrCode, NodeError> {
        self.bounded(self.links.create_qr_code(link_id)).await
    }

    pub async fn get_link_qr_code(&self, session_id: SessionID) -> Result<QrCodeStatus, NodeError> {
        self.bounded(self.links.get_qr_code(session_id)).await
    }

    pub async fn handle_authentication_callback(
        &self,
        session_id: SessionID,
        message: String,
    ) -> Result<LinkSession, NodeError> {
        self.bounded(self.links.handle_authentication_callback(session_id, message))
            .await
    }
}
