use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{Duration, Utc};
use rst_common::with_logging::log::{debug, info, warn};

use crate::identity::locks::IdentityLocks;
use crate::identity::publisher::types::{PublisherAPI, PublisherError, TransactionStatus};
use crate::identity::publisher::TransactionRecord;
use crate::identity::verifiable::credential::types::{CredentialAPI, IssueRequest};
use crate::identity::verifiable::status::StatusKind;

use super::protocol::{authorization_request, credential_offer};
use super::types::{
    CreateLinkRequest, LinkAPI, LinkError, LinkFilter, ProtocolCodecBuilder, QrCode, QrCodeStatus,
    RepoBuilder, SessionID, SessionRepoBuilder, SessionStatus,
};
use super::{Link, LinkSession};

/// Default lifetime of a session waiting for its holder
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

fn publisher_err(err: impl ToString) -> LinkError {
    LinkError::PublisherError(err.to_string())
}

fn credential_err(err: impl ToString) -> LinkError {
    LinkError::CredentialError(err.to_string())
}

#[derive(Clone, Debug)]
pub struct LinkSettings {
    pub server_url: String,
    pub session_ttl: Duration,
    pub status_kind: StatusKind,
}

impl LinkSettings {
    pub fn new(server_url: String, status_kind: StatusKind) -> Self {
        Self {
            server_url,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            status_kind,
        }
    }

    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

#[derive(Clone)]
pub struct Usecase<TRepo, TSessions, TCredential, TPublisher, TCodec>
where
    TRepo: RepoBuilder,
    TSessions: SessionRepoBuilder,
    TCredential: CredentialAPI,
    TPublisher: PublisherAPI,
    TCodec: ProtocolCodecBuilder,
{
    repo: TRepo,
    sessions: TSessions,
    credential: TCredential,
    publisher: TPublisher,
    codec: TCodec,
    settings: LinkSettings,
    locks: IdentityLocks,
}

impl<TRepo, TSessions, TCredential, TPublisher, TCodec>
    Usecase<TRepo, TSessions, TCredential, TPublisher, TCodec>
where
    TRepo: RepoBuilder,
    TSessions: SessionRepoBuilder,
    TCredential: CredentialAPI,
    TPublisher: PublisherAPI,
    TCodec: ProtocolCodecBuilder,
{
    pub fn new(
        repo: TRepo,
        sessions: TSessions,
        credential: TCredential,
        publisher: TPublisher,
        codec: TCodec,
        settings: LinkSettings,
    ) -> Self {
        Self {
            repo,
            sessions,
            credential,
            publisher,
            codec,
            settings,
            locks: IdentityLocks::new(),
        }
    }

    async fn owned_link(&self, did: String, id: String) -> Result<Link, LinkError> {
        let link = self.repo.get_link(id.to_owned()).await?;
        if link.issuer_did != did {
            return Err(LinkError::LinkNotFound(id));
        }

        Ok(link)
    }

    /// `abort` fails the session with `err` and hands the error back to the caller
    async fn abort(&self, mut session: LinkSession, err: LinkError) -> Result<LinkSession, LinkError> {
        session.fail(err.to_string())?;
        self.sessions.save_session(&session).await?;

        info!("session {} failed: {}", session.id.as_str(), err);
        Err(err)
    }

    async fn done(&self, session: &LinkSession) -> Result<QrCodeStatus, LinkError> {
        let credential_id = session.credential_id.to_owned().ok_or_else(|| {
            LinkError::InvalidSessionState("session has no issued credential".to_string())
        })?;

        let credential = self
            .credential
            .get_credential(credential_id)
            .await
            .map_err(credential_err)?;

        let payload = credential_offer(&self.settings.server_url, &session.id, &credential)?;
        Ok(QrCodeStatus {
            status: SessionStatus::Done,
            payload,
            credential: Some(credential),
        })
    }

    /// `follow_latest_record` binds an issued session to the newest publish of its
    /// issuer, used when that publish already carries the session's claim
    async fn follow_latest_record(&self, mut session: LinkSession) -> Result<LinkSession, LinkError> {
        let records = self
            .publisher
            .get_state_transactions(session.issuer_did.to_owned())
            .await
            .map_err(publisher_err)?;

        let latest = match records.into_iter().next() {
            Some(record) => record,
            None => {
                session.await_publish(None)?;
                return Ok(session);
            }
        };

        session.await_publish(Some(latest.id.to_owned()))?;
        match latest.status {
            TransactionStatus::Published => session.complete()?,
            TransactionStatus::Failed => {
                let reason = latest.error.unwrap_or_default();
                return self.abort(session, LinkError::SessionFailed(reason)).await;
            }
            _ => {}
        }

        debug!(
            "session {} follows transaction {}",
            session.id.as_str(),
            latest.id
        );
        Ok(session)
    }

    fn waiting(session: &LinkSession) -> QrCodeStatus {
        QrCodeStatus {
            status: session.status,
            payload: session.qr_payload.to_owned(),
            credential: None,
        }
    }
}

#[async_trait]
impl<TRepo, TSessions, TCredential, TPublisher, TCodec> LinkAPI
    for Usecase<TRepo, TSessions, TCredential, TPublisher, TCodec>
where
    TRepo: RepoBuilder,
    TSessions: SessionRepoBuilder,
    TCredential: CredentialAPI,
    TPublisher: PublisherAPI,
    TCodec: ProtocolCodecBuilder,
{
    async fn create_link(&self, request: CreateLinkRequest) -> Result<Link, LinkError> {
        let link = Link::generate(request, Utc::now())?;
        self.repo.save_link(&link).await?;

        info!("link {} created by {}", link.id, link.issuer_did);
        Ok(link)
    }

    async fn activate_link(&self, did: String, id: String, active: bool) -> Result<Link, LinkError> {
        let link = self.owned_link(did, id).await?;
        let link = self.repo.set_active(link.id, active).await?;

        info!("link {} active: {}", link.id, active);
        Ok(link)
    }

    async fn get_link(&self, did: String, id: String) -> Result<Link, LinkError> {
        self.owned_link(did, id).await
    }

    async fn delete_link(&self, did: String, id: String) -> Result<(), LinkError> {
        let link = self.owned_link(did, id).await?;
        self.repo.delete_link(link.id.to_owned()).await?;

        info!("link {} deleted", link.id);
        Ok(())
    }

    async fn list_links(
        &self,
        did: String,
        filter: LinkFilter,
        query: Option<String>,
    ) -> Result<Vec<Link>, LinkError> {
        let now = Utc::now();
        let query = query.unwrap_or_default();
        let links = self.repo.list_links(did).await?;
        Ok(links
            .into_iter()
            .filter(|link| link.matches(filter, now) && link.matches_query(&query))
            .collect())
    }

    async fn create_qr_code(&self, link_id: String) -> Result<QrCode, LinkError> {
        let link = self.repo.get_link(link_id).await?;
        link.check_available(Utc::now())?;

        let session_id = SessionID::generate();
        let qr_payload = authorization_request(
            &self.settings.server_url,
            &session_id,
            &link.id,
            &link.issuer_did,
        )?;

        let session = LinkSession::new(
            session_id.to_owned(),
            &link,
            qr_payload.to_owned(),
            self.settings.session_ttl,
        );
        self.sessions.save_session(&session).await?;

        debug!("session {} opened on link {}", session_id.as_str(), link.id);
        Ok(QrCode {
            session_id,
            qr_payload,
            link,
        })
    }

    async fn handle_authentication_callback(
        &self,
        session_id: SessionID,
        message: String,
    ) -> Result<LinkSession, LinkError> {
        let _guard = self.locks.acquire(session_id.as_str()).await;

        let now = Utc::now();
        let session = self.sessions.get_session(session_id.to_owned()).await?;
        if session.is_expired(now) {
            return Err(LinkError::SessionExpired);
        }

        if session.status != SessionStatus::Pending {
            return Err(LinkError::InvalidSessionState(format!(
                "session is {:?}",
                session.status
            )));
        }

        let auth = self.codec.decode_authentication(message).await?;
        if auth.session_id != session_id.as_str() {
            return Err(LinkError::InvalidMessage(
                "session id does not match".to_string(),
            ));
        }

        if auth.from.is_empty() {
            return Err(LinkError::InvalidMessage("sender was missing".to_string()));
        }

        let link = self.repo.get_link(session.link_id.to_owned()).await?;
        if let Err(err) = link.check_available(now) {
            return self.abort(session, err).await;
        }

        let link = match self.repo.try_increment_issued(link.id.to_owned()).await {
            Ok(link) => link,
            Err(LinkError::LinkMaxExceeded) => {
                return self.abort(session, LinkError::LinkMaxExceeded).await
            }
            Err(err) => return Err(err),
        };

        let request = IssueRequest {
            issuer_did: link.issuer_did.to_owned(),
            subject_did: auth.from.to_owned(),
            schema_id: link.schema_id.to_owned(),
            claim_data: link.claim_data(&auth.from),
            expiration: link.credential_expiration,
        };

        let credential = match self.credential.issue_credential(request).await {
            Ok(credential) => credential,
            Err(err) => return self.abort(session, credential_err(err)).await,
        };

        let mut session = session;
        session.issued(auth.from, credential.id.to_owned())?;

        if self.settings.status_kind.requires_publish() || link.mt_proof {
            match self.publisher.publish_state(link.issuer_did.to_owned()).await {
                Ok(record) => session.await_publish(Some(record.id))?,
                Err(PublisherError::StateBeingProcessed) => {
                    debug!(
                        "session {} waits for the next publish of {}",
                        session_id.as_str(),
                        link.issuer_did
                    );
                    session.await_publish(None)?
                }
                // a concurrent issuance already published the state holding this claim
                Err(PublisherError::NoStatesToProcess) => {
                    session = self.follow_latest_record(session).await?
                }
                Err(err) => return self.abort(session, publisher_err(err)).await,
            }
        } else {
            session.complete()?;
        }

        self.sessions.save_session(&session).await?;

        info!(
            "session {} issued credential {}, status: {:?}",
            session_id.as_str(),
            credential.id,
            session.status
        );
        Ok(session)
    }

    async fn get_qr_code(&self, session_id: SessionID) -> Result<QrCodeStatus, LinkError> {
        let session = self.sessions.get_session(session_id).await?;

        match session.status {
            SessionStatus::Failed => Err(LinkError::SessionFailed(
                session.failure.unwrap_or_default(),
            )),
            SessionStatus::Done => self.done(&session).await,
            SessionStatus::Pending => {
                if session.is_expired(Utc::now()) {
                    return Err(LinkError::SessionExpired);
                }

                Ok(Self::waiting(&session))
            }
            SessionStatus::PendingPublish => {
                let records = self
                    .publisher
                    .get_state_transactions(session.issuer_did.to_owned())
                    .await
                    .map_err(publisher_err)?;

                // records are newest first, the oldest match is the awaited one
                let record = records.iter().filter(|r| session.waits_on(r)).last();
                match record.map(|r| (r.status, r.error.to_owned())) {
                    Some((TransactionStatus::Published, _)) => self.done(&session).await,
                    Some((TransactionStatus::Failed, error)) => {
                        Err(LinkError::SessionFailed(error.unwrap_or_default()))
                    }
                    _ => Ok(Self::waiting(&session)),
                }
            }
        }
    }

    async fn on_transaction_finalized(
        &self,
        record: &TransactionRecord,
    ) -> Result<Vec<LinkSession>, LinkError> {
        if !record.is_terminal() {
            return Ok(Vec::new());
        }

        let waiting = self
            .sessions
            .list_sessions_by_status(SessionStatus::PendingPublish)
            .await?;

        let mut settled = Vec::new();
        for candidate in waiting.iter().filter(|s| s.waits_on(record)) {
            let _guard = self.locks.acquire(candidate.id.as_str()).await;

            let mut session = self.sessions.get_session(candidate.id.to_owned()).await?;
            match session.settle(record) {
                Ok(true) => {
                    self.sessions.save_session(&session).await?;
                    info!(
                        "session {} settled as {:?} by transaction {}",
                        session.id.as_str(),
                        session.status,
                        record.id
                    );
                    settled.push(session);
                }
                Ok(false) => {}
                Err(err) => warn!("unable to settle session {}: {}", session.id.as_str(), err),
            }
        }

        Ok(settled)
    }
}
