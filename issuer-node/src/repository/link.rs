use rst_common::standard::async_trait::async_trait;

use prople_issuer_core::identity::link::types::{
    LinkError, RepoBuilder, SessionID, SessionRepoBuilder, SessionStatus,
};
use prople_issuer_core::identity::link::{Link, LinkSession};

use super::table::Table;

fn repo_err(err: String) -> LinkError {
    LinkError::RepoError(err)
}

#[derive(Clone, Default)]
pub struct LinkRepository {
    links: Table<Link>,
}

impl LinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RepoBuilder for LinkRepository {
    async fn save_link(&self, link: &Link) -> Result<(), LinkError> {
        let id = link.get_id();
        self.links
            .upsert(link.to_owned(), |row| row.get_id() == id)
            .map_err(repo_err)
    }

    async fn get_link(&self, id: String) -> Result<Link, LinkError> {
        self.links
            .find(|row| row.get_id() == id)
            .map_err(repo_err)?
            .ok_or(LinkError::LinkNotFound(id))
    }

    async fn delete_link(&self, id: String) -> Result<(), LinkError> {
        let removed = self
            .links
            .remove(|row| row.get_id() == id)
            .map_err(repo_err)?;

        if !removed {
            return Err(LinkError::LinkNotFound(id));
        }

        Ok(())
    }

    async fn list_links(&self, did: String) -> Result<Vec<Link>, LinkError> {
        self.links
            .newest_first(|row| row.get_issuer_did() == did)
            .map_err(repo_err)
    }

    async fn try_increment_issued(&self, id: String) -> Result<Link, LinkError> {
        let mut links = self.links.lock().map_err(repo_err)?;
        let link = links
            .iter_mut()
            .find(|row| row.get_id() == id)
            .ok_or(LinkError::LinkNotFound(id))?;

        link.increment_issued()?;
        Ok(link.to_owned())
    }

    async fn set_active(&self, id: String, active: bool) -> Result<Link, LinkError> {
        let mut links = self.links.lock().map_err(repo_err)?;
        let link = links
            .iter_mut()
            .find(|row| row.get_id() == id)
            .ok_or(LinkError::LinkNotFound(id))?;

        link.set_active(active)?;
        Ok(link.to_owned())
    }
}

#[derive(Clone, Default)]
pub struct SessionRepository {
    sessions: Table<LinkSession>,
}

impl SessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepoBuilder for SessionRepository {
    async fn save_session(&self, session: &LinkSession) -> Result<(), LinkError> {
        let id = session.get_id();
        self.sessions
            .upsert(session.to_owned(), |row| row.get_id() == id)
            .map_err(repo_err)
    }

    async fn get_session(&self, id: SessionID) -> Result<LinkSession, LinkError> {
        self.sessions
            .find(|row| row.get_id() == id)
            .map_err(repo_err)?
            .ok_or_else(|| LinkError::SessionNotFound(id.as_str().to_string()))
    }

    async fn list_sessions_by_status(
        &self,
        status: SessionStatus,
    ) -> Result<Vec<LinkSession>, LinkError> {
        self.sessions
            .newest_first(|row| row.get_status() == status)
            .map_err(repo_err)
    }
}
