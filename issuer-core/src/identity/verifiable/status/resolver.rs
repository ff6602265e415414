use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, error};

use crate::identity::publisher::types::{ChainClientBuilder, RhsClientBuilder};
use crate::identity::publisher::RhsReader;
use crate::identity::state::types::{RepoBuilder as IdentityRepoBuilder, StateStatus};
use crate::identity::state::IdentityState;
use crate::identity::verifiable::credential::Credential;
use crate::merkle::types::{MerkleError, NodeReader, NodeStorage, MAX_LEVELS};
use crate::merkle::{generate_proof, Hash};

use super::descriptor::build_descriptor;
use super::types::{IssuerStateInfo, ResolverAPI, RevocationStatus, StatusError};
use super::{StatusKind, StatusSettings};

fn unreachable_err(err: impl ToString) -> StatusError {
    StatusError::CredentialStatusResolutionError(err.to_string())
}

fn identity_err(err: impl ToString) -> StatusError {
    StatusError::IdentityError(err.to_string())
}

/// `Resolver` builds revocation statuses following the issuer status settings
///
/// Each [`StatusKind`] has its own resolution function. Proofs served from the
/// local trees read a root snapshot, they never wait for writers.
#[derive(Clone)]
pub struct Resolver<TIdentityRepo, TNodes, TChain, TRhs>
where
    TIdentityRepo: IdentityRepoBuilder,
    TNodes: NodeStorage,
    TChain: ChainClientBuilder,
    TRhs: RhsClientBuilder,
{
    identity_repo: TIdentityRepo,
    nodes: TNodes,
    chain: TChain,
    rhs: Option<TRhs>,
    settings: StatusSettings,
    kind: StatusKind,
}

impl<TIdentityRepo, TNodes, TChain, TRhs> Resolver<TIdentityRepo, TNodes, TChain, TRhs>
where
    TIdentityRepo: IdentityRepoBuilder,
    TNodes: NodeStorage,
    TChain: ChainClientBuilder,
    TRhs: RhsClientBuilder,
{
    pub fn new(
        identity_repo: TIdentityRepo,
        nodes: TNodes,
        chain: TChain,
        rhs: Option<TRhs>,
        settings: StatusSettings,
    ) -> Result<Self, StatusError> {
        let kind = settings.kind()?;
        if kind.pushes_to_rhs() && rhs.is_none() {
            return Err(StatusError::InvalidSettings(
                "rhs client is required by the configured rhs mode".to_string(),
            ));
        }

        Ok(Self {
            identity_repo,
            nodes,
            chain,
            rhs,
            settings,
            kind,
        })
    }

    fn rhs(&self) -> Result<&TRhs, StatusError> {
        self.rhs
            .as_ref()
            .ok_or_else(|| StatusError::InvalidSettings("rhs client is missing".to_string()))
    }

    async fn prove<R>(
        &self,
        reader: &R,
        issuer: IssuerStateInfo,
        nonce: u64,
    ) -> Result<RevocationStatus, StatusError>
    where
        R: NodeReader,
    {
        let key = Hash::from_u64(nonce);
        let root = issuer.revocation_tree_root;

        let (mtp, value) = generate_proof(reader, &root, &key, MAX_LEVELS)
            .await
            .map_err(|err| match err {
                MerkleError::StorageError(_) | MerkleError::NodeNotFound(_) => unreachable_err(err),
                MerkleError::IntegrityError(msg) => {
                    error!("corrupted revocation tree {}: {}", root, msg);
                    StatusError::IntegrityError(msg)
                }
                _ => StatusError::MerkleError(err.to_string()),
            })?;

        if !mtp.verify(&root, &key, &value.unwrap_or_else(Hash::zero)) {
            error!(
                "revocation proof of nonce {} does not verify against {}",
                nonce, root
            );

            return Err(StatusError::IntegrityError(format!(
                "proof does not match revocation root {}",
                root
            )));
        }

        Ok(RevocationStatus::Proof { issuer, mtp })
    }

    /// `state_from_rhs` reads the roots committed by `state` from the RHS
    async fn state_from_rhs(&self, state: Hash) -> Result<IssuerStateInfo, StatusError> {
        let node = self
            .rhs()?
            .get_node(state)
            .await
            .map_err(unreachable_err)?
            .ok_or_else(|| unreachable_err(format!("state {} is not known by the rhs", state)))?;

        let (claims, revocation, roots) = node.state_roots().map_err(|err| {
            error!("rhs returned a corrupted state node {}: {}", state, err);
            StatusError::IntegrityError(err.to_string())
        })?;

        Ok(IssuerStateInfo {
            state,
            claims_tree_root: claims,
            revocation_tree_root: revocation,
            root_of_roots: roots,
        })
    }

    async fn resolve_direct(&self, did: String, nonce: u64) -> Result<RevocationStatus, StatusError> {
        let identity = self
            .identity_repo
            .get_identity(did)
            .await
            .map_err(identity_err)?;

        let issuer = IssuerStateInfo {
            state: identity.compute_state().map_err(identity_err)?,
            claims_tree_root: identity.claims_root,
            revocation_tree_root: identity.revocation_root,
            root_of_roots: identity.roots_root,
        };

        self.prove(&self.nodes, issuer, nonce).await
    }

    /// `resolve_rhs_off_chain` anchors on the latest state already pushed to the RHS
    async fn resolve_rhs_off_chain(
        &self,
        did: String,
        nonce: u64,
    ) -> Result<RevocationStatus, StatusError> {
        let states = self
            .identity_repo
            .list_states(did.to_owned())
            .await
            .map_err(identity_err)?;

        let anchor = states
            .iter()
            .find(|s| matches!(s.status, StateStatus::PendingPublish | StateStatus::Published))
            .ok_or_else(|| StatusError::StateNotFound(did.to_owned()))?;

        let issuer = if anchor.is_genesis() {
            state_info(anchor)
        } else {
            self.state_from_rhs(anchor.state).await?
        };

        debug!("resolving nonce {} of {} against rhs state {}", nonce, did, issuer.state);
        self.prove(&RhsReader::new(self.rhs()?), issuer, nonce).await
    }

    /// `resolve_mixed` anchors on the state the chain knows, the tree itself is read from the RHS
    async fn resolve_mixed(&self, did: String, nonce: u64) -> Result<RevocationStatus, StatusError> {
        let onchain = self
            .chain
            .latest_state(did.to_owned())
            .await
            .map_err(unreachable_err)?;

        let issuer = match onchain {
            Some(state) => self.state_from_rhs(state).await?,
            None => {
                let states = self
                    .identity_repo
                    .list_states(did.to_owned())
                    .await
                    .map_err(identity_err)?;

                let genesis = states
                    .iter()
                    .find(|s| s.is_genesis())
                    .ok_or_else(|| StatusError::StateNotFound(did.to_owned()))?;

                state_info(genesis)
            }
        };

        debug!("resolving nonce {} of {} against chain state {}", nonce, did, issuer.state);
        self.prove(&RhsReader::new(self.rhs()?), issuer, nonce).await
    }

    async fn resolve_on_chain(
        &self,
        did: String,
        nonce: u64,
        contract_address: String,
        chain_id: u64,
    ) -> Result<RevocationStatus, StatusError> {
        let state = self
            .chain
            .latest_state(did)
            .await
            .map_err(unreachable_err)?;

        Ok(RevocationStatus::OnChain {
            contract_address,
            chain_id,
            state,
            revocation_nonce: nonce,
        })
    }
}

fn state_info(state: &IdentityState) -> IssuerStateInfo {
    IssuerStateInfo {
        state: state.state,
        claims_tree_root: state.claims_root,
        revocation_tree_root: state.revocation_root,
        root_of_roots: state.roots_root,
    }
}

#[async_trait]
impl<TIdentityRepo, TNodes, TChain, TRhs> ResolverAPI for Resolver<TIdentityRepo, TNodes, TChain, TRhs>
where
    TIdentityRepo: IdentityRepoBuilder,
    TNodes: NodeStorage,
    TChain: ChainClientBuilder,
    TRhs: RhsClientBuilder,
{
    fn kind(&self) -> StatusKind {
        self.kind.to_owned()
    }

    fn build_descriptor(&self, did: String, nonce: u64) -> Option<super::StatusDescriptor> {
        build_descriptor(&self.settings, &self.kind, &did, nonce)
    }

    async fn resolve(&self, credential: &Credential) -> Result<RevocationStatus, StatusError> {
        self.resolve_nonce(credential.issuer_did.to_owned(), credential.revocation_nonce)
            .await
    }

    async fn resolve_nonce(&self, did: String, nonce: u64) -> Result<RevocationStatus, StatusError> {
        match self.kind.to_owned() {
            StatusKind::None => Ok(RevocationStatus::Disabled),
            StatusKind::Direct => self.resolve_direct(did, nonce).await,
            StatusKind::RhsOffChain { .. } => self.resolve_rhs_off_chain(did, nonce).await,
            StatusKind::Mixed { .. } => self.resolve_mixed(did, nonce).await,
            StatusKind::RhsOnChain {
                contract_address,
                chain_id,
            } => {
                self.resolve_on_chain(did, nonce, contract_address, chain_id)
                    .await
            }
        }
    }
}
