use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::types::StatusError;

/// `StatusType` is the `credentialStatus.type` written into issued credentials
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub enum StatusType {
    #[serde(rename = "SparseMerkleTreeProof")]
    SparseMerkleTreeProof,

    #[serde(rename = "Iden3commRevocationStatusV1.0")]
    Iden3commRevocationStatusV1,

    #[serde(rename = "Iden3ReverseSparseMerkleTreeProof")]
    Iden3ReverseSparseMerkleTreeProof,

    #[serde(rename = "Iden3OnchainSparseMerkleTreeProof2023")]
    Iden3OnchainSparseMerkleTreeProof2023,

    #[serde(rename = "None")]
    None,
}

impl StatusType {
    /// `is_direct` is `true` for the types served by the issuer itself
    pub fn is_direct(&self) -> bool {
        matches!(
            self,
            StatusType::SparseMerkleTreeProof | StatusType::Iden3commRevocationStatusV1
        )
    }
}

/// `RhsMode` tells where the reverse hash service keeps the identity trees
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub enum RhsMode {
    OffChain,
    OnChain,
    Mixed,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct OnchainTreeStore {
    pub contract_address: String,
    pub chain_id: u64,
}

/// `StatusSettings` is the issuer configuration of credential statuses
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct StatusSettings {
    pub status_type: StatusType,
    pub rhs_mode: RhsMode,
    pub direct_url: String,
    pub rhs_url: Option<String>,
    pub onchain: Option<OnchainTreeStore>,
}

impl StatusSettings {
    pub fn new(status_type: StatusType, rhs_mode: RhsMode, direct_url: String) -> Self {
        Self {
            status_type,
            rhs_mode,
            direct_url,
            rhs_url: None,
            onchain: None,
        }
    }

    pub fn with_rhs_url(mut self, url: String) -> Self {
        self.rhs_url = Some(url);
        self
    }

    pub fn with_onchain(mut self, contract_address: String, chain_id: u64) -> Self {
        self.onchain = Some(OnchainTreeStore {
            contract_address,
            chain_id,
        });
        self
    }

    /// `kind` resolves the settings into the closed set of resolution strategies,
    /// inconsistent combinations are rejected here instead of at resolution time
    pub fn kind(&self) -> Result<StatusKind, StatusError> {
        if self.status_type == StatusType::None {
            return Ok(StatusKind::None);
        }

        if self.direct_url.is_empty() && self.status_type.is_direct() {
            return Err(StatusError::InvalidSettings(
                "direct_url is required for direct status types".to_string(),
            ));
        }

        let kind = match self.rhs_mode {
            RhsMode::None => {
                if !self.status_type.is_direct() {
                    return Err(StatusError::InvalidSettings(format!(
                        "{:?} requires an rhs mode",
                        self.status_type
                    )));
                }

                StatusKind::Direct
            }
            RhsMode::OffChain => {
                if self.status_type == StatusType::Iden3OnchainSparseMerkleTreeProof2023 {
                    return Err(StatusError::InvalidSettings(
                        "onchain status type requires the OnChain rhs mode".to_string(),
                    ));
                }

                StatusKind::RhsOffChain {
                    url: self.require_rhs_url()?,
                }
            }
            RhsMode::OnChain => {
                let store = self.require_onchain()?;
                StatusKind::RhsOnChain {
                    contract_address: store.contract_address,
                    chain_id: store.chain_id,
                }
            }
            RhsMode::Mixed => {
                let url = self.require_rhs_url()?;
                let store = self.require_onchain()?;
                StatusKind::Mixed {
                    url,
                    contract_address: store.contract_address,
                    chain_id: store.chain_id,
                }
            }
        };

        Ok(kind)
    }

    fn require_rhs_url(&self) -> Result<String, StatusError> {
        match &self.rhs_url {
            Some(url) if !url.is_empty() => Ok(url.to_owned()),
            _ => Err(StatusError::InvalidSettings(
                "rhs_url is required by the configured rhs mode".to_string(),
            )),
        }
    }

    fn require_onchain(&self) -> Result<OnchainTreeStore, StatusError> {
        match &self.onchain {
            Some(store) if !store.contract_address.is_empty() => Ok(store.to_owned()),
            _ => Err(StatusError::InvalidSettings(
                "onchain tree store is required by the configured rhs mode".to_string(),
            )),
        }
    }
}

/// `StatusKind` is one variant per revocation status resolution strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    Direct,
    RhsOffChain {
        url: String,
    },
    RhsOnChain {
        contract_address: String,
        chain_id: u64,
    },
    Mixed {
        url: String,
        contract_address: String,
        chain_id: u64,
    },
    None,
}

impl StatusKind {
    /// `requires_publish` is `true` when verifiers only see revocations after the
    /// identity state has been published
    pub fn requires_publish(&self) -> bool {
        matches!(
            self,
            StatusKind::RhsOffChain { .. } | StatusKind::RhsOnChain { .. } | StatusKind::Mixed { .. }
        )
    }

    /// `pushes_to_rhs` is `true` when each publish must push its nodes to an off chain RHS
    pub fn pushes_to_rhs(&self) -> bool {
        matches!(self, StatusKind::RhsOffChain { .. } | StatusKind::Mixed { .. })
    }
}
