use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::settings::{StatusKind, StatusSettings, StatusType};

/// `StatusDescriptor` is the `credentialStatus` object embedded in a credential,
/// it tells a verifier where and how to check the revocation nonce
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct StatusDescriptor {
    pub id: String,

    #[serde(rename = "type")]
    pub status_type: StatusType,

    #[serde(rename = "revocationNonce")]
    pub revocation_nonce: u64,

    #[serde(rename = "statusIssuer")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_issuer: Option<Box<StatusDescriptor>>,
}

fn direct(settings: &StatusSettings, did: &str, nonce: u64) -> StatusDescriptor {
    let base_url = settings.direct_url.trim_end_matches('/');
    match settings.status_type {
        StatusType::Iden3commRevocationStatusV1 => StatusDescriptor {
            id: format!("{}/v1/agent", base_url),
            status_type: StatusType::Iden3commRevocationStatusV1,
            revocation_nonce: nonce,
            status_issuer: None,
        },
        _ => StatusDescriptor {
            id: format!(
                "{}/v1/{}/claims/revocation/status/{}",
                base_url, did, nonce
            ),
            status_type: StatusType::SparseMerkleTreeProof,
            revocation_nonce: nonce,
            status_issuer: None,
        },
    }
}

/// `build_descriptor` builds the credential status of a new credential, there is
/// nothing to embed when revocation checking is disabled
pub fn build_descriptor(
    settings: &StatusSettings,
    kind: &StatusKind,
    did: &str,
    nonce: u64,
) -> Option<StatusDescriptor> {
    match kind {
        StatusKind::None => None,
        StatusKind::Direct => Some(direct(settings, did, nonce)),
        StatusKind::RhsOffChain { url } | StatusKind::Mixed { url, .. } => {
            let status_issuer = if settings.direct_url.is_empty() {
                None
            } else {
                Some(Box::new(direct(settings, did, nonce)))
            };

            Some(StatusDescriptor {
                id: url.trim_end_matches('/').to_string(),
                status_type: StatusType::Iden3ReverseSparseMerkleTreeProof,
                revocation_nonce: nonce,
                status_issuer,
            })
        }
        StatusKind::RhsOnChain {
            contract_address,
            chain_id,
        } => Some(StatusDescriptor {
            id: format!(
                "{}/credentialStatus?revocationNonce={}&contractAddress={}:{}",
                did, nonce, chain_id, contract_address
            ),
            status_type: StatusType::Iden3OnchainSparseMerkleTreeProof2023,
            revocation_nonce: nonce,
            status_issuer: None,
        }),
    }
}
