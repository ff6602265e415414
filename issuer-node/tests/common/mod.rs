#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, json};
use rst_common::with_tokio::tokio;

use prople_issuer_core::identity::link::types::{
    AuthenticationMessage, LinkError, ProtocolCodecBuilder, SessionID,
};
use prople_issuer_core::identity::publisher::types::{
    ChainClientBuilder, Confirmation, PublisherError, RhsClientBuilder,
};
use prople_issuer_core::identity::publisher::RhsNode;
use prople_issuer_core::identity::state::IdentityState;
use prople_issuer_core::merkle::Hash;

use prople_issuer_node::Node;

pub const ISSUER: &str = "did:iden3:polygon:amoy:issuer";
pub const SCHEMA: &str = "https://schema.example.com/kyc.json";

#[derive(Default)]
struct Ledger {
    submitted: Vec<(String, IdentityState)>,
    confirmations: HashMap<String, Confirmation>,
    latest: HashMap<String, Hash>,
    rejection: Option<String>,
    stalled: bool,
}

/// state contract kept in memory, confirmations are driven by the test
#[derive(Clone, Default)]
pub struct FakeChain {
    ledger: Arc<Mutex<Ledger>>,
}

impl FakeChain {
    pub fn reject_submissions(&self, reason: Option<&str>) {
        self.ledger.lock().unwrap().rejection = reason.map(|r| r.to_string());
    }

    pub fn stall_submissions(&self, stalled: bool) {
        self.ledger.lock().unwrap().stalled = stalled;
    }

    pub fn submissions(&self) -> usize {
        self.ledger.lock().unwrap().submitted.len()
    }

    pub fn confirm(&self, tx_id: &str, confirmation: Confirmation) {
        let mut ledger = self.ledger.lock().unwrap();
        if confirmation == Confirmation::Published {
            let state = ledger
                .submitted
                .iter()
                .find(|(id, _)| id == tx_id)
                .map(|(_, state)| state.clone())
                .unwrap();

            ledger.latest.insert(state.get_did(), state.get_state());
        }

        ledger
            .confirmations
            .insert(tx_id.to_string(), confirmation);
    }
}

#[async_trait]
impl ChainClientBuilder for FakeChain {
    async fn submit_state(&self, state: &IdentityState) -> Result<String, PublisherError> {
        let stalled = self.ledger.lock().unwrap().stalled;
        if stalled {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        let mut ledger = self.ledger.lock().unwrap();
        if let Some(reason) = ledger.rejection.clone() {
            return Err(PublisherError::ChainSubmissionError(reason));
        }

        let tx_id = format!("0x{:04}", ledger.submitted.len() + 1);
        ledger.submitted.push((tx_id.clone(), state.clone()));
        ledger
            .confirmations
            .insert(tx_id.clone(), Confirmation::Pending);

        Ok(tx_id)
    }

    async fn watch_confirmation(&self, tx_id: String) -> Result<Confirmation, PublisherError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .confirmations
            .get(&tx_id)
            .cloned()
            .unwrap_or(Confirmation::Pending))
    }

    async fn latest_state(&self, did: String) -> Result<Option<Hash>, PublisherError> {
        Ok(self.ledger.lock().unwrap().latest.get(&did).copied())
    }
}

#[derive(Clone, Default)]
pub struct FakeRhs {
    nodes: Arc<Mutex<HashMap<Hash, RhsNode>>>,
}

impl FakeRhs {
    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }
}

#[async_trait]
impl RhsClientBuilder for FakeRhs {
    async fn push_nodes(&self, _did: String, nodes: Vec<RhsNode>) -> Result<(), PublisherError> {
        let mut stored = self.nodes.lock().unwrap();
        for node in nodes {
            stored.insert(node.hash, node);
        }
        Ok(())
    }

    async fn get_node(&self, hash: Hash) -> Result<Option<RhsNode>, PublisherError> {
        Ok(self.nodes.lock().unwrap().get(&hash).cloned())
    }
}

/// holder messages travel as plain JSON
#[derive(Clone, Default)]
pub struct JsonCodec;

#[async_trait]
impl ProtocolCodecBuilder for JsonCodec {
    async fn decode_authentication(
        &self,
        message: String,
    ) -> Result<AuthenticationMessage, LinkError> {
        serde_json::from_str(&message).map_err(|err| LinkError::InvalidMessage(err.to_string()))
    }
}

pub fn auth_message(session_id: &SessionID, holder: &str) -> String {
    json!({
        "from": holder,
        "sessionID": session_id.as_str(),
        "body": {}
    })
    .to_string()
}

pub type TestNode = Node<FakeChain, FakeRhs, JsonCodec>;

pub fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

pub async fn start(name: &str) -> (TestNode, FakeChain, FakeRhs) {
    prople_issuer_node::init_tracing();

    let chain = FakeChain::default();
    let rhs = FakeRhs::default();
    let node = Node::from_file(fixture(name), chain.clone(), Some(rhs.clone()), JsonCodec).unwrap();
    node.bootstrap().await.unwrap();

    (node, chain, rhs)
}
