use rst_common::standard::serde::{self, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::standard::uuid::Uuid;

use crate::identity::verifiable::credential::Credential;

use super::types::{LinkError, SessionID};

pub const MEDIA_TYPE_PLAIN: &str = "application/iden3comm-plain-json";
pub const AUTHORIZATION_REQUEST: &str = "https://iden3-communication.io/authorization/1.0/request";
pub const CREDENTIAL_OFFER: &str = "https://iden3-communication.io/credentials/1.0/offer";

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct AuthorizationBody {
    #[serde(rename = "callbackUrl")]
    callback_url: String,
    reason: String,
    scope: Vec<Value>,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct OfferedCredential {
    id: String,
    description: String,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct OfferBody {
    url: String,
    credentials: Vec<OfferedCredential>,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct Message<B: Serialize> {
    id: String,
    thid: String,
    typ: &'static str,

    #[serde(rename = "type")]
    message_type: &'static str,

    from: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<String>,

    body: B,
}

impl<B: Serialize> Message<B> {
    fn new(message_type: &'static str, thid: String, from: String, body: B) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thid,
            typ: MEDIA_TYPE_PLAIN,
            message_type,
            from,
            to: None,
            body,
        }
    }

    fn to_value(&self) -> Result<Value, LinkError> {
        serde_json::to_value(self).map_err(|err| LinkError::EntityError(err.to_string()))
    }
}

pub fn callback_url(server_url: &str, session_id: &SessionID, link_id: &str) -> String {
    format!(
        "{}/v1/credentials/links/callback?sessionID={}&linkID={}",
        server_url.trim_end_matches('/'),
        session_id.as_str(),
        link_id
    )
}

/// `authorization_request` is the QR code payload asking the holder to authenticate
pub fn authorization_request(
    server_url: &str,
    session_id: &SessionID,
    link_id: &str,
    issuer_did: &str,
) -> Result<Value, LinkError> {
    let body = AuthorizationBody {
        callback_url: callback_url(server_url, session_id, link_id),
        reason: "authentication".to_string(),
        scope: Vec::new(),
    };

    Message::new(
        AUTHORIZATION_REQUEST,
        session_id.as_str().to_string(),
        issuer_did.to_string(),
        body,
    )
    .to_value()
}

/// `credential_offer` tells the holder where to fetch the issued credential
pub fn credential_offer(
    server_url: &str,
    session_id: &SessionID,
    credential: &Credential,
) -> Result<Value, LinkError> {
    let body = OfferBody {
        url: format!("{}/v1/agent", server_url.trim_end_matches('/')),
        credentials: vec![OfferedCredential {
            id: credential.id.to_owned(),
            description: credential.schema_id.to_owned(),
        }],
    };

    let mut message = Message::new(
        CREDENTIAL_OFFER,
        session_id.as_str().to_string(),
        credential.issuer_did.to_owned(),
        body,
    );
    message.to = Some(credential.subject_did.to_owned());
    message.to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;

    use crate::identity::verifiable::credential::types::IssueRequest;

    #[test]
    fn test_authorization_request() {
        let session_id = SessionID::from("session".to_string());
        let payload = authorization_request(
            "https://issuer.example.com/",
            &session_id,
            "link",
            "did:iden3:issuer",
        )
        .unwrap();

        assert_eq!(payload["typ"], json!(MEDIA_TYPE_PLAIN));
        assert_eq!(payload["type"], json!(AUTHORIZATION_REQUEST));
        assert_eq!(payload["thid"], json!("session"));
        assert_eq!(
            payload["body"]["callbackUrl"],
            json!("https://issuer.example.com/v1/credentials/links/callback?sessionID=session&linkID=link")
        );
        assert!(payload.get("to").is_none())
    }

    #[test]
    fn test_credential_offer() {
        let request = IssueRequest {
            issuer_did: "did:iden3:issuer".to_string(),
            subject_did: "did:iden3:holder".to_string(),
            schema_id: "https://schema.example.com/kyc.json".to_string(),
            claim_data: json!({"birthday": 19960424}),
            expiration: None,
        };
        let credential = Credential::generate(request, 1).unwrap();

        let session_id = SessionID::generate();
        let payload =
            credential_offer("https://issuer.example.com", &session_id, &credential).unwrap();

        assert_eq!(payload["type"], json!(CREDENTIAL_OFFER));
        assert_eq!(payload["to"], json!("did:iden3:holder"));
        assert_eq!(payload["body"]["url"], json!("https://issuer.example.com/v1/agent"));
        assert_eq!(
            payload["body"]["credentials"][0]["id"],
            json!(credential.get_id())
        )
    }
}
