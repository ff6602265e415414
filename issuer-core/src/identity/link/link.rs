use rst_common::standard::chrono::serde::{ts_seconds, ts_seconds_option};
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};
use rst_common::standard::uuid::Uuid;

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use super::types::{CreateLinkRequest, LinkError, LinkFilter};

/// `Link` is a reusable issuance template, every holder scanning one of its QR
/// codes receives a credential built from it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Link {
    pub(crate) id: String,

    #[serde(rename = "issuerDID")]
    pub(crate) issuer_did: String,

    #[serde(rename = "schemaID")]
    pub(crate) schema_id: String,

    #[serde(rename = "credentialSubject")]
    pub(crate) credential_subject: Value,

    #[serde(rename = "signatureProof")]
    pub(crate) signature_proof: bool,

    #[serde(rename = "mtProof")]
    pub(crate) mt_proof: bool,

    #[serde(rename = "maxIssuance")]
    pub(crate) max_issuance: Option<u64>,

    #[serde(rename = "issuedClaims")]
    pub(crate) issued_claims: u64,

    #[serde(with = "ts_seconds_option")]
    #[serde(rename = "validUntil")]
    pub(crate) valid_until: Option<DateTime<Utc>>,

    #[serde(with = "ts_seconds_option")]
    #[serde(rename = "credentialExpiration")]
    pub(crate) credential_expiration: Option<DateTime<Utc>>,

    pub(crate) active: bool,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "createdAt")]
    pub(crate) created_at: DateTime<Utc>,

    #[serde(with = "ts_seconds")]
    #[serde(rename = "updatedAt")]
    pub(crate) updated_at: DateTime<Utc>,
}

impl Link {
    pub fn generate(request: CreateLinkRequest, now: DateTime<Utc>) -> Result<Self, LinkError> {
        if request.issuer_did.is_empty() {
            return Err(LinkError::ValidationError("issuer_did was missing".to_string()));
        }

        if request.schema_id.is_empty() {
            return Err(LinkError::ValidationError("schema_id was missing".to_string()));
        }

        if !request.signature_proof && !request.mt_proof {
            return Err(LinkError::ValidationError(
                "at least one proof type must be requested".to_string(),
            ));
        }

        match request.credential_subject.as_object() {
            Some(subject) if !subject.is_empty() => {}
            _ => {
                return Err(LinkError::ValidationError(
                    "credential_subject must be a non empty object".to_string(),
                ))
            }
        }

        if request.max_issuance == Some(0) {
            return Err(LinkError::ValidationError(
                "max_issuance must be greater than zero".to_string(),
            ));
        }

        if let Some(valid_until) = request.valid_until {
            if valid_until <= now {
                return Err(LinkError::ValidationError(
                    "valid_until must be in the future".to_string(),
                ));
            }
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            issuer_did: request.issuer_did,
            schema_id: request.schema_id,
            credential_subject: request.credential_subject,
            signature_proof: request.signature_proof,
            mt_proof: request.mt_proof,
            max_issuance: request.max_issuance,
            issued_claims: 0,
            valid_until: request.valid_until,
            credential_expiration: request.credential_expiration,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map(|until| until <= now).unwrap_or(false)
    }

    pub fn is_exceeded(&self) -> bool {
        self.max_issuance
            .map(|max| self.issued_claims >= max)
            .unwrap_or(false)
    }

    /// `check_available` tells whether the link may still issue a credential at `now`
    pub fn check_available(&self, now: DateTime<Utc>) -> Result<(), LinkError> {
        if !self.active {
            return Err(LinkError::LinkInactive);
        }

        if self.is_expired(now) {
            return Err(LinkError::LinkAlreadyExpired);
        }

        if self.is_exceeded() {
            return Err(LinkError::LinkMaxExceeded);
        }

        Ok(())
    }

    /// `increment_issued` is the compare and increment step, repositories must run
    /// it under their own write guard
    pub fn increment_issued(&mut self) -> Result<(), LinkError> {
        if self.is_exceeded() {
            return Err(LinkError::LinkMaxExceeded);
        }

        self.issued_claims += 1;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_active(&mut self, active: bool) -> Result<(), LinkError> {
        match (self.active, active) {
            (true, true) => Err(LinkError::LinkAlreadyActive),
            (false, false) => Err(LinkError::LinkAlreadyInactive),
            _ => {
                self.active = active;
                self.updated_at = Utc::now();
                Ok(())
            }
        }
    }

    pub fn matches(&self, filter: LinkFilter, now: DateTime<Utc>) -> bool {
        match filter {
            LinkFilter::All => true,
            LinkFilter::Active => self.active && !self.is_expired(now) && !self.is_exceeded(),
            LinkFilter::Inactive => !self.active,
            LinkFilter::Exceeded => self.is_expired(now) || self.is_exceeded(),
        }
    }

    /// `matches_query` is a case insensitive search over the schema and the
    /// subject template, a blank query matches every link
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        self.schema_id.to_lowercase().contains(&query)
            || self
                .credential_subject
                .to_string()
                .to_lowercase()
                .contains(&query)
    }

    /// `claim_data` fills the subject template for a holder
    pub fn claim_data(&self, holder_did: &str) -> Value {
        let mut data = self.credential_subject.to_owned();
        if let Some(object) = data.as_object_mut() {
            object.insert("id".to_string(), Value::String(holder_did.to_string()));
        }

        data
    }

    pub fn get_id(&self) -> String {
        self.id.to_owned()
    }

    pub fn get_issuer_did(&self) -> String {
        self.issuer_did.to_owned()
    }

    pub fn get_schema_id(&self) -> String {
        self.schema_id.to_owned()
    }

    pub fn get_max_issuance(&self) -> Option<u64> {
        self.max_issuance
    }

    pub fn get_issued_claims(&self) -> u64 {
        self.issued_claims
    }

    pub fn get_credential_expiration(&self) -> Option<DateTime<Utc>> {
        self.credential_expiration
    }

    pub fn requests_mt_proof(&self) -> bool {
        self.mt_proof
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl ToJSON for Link {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}

impl TryInto<Vec<u8>> for Link {
    type Error = LinkError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| LinkError::EntityError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for Link {
    type Error = LinkError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&value).map_err(|err| LinkError::EntityError(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::chrono::Duration;
    use rst_common::standard::serde_json::json;
    use table_test::table_test;

    fn request() -> CreateLinkRequest {
        CreateLinkRequest {
            issuer_did: "did:iden3:issuer".to_string(),
            schema_id: "https://schema.example.com/kyc.json".to_string(),
            credential_subject: json!({"birthday": 19960424}),
            signature_proof: true,
            mt_proof: false,
            max_issuance: Some(2),
            valid_until: None,
            credential_expiration: None,
        }
    }

    #[test]
    fn test_generate_validation() {
        let now = Utc::now();

        let mut past = request();
        past.valid_until = Some(now - Duration::hours(1));

        let mut no_proof = request();
        no_proof.signature_proof = false;

        let mut empty_subject = request();
        empty_subject.credential_subject = json!({});

        let mut array_subject = request();
        array_subject.credential_subject = json!([1, 2]);

        let mut zero_issuance = request();
        zero_issuance.max_issuance = Some(0);

        let table = vec![
            (past, "valid_until"),
            (no_proof, "proof type"),
            (empty_subject, "credential_subject"),
            (array_subject, "credential_subject"),
            (zero_issuance, "max_issuance"),
        ];

        for (validator, input, expected) in table_test!(table) {
            let link = Link::generate(input.clone(), now);
            let message = link.unwrap_err().to_string();

            validator
                .given(&format!("{:?}", input))
                .when("generate link")
                .then(&format!("fails on {}", expected))
                .assert_eq(true, message.contains(expected));
        }
    }

    #[test]
    fn test_check_available() {
        let now = Utc::now();
        let mut link = Link::generate(request(), now).unwrap();
        assert!(link.check_available(now).is_ok());

        link.increment_issued().unwrap();
        link.increment_issued().unwrap();
        assert_eq!(link.check_available(now), Err(LinkError::LinkMaxExceeded));
        assert_eq!(link.increment_issued(), Err(LinkError::LinkMaxExceeded));
        assert_eq!(link.get_issued_claims(), 2);

        let mut expiring = request();
        expiring.valid_until = Some(now + Duration::minutes(5));
        let link = Link::generate(expiring, now).unwrap();
        assert_eq!(
            link.check_available(now + Duration::minutes(10)),
            Err(LinkError::LinkAlreadyExpired)
        );
    }

    #[test]
    fn test_set_active() {
        let mut link = Link::generate(request(), Utc::now()).unwrap();
        assert_eq!(link.set_active(true), Err(LinkError::LinkAlreadyActive));

        link.set_active(false).unwrap();
        assert_eq!(link.check_available(Utc::now()), Err(LinkError::LinkInactive));
        assert_eq!(link.set_active(false), Err(LinkError::LinkAlreadyInactive));
        assert!(link.matches(LinkFilter::Inactive, Utc::now()));
        assert!(!link.matches(LinkFilter::Active, Utc::now()))
    }

    #[test]
    fn test_matches_query() {
        let link = Link::generate(request(), Utc::now()).unwrap();

        let table = vec![
            ("", true),
            ("  ", true),
            ("KYC", true),
            ("schema.example.com", true),
            ("birthday", true),
            ("19960424", true),
            ("membership", false),
        ];

        for (validator, input, expected) in table_test!(table) {
            validator
                .given(input)
                .when("match link query")
                .then(&format!("{}", expected))
                .assert_eq(expected, link.matches_query(input));
        }
    }

    #[test]
    fn test_claim_data_binds_holder() {
        let link = Link::generate(request(), Utc::now()).unwrap();
        let data = link.claim_data("did:iden3:holder");
        assert_eq!(data["id"], json!("did:iden3:holder"));
        assert_eq!(data["birthday"], json!(19960424))
    }
}
