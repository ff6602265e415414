use rst_common::standard::serde::{self, Deserialize};

use prople_issuer_core::identity::verifiable::status::{RhsMode, StatusSettings, StatusType};

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Onchain {
    pub(super) contract_address: String,
    pub(super) chain_id: u64,
}

/// `CredentialStatus` is the `[credential_status]` section, it is turned into the
/// core [`StatusSettings`]
#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct CredentialStatus {
    pub(super) status_type: StatusType,
    pub(super) rhs_mode: RhsMode,

    #[serde(default)]
    pub(super) direct_url: String,

    pub(super) rhs_url: Option<String>,
    pub(super) onchain: Option<Onchain>,
}

impl CredentialStatus {
    pub fn to_settings(&self) -> StatusSettings {
        let mut settings = StatusSettings::new(
            self.status_type,
            self.rhs_mode,
            self.direct_url.to_owned(),
        );

        if let Some(url) = &self.rhs_url {
            settings = settings.with_rhs_url(url.to_owned());
        }

        if let Some(onchain) = &self.onchain {
            settings = settings.with_onchain(onchain.contract_address.to_owned(), onchain.chain_id);
        }

        settings
    }
}

impl Default for CredentialStatus {
    fn default() -> Self {
        Self {
            status_type: StatusType::SparseMerkleTreeProof,
            rhs_mode: RhsMode::None,
            direct_url: "".to_string(),
            rhs_url: None,
            onchain: None,
        }
    }
}

impl ToValidate for CredentialStatus {
    fn validate(&self) -> Result<(), CommonError> {
        self.to_settings()
            .kind()
            .map(|_| ())
            .map_err(|err| CommonError::ValidationError(format!("config: credential_status: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};
    use table_test::table_test;

    use prople_issuer_core::identity::verifiable::status::StatusKind;

    use crate::common::helpers;

    #[test]
    fn test_parse_credential_status_config() -> Result<(), ConfigError> {
        let toml_file = helpers::fixture_path("config_credential_status.toml");
        let config_toml = {
            let config_builder: Result<CredentialStatus, ConfigError> =
                Builder::new(from_file(toml_file)).fetch()?.parse(use_toml);

            config_builder
        };

        assert!(!config_toml.is_err());

        let config_status = config_toml.unwrap();
        assert_eq!(config_status.rhs_mode, RhsMode::Mixed);
        assert_eq!(config_status.onchain.as_ref().map(|o| o.chain_id), Some(80002));

        let kind = config_status.to_settings().kind();
        assert!(matches!(kind, Ok(StatusKind::Mixed { .. })));
        Ok(())
    }

    #[test]
    fn test_credential_status_validation() {
        let direct = CredentialStatus {
            direct_url: "https://issuer.example.com".to_string(),
            ..CredentialStatus::default()
        };

        let missing_url = CredentialStatus::default();

        let missing_rhs = CredentialStatus {
            status_type: StatusType::Iden3ReverseSparseMerkleTreeProof,
            rhs_mode: RhsMode::OffChain,
            ..CredentialStatus::default()
        };

        let disabled = CredentialStatus {
            status_type: StatusType::None,
            ..CredentialStatus::default()
        };

        let table = vec![
            (direct, true),
            (missing_url, false),
            (missing_rhs, false),
            (disabled, true),
        ];

        for (validator, input, expected) in table_test!(table) {
            let valid = helpers::validate(input.clone()).is_ok();

            validator
                .given(&format!("{:?}", input))
                .when("validate credential status")
                .then(&format!("valid: {}", expected))
                .assert_eq(expected, valid);
        }
    }
}
