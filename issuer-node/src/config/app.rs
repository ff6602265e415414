use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct App {
    pub(super) server_url: String,
    pub(super) issuer_did: String,

    #[serde(default = "default_request_timeout")]
    pub(super) request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl App {
    pub fn get_server_url(&self) -> String {
        self.server_url.to_owned()
    }

    pub fn get_issuer_did(&self) -> String {
        self.issuer_did.to_owned()
    }

    pub fn get_request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            server_url: "".to_string(),
            issuer_did: "".to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ToValidate for App {
    fn validate(&self) -> Result<(), CommonError> {
        if self.server_url.is_empty() {
            return Err(CommonError::ValidationError(
                "config: app:server_url is missing".to_string(),
            ));
        }

        if self.issuer_did.is_empty() {
            return Err(CommonError::ValidationError(
                "config: app:issuer_did is missing".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: app:request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};

    use crate::common::helpers;

    #[test]
    fn test_parse_app_config() -> Result<(), ConfigError> {
        let toml_file = helpers::fixture_path("config_app.toml");
        let config_toml = {
            let config_builder: Result<App, ConfigError> =
                Builder::new(from_file(toml_file)).fetch()?.parse(use_toml);

            config_builder
        };

        assert!(!config_toml.is_err());

        let config_app = config_toml.unwrap();
        assert_eq!(config_app.server_url, "https://issuer.example.com".to_string());
        assert_eq!(config_app.issuer_did, "did:iden3:polygon:amoy:issuer".to_string());
        assert_eq!(config_app.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        Ok(())
    }

    #[test]
    fn test_app_validation_failed() {
        let mut app = App::default();
        let validation = helpers::validate(app.clone());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("app:server_url"));

        app.server_url = "https://issuer.example.com".to_string();
        let validation = helpers::validate(app.clone());
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("app:issuer_did"));

        app.issuer_did = "did:iden3:issuer".to_string();
        app.request_timeout_secs = 0;
        let validation = helpers::validate(app);
        assert!(validation
            .unwrap_err()
            .to_string()
            .contains("app:request_timeout_secs"))
    }
}
