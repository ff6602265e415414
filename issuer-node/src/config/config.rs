use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::{App, CredentialStatus, Publisher};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) app: App,
    pub(super) credential_status: CredentialStatus,

    #[serde(default)]
    pub(super) publisher: Publisher,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn credential_status(&self) -> &CredentialStatus {
        &self.credential_status
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: App::default(),
            credential_status: CredentialStatus::default(),
            publisher: Publisher::default(),
        }
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        _ = self.app.validate()?;
        _ = self.credential_status.validate()?;
        _ = self.publisher.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers;
    use crate::common::types::CommonError;

    #[test]
    fn test_validation_failed() {
        let cfg = Config::default();
        let validation = helpers::validate(cfg);
        assert!(validation.is_err());
        assert!(matches!(
            validation.unwrap_err(),
            CommonError::ValidationError(_)
        ))
    }
}
