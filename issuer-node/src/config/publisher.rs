use rst_common::standard::serde::{self, Deserialize};

use prople_issuer_core::identity::link::DEFAULT_SESSION_TTL_SECS;
use prople_issuer_core::identity::publisher::DEFAULT_SUBMISSION_TIMEOUT_SECS;

use crate::common::types::{CommonError, ToValidate};

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
#[serde(default)]
pub struct Publisher {
    pub(super) watch_interval_secs: u64,
    pub(super) submission_timeout_secs: i64,
    pub(super) session_ttl_secs: i64,
}

impl Publisher {
    pub fn get_watch_interval_secs(&self) -> u64 {
        self.watch_interval_secs
    }

    pub fn get_submission_timeout_secs(&self) -> i64 {
        self.submission_timeout_secs
    }

    pub fn get_session_ttl_secs(&self) -> i64 {
        self.session_ttl_secs
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self {
            watch_interval_secs: 10,
            submission_timeout_secs: DEFAULT_SUBMISSION_TIMEOUT_SECS,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl ToValidate for Publisher {
    fn validate(&self) -> Result<(), CommonError> {
        if self.watch_interval_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: publisher:watch_interval_secs must be greater than zero".to_string(),
            ));
        }

        if self.submission_timeout_secs <= 0 {
            return Err(CommonError::ValidationError(
                "config: publisher:submission_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.session_ttl_secs <= 0 {
            return Err(CommonError::ValidationError(
                "config: publisher:session_ttl_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
