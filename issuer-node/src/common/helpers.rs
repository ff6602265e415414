use std::path::PathBuf;

use super::types::{CommonError, ToValidate};

pub fn validate(validator: impl ToValidate) -> Result<(), CommonError> {
    validator.validate()
}

/// `fixture_path` resolves a file under the crate config fixtures
pub fn fixture_path(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("src/config/fixtures");
    path.push(name);

    format!("{}", path.display())
}
