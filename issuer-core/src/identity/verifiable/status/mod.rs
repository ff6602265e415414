//! `status` decides how verifiers check whether a credential was revoked
//!
//! The issuer settings are resolved once into a [`StatusKind`], which drives both
//! the `credentialStatus` embedded into new credentials and the [`Resolver`] that
//! answers revocation queries.
mod settings;
pub use settings::{OnchainTreeStore, RhsMode, StatusKind, StatusSettings, StatusType};

mod descriptor;
pub use descriptor::{build_descriptor, StatusDescriptor};

mod resolver;
pub use resolver::Resolver;

pub mod types;
