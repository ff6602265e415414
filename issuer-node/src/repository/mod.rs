//! In memory adapters of the core repository traits
mod table;

mod identity;
pub use identity::IdentityRepository;

mod transaction;
pub use transaction::TransactionRepository;

mod credential;
pub use credential::CredentialRepository;

mod link;
pub use link::{LinkRepository, SessionRepository};
