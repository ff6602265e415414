mod app;
pub use app::{App, DEFAULT_REQUEST_TIMEOUT_SECS};

mod credential_status;
pub use credential_status::{CredentialStatus, Onchain};

mod publisher;
pub use publisher::Publisher;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
