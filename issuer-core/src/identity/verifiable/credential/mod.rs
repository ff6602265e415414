//! `credential` issues claims into the issuer claims tree and revokes them
//! through their revocation nonce
mod credential;
pub use credential::Credential;

mod usecase;
pub use usecase::Usecase;

pub mod types;
