//! `prople-issuer-core` provides the business logic of the prople issuer node
//!
//! - `merkle`, the sparse merkle tree engine
//! - `identity`, identity states, state publishing, credentials, revocation
//! status resolution and the link based issuance sessions
//!
//! Persistence, chain access and message transport are not implemented here,
//! each of them is an abstraction that must be provided by the application layer.
pub mod identity;
pub mod merkle;
