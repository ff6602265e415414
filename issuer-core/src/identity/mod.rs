//! `identity` is the issuer identity domain
//!
//! - `state`, the identity trees and the identity state computed from their roots
//! - `publisher`, the pipeline that anchors identity states on chain
//! - `verifiable`, credentials and their revocation status
//! - `link`, reusable issuance templates and their QR code sessions
//!
//! An identity is mutated by a single writer at a time, see [`locks::IdentityLocks`].
pub mod link;
pub mod locks;
pub mod publisher;
pub mod state;
pub mod verifiable;
