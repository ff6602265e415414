//! `link` manages reusable issuance templates and the QR code sessions opened on them
//!
//! A session goes `Pending` -> `PendingPublish` -> `Done`, or straight from
//! `Pending` to `Done` when the issued credential does not depend on a published
//! state. Any step may end the session as `Failed`, a failed session is never
//! retried in place.
mod link;
pub use link::Link;

mod session;
pub use session::LinkSession;

pub mod protocol;

mod usecase;
pub use usecase::{LinkSettings, Usecase, DEFAULT_SESSION_TTL_SECS};

pub mod types;
