//! `verifiable` contains the issued credentials and their revocation status
pub mod credential;
pub mod status;
