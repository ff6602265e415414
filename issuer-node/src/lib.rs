//! `prople-issuer-node` runs the issuer core as a node: TOML configuration, in
//! memory repositories, the confirmation watcher and the [`Node`] facade
use once_cell::sync::OnceCell;

use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

pub mod common;
pub mod config;
pub mod repository;

mod watcher;
pub use watcher::Watcher;

mod node;
pub use node::{
    CredentialUsecase, IdentityUsecase, LinkUsecase, Node, NodeError, PublisherUsecase,
    StatusResolver,
};

/// `init_tracing` installs the global subscriber once, `RUST_LOG` overrides the
/// default filter
pub fn init_tracing() {
    static INSTANCE: OnceCell<()> = OnceCell::new();
    INSTANCE.get_or_init(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "{}=debug,prople_issuer_core=debug",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .try_init();
    });
}
