mod identity;
pub use identity::{Identity, IdentityTrees};

mod state;
pub use state::{compute_state, IdentityState};

mod usecase;
pub use usecase::Usecase;

pub mod types;
