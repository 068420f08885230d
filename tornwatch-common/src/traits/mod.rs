pub mod credential_store;
pub mod display;
pub mod notifier;

pub use credential_store::CredentialStore;
pub use display::DisplayProjector;
pub use notifier::Notifier;
