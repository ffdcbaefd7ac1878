// stores

mod refresh_token_ledger;
mod transient_credential_store;

pub use refresh_token_ledger::*;
pub use transient_credential_store::*;

// external collaborators

mod dispatch;
mod identity_store;

pub use dispatch::*;
pub use identity_store::*;
