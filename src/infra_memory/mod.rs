//! In-process implementations of the store and collaborator ports, backed by
//! `dashmap`. Wired by the `memory` backend and by the test suite.

mod dispatch_memory;
mod identity_store_memory;
mod refresh_token_ledger_memory;
mod transient_credential_store_memory;

pub use dispatch_memory::*;
pub use identity_store_memory::*;
pub use refresh_token_ledger_memory::*;
pub use transient_credential_store_memory::*;
