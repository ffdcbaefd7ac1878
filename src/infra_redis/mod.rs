mod transient_credential_store_redis;

pub use transient_credential_store_redis::*;
