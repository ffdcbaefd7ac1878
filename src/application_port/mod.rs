mod claims_codec;
mod session_service;

pub use claims_codec::*;
pub use session_service::*;
