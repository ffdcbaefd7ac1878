mod claims_codec_jwt;
mod hasher_argon2;
mod session_service_fake;
mod session_service_impl;
mod token_issuer;

pub use claims_codec_jwt::*;
pub use hasher_argon2::*;
pub use session_service_fake::*;
pub use session_service_impl::*;
pub use token_issuer::*;
