//! Tracing bootstrap. The subscriber is installed once with a default filter
//! and re-filtered after the settings file has been parsed.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
