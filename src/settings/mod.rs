//! Settings are loaded from a TOML file, with the path overridable on the
//! command line (`--settings=settings/dev.toml`).

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
