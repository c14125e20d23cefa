//! Settings are read from a TOML file and overridden by `TOKENKEEPER_<SECTION>__<KEY>`
//! environment variables.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
