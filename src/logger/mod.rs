//! Global `tracing` subscriber with a filter that can be swapped once settings are loaded.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
