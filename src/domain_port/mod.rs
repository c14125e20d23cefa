// store

mod link_store;
mod reuse_guard;
mod revocation_store;
mod store_error;
mod token_stores;

pub use link_store::*;
pub use reuse_guard::*;
pub use revocation_store::*;
pub use store_error::*;
pub use token_stores::*;

// repo

mod user_repo;

pub use user_repo::*;
