mod key_space;
mod link_store_redis;
mod reuse_guard_redis;
mod revocation_store_redis;

pub use key_space::*;
pub use link_store_redis::*;
pub use reuse_guard_redis::*;
pub use revocation_store_redis::*;

use crate::domain_port::{StoreError, TokenStores};
use redis::aio::ConnectionManager;
use std::sync::Arc;

const SENTINEL: i64 = 1;

fn store_error(e: redis::RedisError) -> StoreError {
    StoreError::Cache(e.to_string())
}

/// All three token stores over one shared connection manager.
pub fn redis_token_stores(conn: ConnectionManager, keys: KeySpace) -> TokenStores {
    TokenStores {
        links: Arc::new(RedisLinkStore::new(conn.clone(), keys.clone())),
        revocations: Arc::new(RedisRevocationStore::new(conn.clone(), keys.clone())),
        reuse_guard: Arc::new(RedisReuseGuard::new(conn, keys)),
    }
}
