use super::{LinkStore, ReuseGuard, RevocationStore};
use std::sync::Arc;

/// The three cache adapters consumed by the token manager, usually sharing one connection.
#[derive(Clone)]
pub struct TokenStores {
    pub links: Arc<dyn LinkStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub reuse_guard: Arc<dyn ReuseGuard>,
}
