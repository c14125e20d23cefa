use crate::domain_model::TokenId;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

const SENTINEL: &str = "1";
/// Expired slots are swept once every this many writes.
const SWEEP_INTERVAL: u64 = 256;

struct Slot {
    value: String,
    expires_at: Instant,
}

impl Slot {
    fn new(value: String, ttl_secs: u64) -> Self {
        Slot {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Process-local stand-in for the shared cache, with per-key expiry.
#[derive(Default)]
pub struct MemoryCache {
    slots: DashMap<String, Slot>,
    writes: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let live = self.slots.get(key).map(|slot| slot.is_live().then(|| slot.value.clone()))?;
        if live.is_none() {
            self.slots.remove_if(key, |_, slot| !slot.is_live());
        }
        live
    }

    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop every expired slot. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.is_live());
        before.saturating_sub(self.slots.len())
    }

    // Keys that are never read again would otherwise stay forever.
    fn record_write(&self) {
        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes % SWEEP_INTERVAL == 0 {
            let purged = self.purge_expired();
            if purged > 0 {
                debug!(purged, "swept expired cache slots");
            }
        }
    }

    pub fn set_ex(&self, key: String, value: String, ttl_secs: u64) {
        self.record_write();
        self.slots.insert(key, Slot::new(value, ttl_secs));
    }

    /// Returns `true` if the key was absent (or expired) and is now set.
    pub fn set_nx_ex(&self, key: String, value: String, ttl_secs: u64) -> bool {
        self.record_write();
        match self.slots.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live() {
                    false
                } else {
                    occupied.insert(Slot::new(value, ttl_secs));
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(value, ttl_secs));
                true
            }
        }
    }

    /// Appends to the value and resets the TTL. Returns `true` if a live value was extended.
    pub fn append_ex(&self, key: String, suffix: &str, ttl_secs: u64) -> bool {
        self.record_write();
        match self.slots.entry(key) {
            Entry::Occupied(mut occupied) if occupied.get().is_live() => {
                let slot = occupied.get_mut();
                slot.value.push_str(suffix);
                slot.expires_at = Instant::now() + Duration::from_secs(ttl_secs);
                true
            }
            Entry::Occupied(mut occupied) => {
                occupied.insert(Slot::new(suffix.to_string(), ttl_secs));
                false
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::new(suffix.to_string(), ttl_secs));
                false
            }
        }
    }
}

pub struct MemoryLinkStore {
    cache: Arc<MemoryCache>,
}

impl MemoryLinkStore {
    pub fn new(cache: Arc<MemoryCache>) -> Self {
        MemoryLinkStore { cache }
    }

    fn key(jti: &TokenId) -> String {
        format!("link_{jti}")
    }
}

#[async_trait::async_trait]
impl LinkStore for MemoryLinkStore {
    async fn put(&self, jti: &TokenId, links: &[TokenId], ttl_secs: u64) -> Result<(), StoreError> {
        self.cache.set_ex(Self::key(jti), join_links(links), ttl_secs);
        Ok(())
    }

    async fn get(&self, jti: &TokenId) -> Result<Option<Vec<TokenId>>, StoreError> {
        Ok(self.cache.get(&Self::key(jti)).map(|v| split_links(&v)))
    }

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError> {
        Ok(self.cache.exists(&Self::key(jti)))
    }

    async fn append(
        &self,
        jti: &TokenId,
        links: &[TokenId],
        ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let suffix = format!("{LINK_SEPARATOR}{}", join_links(links));
        Ok(self.cache.append_ex(Self::key(jti), &suffix, ttl_secs))
    }
}

pub struct MemoryRevocationStore {
    cache: Arc<MemoryCache>,
}

impl MemoryRevocationStore {
    pub fn new(cache: Arc<MemoryCache>) -> Self {
        MemoryRevocationStore { cache }
    }

    fn key(jti: &TokenId) -> String {
        format!("blacklist_{jti}")
    }
}

#[async_trait::async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn put(&self, jti: &TokenId, ttl_secs: u64) -> Result<(), StoreError> {
        self.cache.set_ex(Self::key(jti), SENTINEL.to_string(), ttl_secs);
        Ok(())
    }

    async fn put_many(&self, jtis: &[TokenId], ttl_secs: u64) -> Result<(), StoreError> {
        for jti in jtis {
            self.cache.set_ex(Self::key(jti), SENTINEL.to_string(), ttl_secs);
        }
        Ok(())
    }

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError> {
        Ok(self.cache.exists(&Self::key(jti)))
    }
}

pub struct MemoryReuseGuard {
    cache: Arc<MemoryCache>,
}

impl MemoryReuseGuard {
    pub fn new(cache: Arc<MemoryCache>) -> Self {
        MemoryReuseGuard { cache }
    }

    fn key(jti: &TokenId) -> String {
        format!("refresh_{jti}")
    }
}

#[async_trait::async_trait]
impl ReuseGuard for MemoryReuseGuard {
    async fn put(&self, jti: &TokenId, ttl_secs: u64) -> Result<(), StoreError> {
        self.cache.set_ex(Self::key(jti), SENTINEL.to_string(), ttl_secs);
        Ok(())
    }

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError> {
        Ok(self.cache.exists(&Self::key(jti)))
    }

    async fn mark_if_absent(&self, jti: &TokenId, ttl_secs: u64) -> Result<bool, StoreError> {
        Ok(self
            .cache
            .set_nx_ex(Self::key(jti), SENTINEL.to_string(), ttl_secs))
    }
}

/// All three token stores over one fresh in-memory cache.
pub fn memory_token_stores() -> TokenStores {
    let cache = Arc::new(MemoryCache::new());
    TokenStores {
        links: Arc::new(MemoryLinkStore::new(cache.clone())),
        revocations: Arc::new(MemoryRevocationStore::new(cache.clone())),
        reuse_guard: Arc::new(MemoryReuseGuard::new(cache)),
    }
}
