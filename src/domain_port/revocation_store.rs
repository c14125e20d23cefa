use super::StoreError;
use crate::domain_model::TokenId;

/// Blacklist of revoked token ids. Presence of an entry is the only signal,
/// so there is `exists` and no value `get`.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    async fn put(&self, jti: &TokenId, ttl_secs: u64) -> Result<(), StoreError>;

    /// Blacklist every id in a single round trip.
    async fn put_many(&self, jtis: &[TokenId], ttl_secs: u64) -> Result<(), StoreError>;

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError>;
}
