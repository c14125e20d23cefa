use super::StoreError;
use crate::domain_model::TokenId;

/// "Already redeemed" markers for refresh token ids. Markers carry no value,
/// so there is `exists` and no value `get`.
#[async_trait::async_trait]
pub trait ReuseGuard: Send + Sync {
    async fn put(&self, jti: &TokenId, ttl_secs: u64) -> Result<(), StoreError>;

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError>;

    /// Atomically set the marker unless it is already present.
    /// Returns `true` if this call set it.
    async fn mark_if_absent(&self, jti: &TokenId, ttl_secs: u64) -> Result<bool, StoreError>;
}
