use super::StoreError;
use crate::domain_model::TokenId;

pub const LINK_SEPARATOR: char = ';';

/// Adjacency list of a token family: token id -> ids it is linked to.
#[async_trait::async_trait]
pub trait LinkStore: Send + Sync {
    /// Replace the links of `jti`.
    async fn put(&self, jti: &TokenId, links: &[TokenId], ttl_secs: u64) -> Result<(), StoreError>;

    async fn get(&self, jti: &TokenId) -> Result<Option<Vec<TokenId>>, StoreError>;

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError>;

    /// Add `links` to the entry of `jti` and reset its TTL.
    /// Returns `false` if there was no entry to extend and a new one was created.
    async fn append(
        &self,
        jti: &TokenId,
        links: &[TokenId],
        ttl_secs: u64,
    ) -> Result<bool, StoreError>;
}

pub fn join_links(links: &[TokenId]) -> String {
    links
        .iter()
        .map(TokenId::as_str)
        .collect::<Vec<_>>()
        .join(&LINK_SEPARATOR.to_string())
}

pub fn split_links(value: &str) -> Vec<TokenId> {
    value
        .split(LINK_SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(TokenId::from)
        .collect()
}
