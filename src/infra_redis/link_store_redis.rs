use super::{KeySpace, store_error};
use crate::domain_model::TokenId;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

pub struct RedisLinkStore {
    conn: ConnectionManager,
    keys: KeySpace,
}

impl RedisLinkStore {
    pub fn new(conn: ConnectionManager, keys: KeySpace) -> Self {
        RedisLinkStore { conn, keys }
    }
}

#[async_trait::async_trait]
impl LinkStore for RedisLinkStore {
    async fn put(&self, jti: &TokenId, links: &[TokenId], ttl_secs: u64) -> Result<(), StoreError> {
        let key = self.keys.link(jti);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, join_links(links), ttl_secs)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn get(&self, jti: &TokenId) -> Result<Option<Vec<TokenId>>, StoreError> {
        let key = self.keys.link(jti);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(&key).await.map_err(store_error)?;
        Ok(value.map(|v| split_links(&v)))
    }

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError> {
        let key = self.keys.link(jti);
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(&key).await.map_err(store_error)?;
        Ok(exists)
    }

    async fn append(
        &self,
        jti: &TokenId,
        links: &[TokenId],
        ttl_secs: u64,
    ) -> Result<bool, StoreError> {
        let key = self.keys.link(jti);
        let suffix = format!("{LINK_SEPARATOR}{}", join_links(links));
        let ttl = i64::try_from(ttl_secs).map_err(|e| StoreError::Cache(e.to_string()))?;
        let mut conn = self.conn.clone();

        // APPEND + EXPIRE under MULTI so concurrent rotations never drop each other's ids
        let (len, _): (usize, i64) = redis::pipe()
            .atomic()
            .append(&key, &suffix)
            .expire(&key, ttl)
            .query_async(&mut conn)
            .await
            .map_err(store_error)?;

        Ok(len > suffix.len())
    }
}
