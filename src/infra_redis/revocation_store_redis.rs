use super::{KeySpace, SENTINEL, store_error};
use crate::domain_model::TokenId;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

pub struct RedisRevocationStore {
    conn: ConnectionManager,
    keys: KeySpace,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager, keys: KeySpace) -> Self {
        RedisRevocationStore { conn, keys }
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put(&self, jti: &TokenId, ttl_secs: u64) -> Result<(), StoreError> {
        let key = self.keys.blacklist(jti);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, SENTINEL, ttl_secs)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn put_many(&self, jtis: &[TokenId], ttl_secs: u64) -> Result<(), StoreError> {
        if jtis.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for jti in jtis {
            pipe.set_ex(self.keys.blacklist(jti), SENTINEL, ttl_secs)
                .ignore();
        }
        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await.map_err(store_error)?;
        Ok(())
    }

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError> {
        let key = self.keys.blacklist(jti);
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(&key).await.map_err(store_error)?;
        Ok(exists)
    }
}
