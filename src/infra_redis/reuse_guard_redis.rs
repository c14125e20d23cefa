use super::{KeySpace, SENTINEL, store_error};
use crate::domain_model::TokenId;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ExistenceCheck, SetExpiry, SetOptions};

pub struct RedisReuseGuard {
    conn: ConnectionManager,
    keys: KeySpace,
}

impl RedisReuseGuard {
    pub fn new(conn: ConnectionManager, keys: KeySpace) -> Self {
        RedisReuseGuard { conn, keys }
    }
}

#[async_trait::async_trait]
impl ReuseGuard for RedisReuseGuard {
    async fn put(&self, jti: &TokenId, ttl_secs: u64) -> Result<(), StoreError> {
        let key = self.keys.refresh(jti);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, SENTINEL, ttl_secs)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn exists(&self, jti: &TokenId) -> Result<bool, StoreError> {
        let key = self.keys.refresh(jti);
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(&key).await.map_err(store_error)?;
        Ok(exists)
    }

    async fn mark_if_absent(&self, jti: &TokenId, ttl_secs: u64) -> Result<bool, StoreError> {
        let key = self.keys.refresh(jti);
        let mut conn = self.conn.clone();
        let options = SetOptions::default()
            .conditional_set(ExistenceCheck::NX)
            .with_expiration(SetExpiry::EX(ttl_secs));
        // SET NX replies OK when it wrote the key and nil when the key was already there
        let reply: Option<String> = conn
            .set_options(&key, SENTINEL, options)
            .await
            .map_err(store_error)?;
        Ok(reply.is_some())
    }
}
