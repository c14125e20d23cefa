use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Cache, Settings};
use sqlx::MySqlPool;
use std::sync::Arc;

/// Structured connection info, so the password is never parsed out of a URL.
fn redis_connection_info(cache: &Cache) -> redis::ConnectionInfo {
    redis::ConnectionInfo {
        addr: redis::ConnectionAddr::Tcp(cache.host.clone(), cache.port),
        redis: redis::RedisConnectionInfo {
            db: cache.db,
            password: cache.password.clone(),
            ..Default::default()
        },
    }
}

pub struct Server {
    pub token_service: Arc<dyn TokenService>,
    pub account_service: Arc<dyn AccountService>,
    pub access_gate: Arc<AuthGate>,
    pub refresh_gate: Arc<AuthGate>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let auth = &settings.auth;
        let token_config = TokenConfig::new(
            auth.secret.as_deref(),
            &auth.algorithm,
            auth.access_ttl_secs,
            auth.refresh_ttl_secs,
        )?;
        debug!(?token_config);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(&token_config));

        let token_stores = match settings.cache.backend.as_str() {
            "memory" => {
                warn!("token cache is process-local, revocations are lost on restart");
                memory_token_stores()
            }
            "redis" => {
                let cache = &settings.cache;
                let redis_client = redis::Client::open(redis_connection_info(cache))?;
                let redis_manager = redis_client.get_connection_manager().await?;
                redis_token_stores(redis_manager, KeySpace::new(cache.key_prefix.clone()))
            }
            other => return Err(anyhow::anyhow!("Unknown cache backend: {}", other)),
        };

        let token_service: Arc<dyn TokenService> = Arc::new(TokenManager::new(
            &token_config,
            token_codec,
            token_stores,
        ));

        let (user_repo, pool): (Arc<dyn UserRepo>, Option<MySqlPool>) =
            match settings.user.backend.as_str() {
                "memory" => (Arc::new(MemoryUserRepo::new()), None),
                "mysql" => {
                    let dsn = settings
                        .user
                        .dsn
                        .as_deref()
                        .ok_or_else(|| anyhow::anyhow!("user.dsn is required for mysql"))?;
                    let pool = MySqlPool::connect(dsn).await?;
                    (Arc::new(MySqlUserRepo::new(pool.clone())), Some(pool))
                }
                other => return Err(anyhow::anyhow!("Unknown user backend: {}", other)),
            };

        let account_service: Arc<dyn AccountService> = Arc::new(RealAccountService::new(
            user_repo,
            Arc::new(Argon2PasswordHasher),
            token_service.clone(),
        ));

        info!("server started");

        let mut server = Self::from_parts(token_service, account_service);
        server.pool = pool;
        Ok(server)
    }

    pub fn from_parts(
        token_service: Arc<dyn TokenService>,
        account_service: Arc<dyn AccountService>,
    ) -> Self {
        Self {
            access_gate: Arc::new(AuthGate::access(token_service.clone())),
            refresh_gate: Arc::new(AuthGate::refresh(token_service.clone())),
            token_service,
            account_service,
            pool: None,
        }
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
