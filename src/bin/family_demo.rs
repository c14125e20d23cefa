//! Walks one token family through issue, rotation, replay and revocation
//! against the in-memory cache.
//!
//! $ cargo run --bin family_demo

use std::sync::Arc;
use tokenkeeper::application_impl::*;
use tokenkeeper::application_port::*;
use tokenkeeper::domain_model::*;
use tokenkeeper::infra_memory::memory_token_stores;
use tokenkeeper::logger::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "debug".to_string(),
    })?;

    let cfg = TokenConfig::new(Some("demo-secret"), DEFAULT_ALGORITHM, 600, 3600)?;
    let tokens: Arc<dyn TokenService> = Arc::new(TokenManager::new(
        &cfg,
        Arc::new(JwtCodec::new(&cfg)),
        memory_token_stores(),
    ));
    let refresh_gate = AuthGate::refresh(tokens.clone());

    let first = tokens.issue(&Subject::new().with("user_id", 1)).await?;
    let r1 = refresh_gate
        .authenticate(Some(&format!("Bearer {}", first.refresh)))
        .await?;
    info!(subject = %r1.subject(), "issued first pair");

    let second = tokens.rotate(&r1).await?;
    info!(access_expires_at = %second.access_expires_at, "rotated once");

    match tokens.rotate(&r1).await {
        Err(TokenError::ReuseDetected) => info!("replay refused"),
        other => warn!(?other, "replay was not refused"),
    }

    for (name, token) in [
        ("A1", &first.access),
        ("R1", &first.refresh),
        ("A2", &second.access),
        ("R2", &second.refresh),
    ] {
        match tokens.verify(token).await {
            Ok(_) => warn!(name, "still valid"),
            Err(e) => info!(name, error = %e, "rejected"),
        }
    }

    Ok(())
}
