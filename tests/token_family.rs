use std::sync::Arc;
use tokenkeeper::application_impl::*;
use tokenkeeper::application_port::*;
use tokenkeeper::domain_model::*;
use tokenkeeper::infra_memory::memory_token_stores;

struct Harness {
    tokens: Arc<dyn TokenService>,
    access_gate: AuthGate,
    refresh_gate: AuthGate,
}

impl Harness {
    fn new() -> Self {
        let cfg = TokenConfig::new(Some("integration-secret"), DEFAULT_ALGORITHM, 300, 3600)
            .expect("valid config");
        let tokens: Arc<dyn TokenService> = Arc::new(TokenManager::new(
            &cfg,
            Arc::new(JwtCodec::new(&cfg)),
            memory_token_stores(),
        ));
        Harness {
            access_gate: AuthGate::access(tokens.clone()),
            refresh_gate: AuthGate::refresh(tokens.clone()),
            tokens,
        }
    }

    /// What the refresh endpoint does: gate on a refresh token, then rotate.
    async fn refresh(&self, refresh: &str) -> Result<TokenPair, String> {
        let credential = self
            .refresh_gate
            .authenticate(Some(&format!("Bearer {refresh}")))
            .await
            .map_err(|e| e.to_string())?;
        self.tokens
            .rotate(&credential)
            .await
            .map_err(|e| e.to_string())
    }

    /// What the logout endpoint does: gate on an access token, then revoke.
    async fn logout(&self, access: &str) -> Result<usize, String> {
        let credential = self
            .access_gate
            .authenticate(Some(&format!("Bearer {access}")))
            .await
            .map_err(|e| e.to_string())?;
        self.tokens
            .revoke(&credential)
            .await
            .map_err(|e| e.to_string())
    }
}

fn user_one() -> Subject {
    Subject::new().with("user_id", 1)
}

#[tokio::test]
async fn replayed_refresh_token_kills_every_generation() {
    let h = Harness::new();

    let first = h.tokens.issue(&user_one()).await.unwrap();
    let a1 = h.tokens.verify(&first.access).await.unwrap();
    assert_eq!(a1.subject(), &user_one());
    assert_eq!(a1.token_type(), TokenType::Access);

    let second = h.refresh(&first.refresh).await.unwrap();
    assert!(h.tokens.verify(&second.access).await.is_ok());

    assert!(h.refresh(&first.refresh).await.is_err());

    for token in [&first.access, &first.refresh, &second.access, &second.refresh] {
        assert!(h.tokens.verify(token).await.is_err());
    }
    assert!(h.refresh(&second.refresh).await.is_err());
}

#[tokio::test]
async fn logout_blacklists_the_pair() {
    let h = Harness::new();

    let pair = h.tokens.issue(&user_one()).await.unwrap();
    assert_eq!(h.logout(&pair.access).await.unwrap(), 2);

    assert!(matches!(
        h.tokens.verify(&pair.access).await,
        Err(TokenError::Revoked)
    ));
    assert!(matches!(
        h.tokens.verify(&pair.refresh).await,
        Err(TokenError::Revoked)
    ));
    assert!(h.refresh(&pair.refresh).await.is_err());
}

#[tokio::test]
async fn logout_after_rotation_reaches_back_to_older_generations() {
    let h = Harness::new();

    let first = h.tokens.issue(&user_one()).await.unwrap();
    let second = h.refresh(&first.refresh).await.unwrap();
    let third = h.refresh(&second.refresh).await.unwrap();

    assert_eq!(h.logout(&third.access).await.unwrap(), 6);
    for token in [
        &first.access,
        &first.refresh,
        &second.access,
        &second.refresh,
        &third.access,
        &third.refresh,
    ] {
        assert!(h.tokens.verify(token).await.is_err());
    }
}

#[tokio::test]
async fn families_are_independent() {
    let h = Harness::new();

    let mine = h.tokens.issue(&user_one()).await.unwrap();
    let theirs = h
        .tokens
        .issue(&Subject::new().with("user_id", 2))
        .await
        .unwrap();

    h.logout(&mine.access).await.unwrap();
    assert!(h.tokens.verify(&theirs.access).await.is_ok());
    assert!(h.refresh(&theirs.refresh).await.is_ok());
}

#[tokio::test]
async fn concurrent_redemptions_yield_at_most_one_pair() {
    let h = Arc::new(Harness::new());
    let pair = h.tokens.issue(&user_one()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = h.clone();
        let refresh = pair.refresh.clone();
        handles.push(tokio::spawn(async move { h.refresh(&refresh).await }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert!(succeeded <= 1);
}
