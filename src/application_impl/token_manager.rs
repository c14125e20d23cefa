use super::TokenConfig;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Issues, rotates, revokes and verifies token families.
///
/// A family is the graph of every token descended from one issuance. Each token id
/// has a link entry naming its pair sibling; rotation additionally links the new
/// pair back to the refresh token that produced it and appends the new pair to
/// that token's entry, so any member reaches every other member.
pub struct TokenManager {
    codec: Arc<dyn TokenCodec>,
    links: Arc<dyn LinkStore>,
    revocations: Arc<dyn RevocationStore>,
    reuse_guard: Arc<dyn ReuseGuard>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    cache_ttl_secs: u64,
}

impl TokenManager {
    pub fn new(cfg: &TokenConfig, codec: Arc<dyn TokenCodec>, stores: TokenStores) -> Self {
        let TokenStores {
            links,
            revocations,
            reuse_guard,
        } = stores;
        Self {
            codec,
            links,
            revocations,
            reuse_guard,
            access_ttl: cfg.access_ttl,
            refresh_ttl: cfg.refresh_ttl,
            cache_ttl_secs: cfg.cache_ttl_secs(),
        }
    }

    fn mint_pair(&self, subject: &Subject) -> Result<(EncodedToken, EncodedToken), TokenError> {
        let access = self
            .codec
            .encode(TokenType::Access, subject, self.access_ttl)?;
        let refresh = self
            .codec
            .encode(TokenType::Refresh, subject, self.refresh_ttl)?;
        Ok((access, refresh))
    }

    fn pair(access: EncodedToken, refresh: EncodedToken) -> TokenPair {
        TokenPair {
            access: access.token,
            refresh: refresh.token,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        }
    }
}

#[async_trait::async_trait]
impl TokenService for TokenManager {
    async fn issue(&self, subject: &Subject) -> Result<TokenPair, TokenError> {
        let (access, refresh) = self.mint_pair(subject)?;

        self.links
            .put(&access.jti, &[refresh.jti.clone()], self.cache_ttl_secs)
            .await?;
        self.links
            .put(&refresh.jti, &[access.jti.clone()], self.cache_ttl_secs)
            .await?;

        debug!(access = %access.jti, refresh = %refresh.jti, "issued token pair");
        Ok(Self::pair(access, refresh))
    }

    async fn rotate(&self, refresh: &Credential) -> Result<TokenPair, TokenError> {
        if refresh.token_type() != TokenType::Refresh {
            return Err(TokenError::WrongTokenType {
                expected: TokenType::Refresh,
                actual: refresh.token_type(),
            });
        }

        let old = refresh.id();
        if !self
            .reuse_guard
            .mark_if_absent(old, self.cache_ttl_secs)
            .await?
        {
            error!(
                subject = %refresh.subject(),
                jti = %old,
                "refresh token reuse detected, revoking token family"
            );
            self.revoke(refresh).await?;
            return Err(TokenError::ReuseDetected);
        }

        let (access, new_refresh) = self.mint_pair(refresh.subject())?;

        self.links
            .put(
                &access.jti,
                &[new_refresh.jti.clone(), old.clone()],
                self.cache_ttl_secs,
            )
            .await?;
        self.links
            .put(
                &new_refresh.jti,
                &[access.jti.clone(), old.clone()],
                self.cache_ttl_secs,
            )
            .await?;
        let extended = self
            .links
            .append(
                old,
                &[access.jti.clone(), new_refresh.jti.clone()],
                self.cache_ttl_secs,
            )
            .await?;
        if !extended {
            warn!(jti = %old, "missing token link entry, started a new one");
        }

        debug!(
            from = %old,
            access = %access.jti,
            refresh = %new_refresh.jti,
            "rotated token pair"
        );
        Ok(Self::pair(access, new_refresh))
    }

    async fn revoke(&self, credential: &Credential) -> Result<usize, TokenError> {
        let root = credential.id().clone();
        let mut visited: HashSet<TokenId> = HashSet::from([root.clone()]);
        let mut pending = vec![root];
        let mut revoked = Vec::new();

        while let Some(jti) = pending.pop() {
            if let Some(links) = self.links.get(&jti).await? {
                for linked in links {
                    if visited.insert(linked.clone()) {
                        pending.push(linked);
                    }
                }
            }
            revoked.push(jti);
        }

        self.revocations
            .put_many(&revoked, self.cache_ttl_secs)
            .await?;

        info!(
            tokens_revoked = revoked.len(),
            subject = %credential.subject(),
            "revoked token family"
        );
        Ok(revoked.len())
    }

    async fn verify(&self, token: &str) -> Result<Credential, TokenError> {
        let credential = self.codec.decode(token)?;
        if self.revocations.exists(credential.id()).await? {
            return Err(TokenError::Revoked);
        }
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{DEFAULT_ALGORITHM, JwtCodec};
    use crate::infra_memory::memory_token_stores;

    fn manager() -> (TokenManager, TokenStores) {
        let cfg = TokenConfig::new(Some("test-secret"), DEFAULT_ALGORITHM, 60, 600).unwrap();
        let stores = memory_token_stores();
        let manager = TokenManager::new(&cfg, Arc::new(JwtCodec::new(&cfg)), stores.clone());
        (manager, stores)
    }

    fn user(id: i64) -> Subject {
        Subject::new().with("user_id", id)
    }

    #[tokio::test]
    async fn issued_access_token_verifies() {
        let (manager, _) = manager();
        let pair = manager.issue(&user(1)).await.unwrap();

        let credential = manager.verify(&pair.access).await.unwrap();
        assert_eq!(credential.subject(), &user(1));
        assert_eq!(credential.token_type(), TokenType::Access);

        let refresh = manager.verify(&pair.refresh).await.unwrap();
        assert_eq!(refresh.token_type(), TokenType::Refresh);
        assert_ne!(refresh.id(), credential.id());
        assert!(pair.refresh_expires_at > pair.access_expires_at);
    }

    #[tokio::test]
    async fn issue_links_the_pair_both_ways() {
        let (manager, stores) = manager();
        let pair = manager.issue(&user(1)).await.unwrap();
        let access = manager.verify(&pair.access).await.unwrap();
        let refresh = manager.verify(&pair.refresh).await.unwrap();

        assert_eq!(
            stores.links.get(access.id()).await.unwrap(),
            Some(vec![refresh.id().clone()])
        );
        assert_eq!(
            stores.links.get(refresh.id()).await.unwrap(),
            Some(vec![access.id().clone()])
        );
    }

    #[tokio::test]
    async fn rotation_links_generations() {
        let (manager, stores) = manager();
        let first = manager.issue(&user(1)).await.unwrap();
        let a1 = manager.verify(&first.access).await.unwrap();
        let r1 = manager.verify(&first.refresh).await.unwrap();

        let second = manager.rotate(&r1).await.unwrap();
        let a2 = manager.verify(&second.access).await.unwrap();
        let r2 = manager.verify(&second.refresh).await.unwrap();
        assert_eq!(a2.subject(), &user(1));

        assert!(stores.reuse_guard.exists(r1.id()).await.unwrap());
        assert_eq!(
            stores.links.get(r1.id()).await.unwrap(),
            Some(vec![a1.id().clone(), a2.id().clone(), r2.id().clone()])
        );
        assert_eq!(
            stores.links.get(a2.id()).await.unwrap(),
            Some(vec![r2.id().clone(), r1.id().clone()])
        );
        assert_eq!(
            stores.links.get(r2.id()).await.unwrap(),
            Some(vec![a2.id().clone(), r1.id().clone()])
        );
    }

    #[tokio::test]
    async fn rotate_requires_a_refresh_token() {
        let (manager, _) = manager();
        let pair = manager.issue(&user(1)).await.unwrap();
        let access = manager.verify(&pair.access).await.unwrap();

        assert!(matches!(
            manager.rotate(&access).await,
            Err(TokenError::WrongTokenType {
                expected: TokenType::Refresh,
                actual: TokenType::Access
            })
        ));
    }

    #[tokio::test]
    async fn second_rotation_revokes_the_whole_family() {
        let (manager, _) = manager();
        let first = manager.issue(&user(1)).await.unwrap();
        let r1 = manager.verify(&first.refresh).await.unwrap();

        let second = manager.rotate(&r1).await.unwrap();
        let r2 = manager.verify(&second.refresh).await.unwrap();
        let third = manager.rotate(&r2).await.unwrap();

        assert!(matches!(
            manager.rotate(&r1).await,
            Err(TokenError::ReuseDetected)
        ));

        for token in [
            &first.access,
            &first.refresh,
            &second.access,
            &second.refresh,
            &third.access,
            &third.refresh,
        ] {
            assert!(matches!(
                manager.verify(token).await,
                Err(TokenError::Revoked)
            ));
        }
    }

    #[tokio::test]
    async fn revoking_access_revokes_its_refresh_sibling() {
        let (manager, _) = manager();
        let pair = manager.issue(&user(1)).await.unwrap();
        let access = manager.verify(&pair.access).await.unwrap();

        assert_eq!(manager.revoke(&access).await.unwrap(), 2);
        assert!(matches!(
            manager.verify(&pair.access).await,
            Err(TokenError::Revoked)
        ));
        assert!(matches!(
            manager.verify(&pair.refresh).await,
            Err(TokenError::Revoked)
        ));
    }

    #[tokio::test]
    async fn revocation_does_not_cross_families() {
        let (manager, _) = manager();
        let mine = manager.issue(&user(1)).await.unwrap();
        let theirs = manager.issue(&user(2)).await.unwrap();

        let access = manager.verify(&mine.access).await.unwrap();
        assert_eq!(manager.revoke(&access).await.unwrap(), 2);

        // a second, unrelated revocation starts from an empty visited set
        let other = manager.verify(&theirs.access).await.unwrap();
        assert_eq!(manager.revoke(&other).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn revoke_counts_each_member_once() {
        let (manager, _) = manager();
        let first = manager.issue(&user(1)).await.unwrap();
        let r1 = manager.verify(&first.refresh).await.unwrap();
        let second = manager.rotate(&r1).await.unwrap();
        let a2 = manager.verify(&second.access).await.unwrap();

        assert_eq!(manager.revoke(&a2).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn revoke_without_links_blacklists_the_token_itself() {
        let (manager, stores) = manager();
        let cfg = TokenConfig::new(Some("test-secret"), DEFAULT_ALGORITHM, 60, 600).unwrap();
        let loose = JwtCodec::new(&cfg)
            .encode(TokenType::Access, &user(3), Duration::from_secs(60))
            .unwrap();
        let credential = manager.verify(&loose.token).await.unwrap();

        assert_eq!(manager.revoke(&credential).await.unwrap(), 1);
        assert!(stores.revocations.exists(&loose.jti).await.unwrap());
    }

    #[tokio::test]
    async fn rotating_a_token_without_links_starts_a_new_entry() {
        let (manager, stores) = manager();
        let cfg = TokenConfig::new(Some("test-secret"), DEFAULT_ALGORITHM, 60, 600).unwrap();
        let loose = JwtCodec::new(&cfg)
            .encode(TokenType::Refresh, &user(3), Duration::from_secs(600))
            .unwrap();
        let credential = manager.verify(&loose.token).await.unwrap();

        manager.rotate(&credential).await.unwrap();
        assert_eq!(stores.links.get(&loose.jti).await.unwrap().map(|l| l.len()), Some(2));
    }
}
