use crate::domain_model::TokenId;

/// Cache key layout. An optional prefix namespaces deployments sharing one database.
#[derive(Debug, Clone, Default)]
pub struct KeySpace {
    prefix: Option<String>,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        KeySpace {
            prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    pub fn link(&self, jti: &TokenId) -> String {
        self.key("link", jti)
    }

    pub fn blacklist(&self, jti: &TokenId) -> String {
        self.key("blacklist", jti)
    }

    pub fn refresh(&self, jti: &TokenId) -> String {
        self.key("refresh", jti)
    }

    fn key(&self, kind: &str, jti: &TokenId) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{kind}_{jti}"),
            None => format!("{kind}_{jti}"),
        }
    }
}
