#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("cache error: {0}")]
    Cache(String),
    #[error("corrupt entry under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}
