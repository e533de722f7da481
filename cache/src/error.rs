use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache entry not found or expired")]
    NotFound,

    #[error("payload is not serializable JSON: {0}")]
    Serialization(String),

    #[error("system randomness unavailable: {0}")]
    Randomness(String),

    #[error("public base URL is not configured; the verifier cannot reach proxied data")]
    MissingPublicUrl,

    #[error("source fetch failed: {0}")]
    Fetch(String),

    #[error("source returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("source returned invalid JSON: {0}")]
    InvalidSource(String),

    #[error("cache lock poisoned")]
    Poisoned,
}
