use thiserror::Error;

/// Failures surfaced by the cache store, the network or the fetch path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("response could not be cloned: {0}")]
    Clone(String),

    #[error("offline and no cached copy of {0}")]
    Offline(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
