//! Error types for stream resolution

/// Result type alias for stream resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a source URL
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL scheme the resolver cannot probe
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// The URL answered but does not serve a playable stream
    #[error("{0}")]
    NotPlayable(String),
}
