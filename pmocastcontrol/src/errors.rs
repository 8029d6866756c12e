use thiserror::Error;

#[derive(Debug, Error)]
pub enum CastError {
    // Raised by the source stage when no playable stream can be produced
    #[error("Cannot find proper source: {0}")]
    SourceResolution(String),
    #[error("No device discovered before the discovery window closed")]
    DiscoveryExhausted,
    #[error("No device selected")]
    NoDeviceSelected,
    #[error("Discovery feed error: {0}")]
    Feed(String),
    #[error("Selection failed: {0}")]
    Selection(String),
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    Playback(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl CastError {
    pub fn source_resolution(message: &str) -> Self {
        CastError::SourceResolution(message.to_string())
    }

    pub fn feed(message: &str) -> Self {
        CastError::Feed(message.to_string())
    }
}
