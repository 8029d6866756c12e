use thiserror::Error;

#[derive(Debug, Error)]
pub enum AirPlayError {
    #[error("AirPlay device connection error: {0}")]
    Connection(String),
    #[error("AirPlay playback error: {0}")]
    Playback(String),
}

impl AirPlayError {
    pub fn connection(message: &str) -> Self {
        AirPlayError::Connection(message.to_string())
    }

    pub fn playback(message: &str) -> Self {
        AirPlayError::Playback(message.to_string())
    }
}
