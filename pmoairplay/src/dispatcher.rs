//! Pont entre la pipeline et le client AirPlay.

use async_trait::async_trait;
use tracing::info;

use pmocastcontrol::{Candidate, CastError, MediaSource, PlaybackDispatcher};

use crate::device::AirPlayDevice;
use crate::errors::AirPlayError;

/// Dispatcher AirPlay : connect puis play, chaque étape en un seul essai.
pub struct AirPlayDispatcher;

impl AirPlayDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AirPlayDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackDispatcher for AirPlayDispatcher {
    async fn dispatch(&self, target: &Candidate, source: &MediaSource) -> Result<(), CastError> {
        let device = AirPlayDevice::connect(&target.host, target.port)
            .await
            .map_err(|e| cast_error(&e))?;
        info!("✅ Connected to {}:{}", target.host, target.port);

        device.play(&source.url).await.map_err(|e| cast_error(&e))?;
        info!("▶️ Playback of \"{}\" handed to {}", source.title, target.name);

        Ok(())
    }
}

fn cast_error(error: &AirPlayError) -> CastError {
    match error {
        AirPlayError::Connection(_) => CastError::Connection(error.to_string()),
        AirPlayError::Playback(_) => CastError::Playback(error.to_string()),
    }
}
