//! Connexion HTTP à un récepteur AirPlay.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::errors::AirPlayError;

/// Timeout for the AirPlay control commands. The receiver answers `/play`
/// as soon as it has accepted the URL, not when playback ends, so a short
/// timeout is appropriate.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = "MediaControl/1.0";

/// Un récepteur AirPlay joignable, prêt à recevoir des commandes.
///
/// Construction goes through [`AirPlayDevice::connect`], which verifies the
/// endpoint actually answers before any playback command is attempted.
#[derive(Debug, Clone)]
pub struct AirPlayDevice {
    base_url: String,
    client: Client,
}

impl AirPlayDevice {
    /// Vérifie que `host:port` répond comme un récepteur AirPlay.
    ///
    /// Single attempt; a dead endpoint fails here rather than at `play`.
    pub async fn connect(host: &str, port: u16) -> Result<Self, AirPlayError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS))
            .build()
            .map_err(|e| AirPlayError::Connection(e.to_string()))?;

        let device = Self {
            base_url: base_url(host, port),
            client,
        };

        debug!("probing AirPlay endpoint {}", device.base_url);
        let response = device
            .client
            .get(format!("{}/server-info", device.base_url))
            .send()
            .await
            .map_err(|e| AirPlayError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AirPlayError::Connection(format!(
                "{} answered /server-info with HTTP {}",
                device.base_url,
                response.status()
            )));
        }

        debug!("AirPlay endpoint {} is up", device.base_url);
        Ok(device)
    }

    /// Demande au récepteur de jouer `media_url` depuis le début.
    ///
    /// The receiver fetches the URL itself; a success here means the
    /// command was accepted, not that the whole stream played out.
    pub async fn play(&self, media_url: &str) -> Result<(), AirPlayError> {
        let body = play_body(media_url);
        debug!("POST {}/play\n{}", self.base_url, body);

        let response = self
            .client
            .post(format!("{}/play", self.base_url))
            .header("Content-Type", "text/parameters")
            .body(body)
            .send()
            .await
            .map_err(|e| AirPlayError::Playback(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AirPlayError::Playback(format!(
                "play command refused with HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

/// Corps `text/parameters` de la commande `/play`.
fn play_body(media_url: &str) -> String {
    format!("Content-Location: {}\nStart-Position: 0.0\n", media_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("10.0.0.5", 7000), "http://10.0.0.5:7000");
    }

    #[test]
    fn test_play_body_format() {
        let body = play_body("http://media.example/v.mp4");
        assert_eq!(
            body,
            "Content-Location: http://media.example/v.mp4\nStart-Position: 0.0\n"
        );
    }
}
