//! Sonde HTTP d'une URL source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use tracing::debug;
use url::Url;

use pmocastcontrol::{CastError, MediaSource, SourceResolver};

use crate::error::{Error, Result};

/// Default timeout for the probe requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "pmostream/0.1.0";

/// Content types AirPlay receivers accept directly: media proper, plus the
/// HLS playlist flavors.
const PLAYABLE_CONTENT_TYPES: &[&str] = &[
    "application/vnd.apple.mpegurl",
    "application/x-mpegurl",
    "application/mp4",
    "application/octet-stream",
];

/// File extensions treated as media when the server is vague about the
/// content type.
const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "ts", "m3u8", "mp3", "m4a", "aac", "wav", "flac",
];

/// Résolveur de source HTTP.
///
/// Probes the URL with a `HEAD` request (falling back to `GET` for servers
/// that refuse it), accepts the source when the response looks like a media
/// stream, and derives a title from the response or the URL itself.
#[derive(Debug, Clone)]
pub struct HttpStreamResolver {
    client: Client,
}

impl HttpStreamResolver {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Create a resolver with a custom reqwest::Client
    ///
    /// Useful for sharing HTTP connection pools or custom proxy settings.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn resolve_stream(&self, source_url: &str) -> Result<MediaSource> {
        let url = Url::parse(source_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }

        debug!("probing source {}", url);
        let response = match self.client.head(url.clone()).send().await {
            Ok(r) if r.status().is_success() => r,
            // Some servers refuse HEAD; probe again with GET. The body is
            // never read, dropping the response aborts the transfer.
            _ => self.client.get(url.clone()).send().await?,
        };

        if !response.status().is_success() {
            return Err(Error::NotPlayable(format!(
                "Cannot get stream info: {} answered HTTP {}",
                url,
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        if !is_playable(content_type.as_deref(), url.path()) {
            return Err(Error::NotPlayable(format!(
                "Cannot find proper source: {} serves {}",
                url,
                content_type.as_deref().unwrap_or("an unknown content type")
            )));
        }

        let title = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
            .or_else(|| title_from_path(&url))
            .unwrap_or_else(|| url.host_str().unwrap_or("stream").to_string());

        debug!(
            "source accepted: {} ({})",
            title,
            content_type.as_deref().unwrap_or("no content type")
        );

        Ok(MediaSource {
            title,
            url: source_url.to_string(),
        })
    }
}

#[async_trait]
impl SourceResolver for HttpStreamResolver {
    async fn resolve(&self, source_id: &str) -> std::result::Result<MediaSource, CastError> {
        self.resolve_stream(source_id)
            .await
            .map_err(|e| CastError::SourceResolution(e.to_string()))
    }
}

/// Un type de contenu (ou à défaut une extension) reconnu comme jouable ?
fn is_playable(content_type: Option<&str>, path: &str) -> bool {
    if let Some(ct) = content_type {
        let ct = ct
            .split(';')
            .next()
            .unwrap_or(ct)
            .trim()
            .to_ascii_lowercase();

        if ct.starts_with("video/") || ct.starts_with("audio/") {
            return true;
        }
        if PLAYABLE_CONTENT_TYPES.contains(&ct.as_str()) {
            // octet-stream tells us nothing; require a media extension too.
            if ct == "application/octet-stream" {
                return has_media_extension(path);
            }
            return true;
        }
        return false;
    }

    has_media_extension(path)
}

fn has_media_extension(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Extrait `filename="..."` d'un header Content-Disposition.
fn disposition_filename(header: &str) -> Option<String> {
    let marker = "filename=";
    let idx = header.find(marker)?;
    let value = header[idx + marker.len()..].trim();
    let value = value.split(';').next()?.trim().trim_matches('"');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Dernier segment de chemin, sans extension.
fn title_from_path(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let stem = segment.rsplit_once('.').map(|(s, _)| s).unwrap_or(segment);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_content_types_are_playable() {
        assert!(is_playable(Some("video/mp4"), "/v"));
        assert!(is_playable(Some("audio/mpeg; charset=binary"), "/v"));
        assert!(is_playable(Some("application/vnd.apple.mpegurl"), "/live"));
        assert!(is_playable(Some("Application/X-MPEGURL"), "/live"));
    }

    #[test]
    fn test_non_media_content_types_are_rejected() {
        assert!(!is_playable(Some("text/html"), "/watch"));
        assert!(!is_playable(Some("application/json"), "/api/video.mp4"));
    }

    #[test]
    fn test_octet_stream_needs_a_media_extension() {
        assert!(is_playable(Some("application/octet-stream"), "/v.mp4"));
        assert!(!is_playable(Some("application/octet-stream"), "/v.bin"));
    }

    #[test]
    fn test_missing_content_type_falls_back_to_extension() {
        assert!(is_playable(None, "/movies/trailer.M4V"));
        assert!(!is_playable(None, "/movies/trailer"));
    }

    #[test]
    fn test_disposition_filename() {
        assert_eq!(
            disposition_filename(r#"attachment; filename="trailer.mp4""#),
            Some("trailer.mp4".to_string())
        );
        assert_eq!(
            disposition_filename("attachment; filename=trailer.mp4; size=1"),
            Some("trailer.mp4".to_string())
        );
        assert_eq!(disposition_filename("inline"), None);
    }

    #[test]
    fn test_title_from_path() {
        let url = Url::parse("http://media.example/movies/Big%20Trip.mp4").unwrap();
        assert_eq!(title_from_path(&url), Some("Big%20Trip".to_string()));

        let root = Url::parse("http://media.example/").unwrap();
        assert_eq!(title_from_path(&root), None);
    }
}
