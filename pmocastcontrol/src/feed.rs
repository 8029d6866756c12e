//! Abstraction du flux d'annonces de découverte.
//!
//! The discovery window only ever sees a [`FeedSubscription`]: a channel of
//! candidates in arrival order plus a cancellation token. How the candidates
//! are produced (mDNS, a test fixture) is behind the [`DiscoveryFeed`] seam.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use pmobonjour::BonjourBrowser;

use crate::errors::CastError;
use crate::model::Candidate;

/// Capacity of the candidate channel handed to the discovery window.
const CANDIDATE_CHANNEL_CAPACITY: usize = 32;

/// Source d'annonces de candidats, un abonnement par fenêtre de découverte.
pub trait DiscoveryFeed: Send + Sync {
    /// Opens a live subscription for the given service type.
    fn subscribe(&self, service_type: &str) -> Result<FeedSubscription, CastError>;
}

/// Un abonnement actif au flux de découverte.
///
/// Candidates arrive in advertisement order; duplicates are not filtered.
/// The subscription is released by [`cancel`](FeedSubscription::cancel), and
/// on drop as the backstop, so every exit path of the consumer (resolution,
/// failure, external cancellation) stops the underlying feed.
pub struct FeedSubscription {
    receiver: mpsc::Receiver<Candidate>,
    token: CancellationToken,
}

impl FeedSubscription {
    pub fn new(receiver: mpsc::Receiver<Candidate>, token: CancellationToken) -> Self {
        Self { receiver, token }
    }

    /// Next candidate, in arrival order. `None` once the feed closed.
    pub async fn next(&mut self) -> Option<Candidate> {
        self.receiver.recv().await
    }

    /// Candidate already delivered by the feed, if any. Never waits.
    pub fn try_next(&mut self) -> Option<Candidate> {
        self.receiver.try_recv().ok()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Flux de découverte mDNS, adossé à [`pmobonjour`].
pub struct BonjourFeed {
    browser: BonjourBrowser,
}

impl BonjourFeed {
    pub fn new() -> Self {
        Self {
            browser: BonjourBrowser::new(),
        }
    }
}

impl Default for BonjourFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryFeed for BonjourFeed {
    fn subscribe(&self, service_type: &str) -> Result<FeedSubscription, CastError> {
        let mut handle = self
            .browser
            .browse(service_type)
            .map_err(|e| CastError::Feed(e.to_string()))?;

        let (tx, rx) = mpsc::channel(CANDIDATE_CHANNEL_CAPACITY);
        let token = CancellationToken::new();
        let task_token = token.clone();

        // Forwarder : annonces pmobonjour -> candidats, tant que l'abonnement
        // est vivant. Dropping the handle stops the mDNS browse itself.
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    announcement = handle.next() => match announcement {
                        Some(a) => {
                            let candidate = Candidate {
                                host: a.host,
                                port: a.port,
                                name: a.name,
                            };
                            if tx.send(candidate).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
            handle.cancel();
            debug!("discovery feed subscription released");
        });

        Ok(FeedSubscription::new(rx, token))
    }
}
