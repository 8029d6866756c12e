//! Fenêtre de découverte : décide quand on en sait assez pour s'arrêter.
//!
//! Two mutually exclusive modes, chosen once per invocation:
//!
//! - **fast mode** (timeout 0): the first candidate to arrive wins and the
//!   window resolves immediately with a one-element set. Trades completeness
//!   for latency, which is right when one device is expected on the network.
//! - **bounded mode** (timeout > 0): the window races the feed against a
//!   deadline. A candidate arriving before the deadline still wins the race
//!   and resolves immediately, keeping the common single-device case fast.
//!   If the deadline fires first, every candidate the feed has already
//!   delivered at that instant is collected, in arrival order; an empty
//!   collection is a [`CastError::DiscoveryExhausted`] failure.
//!
//! The race has two producers (timer, feed) and a single-assignment outcome:
//! the `select!` below is that resolve-once primitive. Whichever branch
//! completes first decides the window; the loser's later effects are
//! unobservable because the subscription is cancelled on every exit path.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::errors::CastError;
use crate::feed::FeedSubscription;
use crate::model::Candidate;

pub struct DiscoveryWindow {
    timeout: Duration,
}

impl DiscoveryWindow {
    /// `timeout_secs == 0` selects fast mode.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Runs the window over one subscription and resolves it into a
    /// non-empty, arrival-ordered candidate set.
    pub async fn collect(&self, mut subscription: FeedSubscription) -> Result<Vec<Candidate>, CastError> {
        let outcome = if self.timeout.is_zero() {
            self.first_responder(&mut subscription).await
        } else {
            self.bounded(&mut subscription).await
        };
        subscription.cancel();
        outcome
    }

    async fn first_responder(
        &self,
        subscription: &mut FeedSubscription,
    ) -> Result<Vec<Candidate>, CastError> {
        match subscription.next().await {
            Some(candidate) => {
                debug!("fast mode resolved with {}", candidate);
                Ok(vec![candidate])
            }
            // Feed closed without ever producing a candidate.
            None => Err(CastError::DiscoveryExhausted),
        }
    }

    async fn bounded(
        &self,
        subscription: &mut FeedSubscription,
    ) -> Result<Vec<Candidate>, CastError> {
        let deadline = Instant::now() + self.timeout;
        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        // biased: once the deadline has passed, the timer must win the race
        // even if candidates are already queued on the channel.
        tokio::select! {
            biased;
            _ = &mut sleep => {
                // Let arrivals landing on the expiry tick be delivered before
                // the window closes.
                tokio::task::yield_now().await;

                let mut found = Vec::new();
                while let Some(candidate) = subscription.try_next() {
                    found.push(candidate);
                }

                if found.is_empty() {
                    debug!("discovery window closed after {:?} with no candidate", self.timeout);
                    Err(CastError::DiscoveryExhausted)
                } else {
                    debug!("discovery window closed with {} candidate(s)", found.len());
                    Ok(found)
                }
            }
            first = subscription.next() => match first {
                Some(candidate) => {
                    debug!("candidate {} arrived before the deadline", candidate);
                    Ok(vec![candidate])
                }
                None => Err(CastError::DiscoveryExhausted),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn candidate(host: &str, name: &str) -> Candidate {
        Candidate {
            host: host.to_string(),
            port: 7000,
            name: name.to_string(),
        }
    }

    fn subscription() -> (mpsc::Sender<Candidate>, FeedSubscription, CancellationToken) {
        let (tx, rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        (tx, FeedSubscription::new(rx, token.clone()), token)
    }

    #[tokio::test]
    async fn fast_mode_first_responder_wins() {
        let (tx, sub, token) = subscription();
        tx.send(candidate("10.0.0.5", "TV")).await.unwrap();
        tx.send(candidate("10.0.0.6", "Speaker")).await.unwrap();

        let found = DiscoveryWindow::new(0).collect(sub).await.unwrap();

        assert_eq!(found, vec![candidate("10.0.0.5", "TV")]);
        // The second advertisement is never observed: the subscription is
        // already cancelled.
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_mode_resolves_early_arrival_immediately() {
        let (tx, sub, token) = subscription();
        tx.send(candidate("10.0.0.5", "TV")).await.unwrap();

        let start = Instant::now();
        let found = DiscoveryWindow::new(5).collect(sub).await.unwrap();

        assert_eq!(found, vec![candidate("10.0.0.5", "TV")]);
        // The timer never fired: the clock did not advance towards the
        // 5 second deadline.
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_mode_collects_expiry_tick_arrivals_in_order() {
        let (tx, sub, _token) = subscription();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            tx.send(candidate("10.0.0.5", "TV")).await.unwrap();
            tx.send(candidate("10.0.0.6", "Speaker")).await.unwrap();
            tx.send(candidate("10.0.0.5", "TV")).await.unwrap(); // duplicate kept
        });

        let found = DiscoveryWindow::new(2).collect(sub).await.unwrap();

        assert_eq!(
            found,
            vec![
                candidate("10.0.0.5", "TV"),
                candidate("10.0.0.6", "Speaker"),
                candidate("10.0.0.5", "TV"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_mode_empty_window_is_exhausted_at_deadline() {
        // Keep the sender alive so the channel never closes early.
        let (_tx, sub, token) = subscription();

        let start = Instant::now();
        let err = DiscoveryWindow::new(3).collect(sub).await.unwrap_err();

        assert!(matches!(err, CastError::DiscoveryExhausted));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert!(token.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_feed_is_exhausted_without_waiting_out_the_timer() {
        let (tx, sub, _token) = subscription();
        drop(tx);

        let start = Instant::now();
        let err = DiscoveryWindow::new(30).collect(sub).await.unwrap_err();

        assert!(matches!(err, CastError::DiscoveryExhausted));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
