//! Browse mDNS d'un type de service donné.
//!
//! This module handles the browsing side only: it queries the network for a
//! service type, parses each mDNS response into a [`ServiceAnnouncement`] and
//! forwards it over a channel. Stopping is cooperative, through the
//! [`BrowseHandle`] cancellation token (also triggered on drop, so the
//! background task never outlives its consumer).

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use futures_util::{StreamExt, pin_mut};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::DEFAULT_QUERY_INTERVAL;
use crate::errors::BonjourError;

/// Capacity of the announcement channel. Browsing a home network produces a
/// handful of events per query interval; the channel is never the bottleneck.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Une annonce de service vue sur le réseau local.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceAnnouncement {
    /// Instance name, e.g. "Living Room TV".
    pub name: String,
    /// IP address, IPv4 preferred when the device advertises both.
    pub host: String,
    /// Port from the SRV record.
    pub port: u16,
}

/// Browser mDNS : émet les annonces d'un type de service donné.
pub struct BonjourBrowser {
    query_interval: Duration,
}

impl BonjourBrowser {
    pub fn new() -> Self {
        Self {
            query_interval: DEFAULT_QUERY_INTERVAL,
        }
    }

    pub fn with_query_interval(query_interval: Duration) -> Self {
        Self { query_interval }
    }

    /// Démarre un browse et retourne le handle portant le canal d'annonces.
    ///
    /// The background task stops when the handle is cancelled or dropped, or
    /// when the consumer side of the channel goes away.
    pub fn browse(&self, service_type: &str) -> Result<BrowseHandle, BonjourError> {
        let discovery = mdns::discover::all(service_type, self.query_interval)?;
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let token = CancellationToken::new();
        let task_token = token.clone();
        let service = service_type.to_string();

        tokio::spawn(async move {
            let stream = discovery.listen();
            pin_mut!(stream);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    next = stream.next() => match next {
                        Some(Ok(response)) => {
                            if let Some(announcement) = parse_response(&response, &service) {
                                debug!(
                                    "mDNS announcement: {} at {}:{}",
                                    announcement.name, announcement.host, announcement.port
                                );
                                if tx.send(announcement).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            warn!("mDNS stream error while browsing {}: {}", service, e);
                        }
                        None => break,
                    }
                }
            }

            debug!("mDNS browse loop for {} stopped", service);
        });

        Ok(BrowseHandle { events: rx, token })
    }
}

impl Default for BonjourBrowser {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle sur un browse en cours.
pub struct BrowseHandle {
    events: mpsc::Receiver<ServiceAnnouncement>,
    token: CancellationToken,
}

impl BrowseHandle {
    /// Next announcement, in arrival order. `None` once the browse stopped.
    pub async fn next(&mut self) -> Option<ServiceAnnouncement> {
        self.events.recv().await
    }

    /// Stops the background browse task.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for BrowseHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Parse une réponse mDNS en annonce de service.
///
/// Returns `None` when the response carries no PTR record or no usable
/// address; those responses are other hosts' traffic and are ignored.
fn parse_response(response: &mdns::Response, service_type: &str) -> Option<ServiceAnnouncement> {
    let ptr_name = response.records().find_map(|r| {
        if let mdns::RecordKind::PTR(ref name) = r.kind {
            Some(name.clone())
        } else {
            None
        }
    })?;

    debug!("Processing mDNS response for service: {}", ptr_name);

    // Extract IP addresses
    let addresses: Vec<IpAddr> = response
        .records()
        .filter_map(|r| match r.kind {
            mdns::RecordKind::A(addr) => Some(IpAddr::V4(addr)),
            mdns::RecordKind::AAAA(addr) => Some(IpAddr::V6(addr)),
            _ => None,
        })
        .collect();

    if addresses.is_empty() {
        warn!("No IP address found for service: {}", ptr_name);
        return None;
    }

    let host = prefer_ipv4(&addresses)?;

    // Extract port from SRV record
    let port = response
        .records()
        .find_map(|r| {
            if let mdns::RecordKind::SRV { port, .. } = r.kind {
                Some(port)
            } else {
                None
            }
        })
        .unwrap_or(7000); // Default AirPlay port

    // TXT records carry device metadata (model, features, ...)
    let txt = parse_txt_pairs(response.records().filter_map(|r| {
        if let mdns::RecordKind::TXT(ref data) = r.kind {
            Some(data.clone())
        } else {
            None
        }
    }));

    if let Some(model) = txt.get("model") {
        debug!("Service {} reports model {}", ptr_name, model);
    }

    let name = instance_label(&ptr_name, service_type);

    Some(ServiceAnnouncement { name, host, port })
}

/// Prefer IPv4 addresses; fall back to the first advertised address.
fn prefer_ipv4(addresses: &[IpAddr]) -> Option<String> {
    addresses
        .iter()
        .find(|addr| matches!(addr, IpAddr::V4(_)))
        .or_else(|| addresses.first())
        .map(|addr| addr.to_string())
}

/// Extracts the instance label from a PTR name.
///
/// "Living Room TV._airplay._tcp.local" with service "_airplay._tcp.local"
/// becomes "Living Room TV". A PTR name that does not end with the service
/// type is kept as-is.
fn instance_label(ptr_name: &str, service_type: &str) -> String {
    ptr_name
        .strip_suffix(service_type)
        .map(|s| s.trim_end_matches('.'))
        .filter(|s| !s.is_empty())
        .unwrap_or(ptr_name)
        .to_string()
}

/// Parse les entrées TXT "clé=valeur" en table.
fn parse_txt_pairs(entries: impl IntoIterator<Item = Vec<String>>) -> HashMap<String, String> {
    entries
        .into_iter()
        .flat_map(|data| {
            // data is Vec<String>, each string is "key=value"
            data.into_iter().filter_map(|s| {
                let parts: Vec<&str> = s.splitn(2, '=').collect();
                if parts.len() == 2 {
                    Some((parts[0].to_string(), parts[1].to_string()))
                } else {
                    None
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_instance_label_strips_service_suffix() {
        assert_eq!(
            instance_label("Living Room TV._airplay._tcp.local", "_airplay._tcp.local"),
            "Living Room TV"
        );
        assert_eq!(
            instance_label("bedroom._airplay._tcp.local", "_airplay._tcp.local"),
            "bedroom"
        );
    }

    #[test]
    fn test_instance_label_keeps_foreign_names() {
        assert_eq!(
            instance_label("printer._ipp._tcp.local", "_airplay._tcp.local"),
            "printer._ipp._tcp.local"
        );
        assert_eq!(
            instance_label("_airplay._tcp.local", "_airplay._tcp.local"),
            "_airplay._tcp.local"
        );
    }

    #[test]
    fn test_prefer_ipv4_over_ipv6() {
        let addresses = vec![
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 40)),
        ];
        assert_eq!(prefer_ipv4(&addresses), Some("192.168.1.40".to_string()));
    }

    #[test]
    fn test_prefer_ipv4_falls_back_to_first() {
        let addresses = vec![IpAddr::V6(Ipv6Addr::LOCALHOST)];
        assert_eq!(prefer_ipv4(&addresses), Some("::1".to_string()));
        assert_eq!(prefer_ipv4(&[]), None);
    }

    #[test]
    fn test_parse_txt_pairs() {
        let txt = parse_txt_pairs(vec![vec![
            "model=AppleTV6,2".to_string(),
            "features=0x5A7FFFF7".to_string(),
            "not-a-pair".to_string(),
        ]]);
        assert_eq!(txt.get("model").map(String::as_str), Some("AppleTV6,2"));
        assert_eq!(
            txt.get("features").map(String::as_str),
            Some("0x5A7FFFF7")
        );
        assert_eq!(txt.len(), 2);
    }
}
