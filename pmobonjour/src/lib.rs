//! Client mDNS pour la découverte des récepteurs de lecture réseau.
//!
//! Les récepteurs AirPlay s'annoncent en mDNS (Multicast DNS) sur le service
//! `_airplay._tcp.local`, contrairement aux devices UPnP qui utilisent SSDP.
//! Ce crate transforme le flux brut de réponses mDNS en événements
//! [`ServiceAnnouncement`] livrés sur un canal, un événement par annonce,
//! dans l'ordre d'arrivée.
//!
//! Le browser n'effectue aucune déduplication : un récepteur qui s'annonce
//! plusieurs fois produit plusieurs événements. C'est au consommateur de
//! décider quoi en faire.

pub mod browser;
pub mod errors;

use std::time::Duration;

pub use browser::{BonjourBrowser, BrowseHandle, ServiceAnnouncement};
pub use errors::BonjourError;

/// Service mDNS annoncé par les récepteurs AirPlay.
pub const SERVICE_AIRPLAY: &str = "_airplay._tcp.local";

/// Default interval between mDNS queries while a browse is active.
pub const DEFAULT_QUERY_INTERVAL: Duration = Duration::from_secs(5);
