//! Client AirPlay minimal : connexion à un récepteur et commande de lecture.
//!
//! The AirPlay video control protocol is plain HTTP on the receiver. Two
//! commands are enough to hand a stream over:
//!
//! - `GET /server-info` to validate that something AirPlay-shaped answers
//!   at the given host/port;
//! - `POST /play` with a `text/parameters` body carrying the media URL and
//!   a start position, after which the receiver fetches and plays the
//!   stream on its own.
//!
//! Everything else (scrub, rate, photos, screen mirroring) is out of scope.

pub mod device;
pub mod dispatcher;
pub mod errors;

pub use device::AirPlayDevice;
pub use dispatcher::AirPlayDispatcher;
pub use errors::AirPlayError;

/// Port HTTP par défaut des récepteurs AirPlay.
pub const DEFAULT_PORT: u16 = 7000;
