//! # pmocastcontrol
//!
//! Cœur de la pipeline de diffusion : fenêtre de découverte temporisée,
//! sélection interactive d'un récepteur, orchestration fail-fast des trois
//! étapes (source, device, dispatch).
//!
//! Les collaborateurs concrets vivent ailleurs : le transport mDNS dans
//! `pmobonjour`, la résolution de source dans `pmostream`, la commande
//! AirPlay dans `pmoairplay`. Ce crate ne connaît que leurs seams.

pub mod errors;
pub mod feed;
pub mod model;
pub mod pipeline;
pub mod selector;
pub mod window;

pub use errors::CastError;
pub use feed::{BonjourFeed, DiscoveryFeed, FeedSubscription};
pub use model::{Candidate, MediaSource, PipelineResult, PipelineStage};
pub use pipeline::{
    CastConfig, CastPipeline, NoopObserver, PipelineObserver, PlaybackDispatcher, SourceResolver,
    StageOutcome,
};
pub use selector::{CandidateSelector, DeviceSelector};
pub use window::DiscoveryWindow;
