//! Orchestration de la pipeline de diffusion.
//!
//! Three stages, strictly forward, fail-fast:
//!
//! ```text
//! resolve source -> resolve device -> dispatch
//! ```
//!
//! Every stage failure is terminal; nothing is retried. Exactly one
//! [`PipelineResult`] comes out of [`CastPipeline::run`]. Presentation is
//! not this crate's business: lifecycle is reported through the
//! [`PipelineObserver`] seam and the binary decides how to show it.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use pmobonjour::SERVICE_AIRPLAY;

use crate::errors::CastError;
use crate::feed::DiscoveryFeed;
use crate::model::{Candidate, MediaSource, PipelineResult, PipelineStage};
use crate::selector::CandidateSelector;
use crate::window::DiscoveryWindow;

/// Résolution d'un identifiant de source vers un flux jouable. One-shot.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, source_id: &str) -> Result<MediaSource, CastError>;
}

/// Envoi de la commande de lecture au récepteur choisi. Single attempt.
#[async_trait]
pub trait PlaybackDispatcher: Send + Sync {
    async fn dispatch(&self, target: &Candidate, source: &MediaSource) -> Result<(), CastError>;
}

/// Issue d'une étape, telle que vue par l'observateur.
#[derive(Clone, Debug)]
pub enum StageOutcome {
    Completed(String),
    Failed(String),
}

/// Observation du cycle de vie de la pipeline (spinners, logs, rien).
///
/// Default implementations do nothing, so an observer only implements what
/// it cares about.
pub trait PipelineObserver: Send + Sync {
    fn on_stage_enter(&self, _stage: PipelineStage) {}
    fn on_stage_result(&self, _stage: PipelineStage, _outcome: &StageOutcome) {}
}

/// Observateur par défaut : silencieux.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Valeurs de configuration consommées par la pipeline.
#[derive(Clone, Debug)]
pub struct CastConfig {
    /// Discovery window in seconds; 0 means first responder wins.
    pub timeout_secs: u64,
    /// Explicit device host. Skips discovery and selection entirely.
    pub device: Option<String>,
    /// Port used for the explicit device.
    pub port: u16,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            device: None,
            port: 7000,
        }
    }
}

/// La pipeline une-fois : construite, exécutée, terminée.
pub struct CastPipeline {
    config: CastConfig,
    resolver: Box<dyn SourceResolver>,
    feed: Box<dyn DiscoveryFeed>,
    dispatcher: Box<dyn PlaybackDispatcher>,
    selector: Box<dyn CandidateSelector>,
    observer: Box<dyn PipelineObserver>,
}

impl CastPipeline {
    pub fn new(
        config: CastConfig,
        resolver: Box<dyn SourceResolver>,
        feed: Box<dyn DiscoveryFeed>,
        dispatcher: Box<dyn PlaybackDispatcher>,
        selector: Box<dyn CandidateSelector>,
    ) -> Self {
        Self {
            config,
            resolver,
            feed,
            dispatcher,
            selector,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Drives the three stages to a single terminal result.
    ///
    /// Cancellation is honored at every suspension point: the stage in
    /// flight fails with [`CastError::Cancelled`], held subscriptions are
    /// released on drop, and the dispatcher is never invoked afterwards.
    pub async fn run(mut self, source_id: &str, cancel: CancellationToken) -> PipelineResult {
        // ---------- Stage 1 : resolve the source ----------
        self.observer.on_stage_enter(PipelineStage::Source);
        let resolved = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CastError::Cancelled),
            resolved = self.resolver.resolve(source_id) => resolved,
        };
        let source = match resolved {
            Ok(source) => source,
            Err(e) => return self.fail(PipelineStage::Source, e),
        };
        if let Ok(dump) = serde_json::to_string_pretty(&source) {
            debug!("resolved source:\n{}", dump);
        }
        self.observer.on_stage_result(
            PipelineStage::Source,
            &StageOutcome::Completed(source.title.clone()),
        );

        // ---------- Stage 2 : resolve the device ----------
        self.observer.on_stage_enter(PipelineStage::Device);
        let target = if let Some(host) = self.config.device.clone() {
            // Explicit override: absolute precedence over discovery.
            debug!("using configured device {}:{}", host, self.config.port);
            Candidate {
                name: host.clone(),
                host,
                port: self.config.port,
            }
        } else {
            match self.discover_and_select(&cancel).await {
                Ok(candidate) => candidate,
                Err(e) => return self.fail(PipelineStage::Device, e),
            }
        };
        if let Ok(dump) = serde_json::to_string_pretty(&target) {
            debug!("selected device:\n{}", dump);
        }
        self.observer.on_stage_result(
            PipelineStage::Device,
            &StageOutcome::Completed(target.to_string()),
        );

        // ---------- Stage 3 : dispatch playback ----------
        self.observer.on_stage_enter(PipelineStage::Dispatch);
        if cancel.is_cancelled() {
            // Cancellation must never reach the dispatcher.
            return self.fail(PipelineStage::Dispatch, CastError::Cancelled);
        }
        let dispatched = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CastError::Cancelled),
            dispatched = self.dispatcher.dispatch(&target, &source) => dispatched,
        };
        match dispatched {
            Ok(()) => {
                self.observer.on_stage_result(
                    PipelineStage::Dispatch,
                    &StageOutcome::Completed(format!("Playing \"{}\"", source.title)),
                );
                PipelineResult::Success
            }
            Err(e) => self.fail(PipelineStage::Dispatch, e),
        }
    }

    async fn discover_and_select(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Candidate, CastError> {
        let subscription = self.feed.subscribe(SERVICE_AIRPLAY)?;
        let window = DiscoveryWindow::new(self.config.timeout_secs);

        // Dropping the window future on cancellation releases the feed
        // subscription through its Drop.
        let found = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CastError::Cancelled),
            found = window.collect(subscription) => found?,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CastError::Cancelled),
            chosen = self.selector.select(found) => chosen,
        }
    }

    fn fail(&self, stage: PipelineStage, error: CastError) -> PipelineResult {
        self.observer
            .on_stage_result(stage, &StageOutcome::Failed(error.to_string()));
        PipelineResult::Failure { stage, error }
    }
}
