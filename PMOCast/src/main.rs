use std::process::ExitCode;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pmoairplay::AirPlayDispatcher;
use pmocastcontrol::{
    BonjourFeed, CastConfig, CastPipeline, DeviceSelector, PipelineObserver, PipelineResult,
    PipelineStage, StageOutcome,
};
use pmostream::HttpStreamResolver;

/// Cast a media stream to an AirPlay device on the local network.
#[derive(Debug, Parser)]
#[command(name = "pmocast", version, about)]
struct Cli {
    /// URL of the media stream to play
    url: String,

    /// Hostname or IP of the AirPlay device (skips discovery)
    #[arg(short = 'd', long = "device")]
    device: Option<String>,

    /// Port number of the AirPlay device
    #[arg(short = 'p', long = "port", default_value_t = pmoairplay::DEFAULT_PORT)]
    port: u16,

    /// Collect devices for this many seconds before choosing
    /// (0 = play on the first device that answers)
    #[arg(short = 't', long = "timeout", default_value_t = 0)]
    timeout: u64,

    /// Give up interactive selection after this many invalid answers
    #[arg(long = "max-prompts", env = "PMOCAST_MAX_PROMPTS")]
    max_prompts: Option<u32>,

    /// Enable verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Console rendering of the pipeline lifecycle, one line per transition.
struct ConsoleObserver;

impl PipelineObserver for ConsoleObserver {
    fn on_stage_enter(&self, stage: PipelineStage) {
        match stage {
            PipelineStage::Source => info!("🔍 Loading stream info..."),
            PipelineStage::Device => info!("📡 Looking for an AirPlay device..."),
            PipelineStage::Dispatch => info!("📺 Starting playback..."),
        }
    }

    fn on_stage_result(&self, stage: PipelineStage, outcome: &StageOutcome) {
        match outcome {
            StageOutcome::Completed(detail) => info!("✅ {}", detail),
            // The terminal error line carries the reason; here only the
            // stage marker.
            StageOutcome::Failed(_) => error!("❌ {} stage failed", stage),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolver = match HttpStreamResolver::new() {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Cannot build the HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = CastConfig {
        timeout_secs: cli.timeout,
        device: cli.device,
        port: cli.port,
    };

    let mut selector = DeviceSelector::console();
    if let Some(max) = cli.max_prompts {
        selector = selector.with_max_attempts(max);
    }

    let pipeline = CastPipeline::new(
        config,
        Box::new(resolver),
        Box::new(BonjourFeed::new()),
        Box::new(AirPlayDispatcher::new()),
        Box::new(selector),
    )
    .with_observer(Box::new(ConsoleObserver));

    // Ctrl+C cancels the run at the next suspension point; held
    // subscriptions are released and the dispatcher is never reached.
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, shutting down...");
            interrupt.cancel();
        }
    });

    match pipeline.run(&cli.url, cancel).await {
        PipelineResult::Success => ExitCode::SUCCESS,
        PipelineResult::Failure { stage, error } => {
            error!("Error during the {} stage: {}", stage, error);
            ExitCode::FAILURE
        }
    }
}
