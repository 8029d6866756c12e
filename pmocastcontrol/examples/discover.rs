use pmobonjour::SERVICE_AIRPLAY;
use pmocastcontrol::{BonjourFeed, DiscoveryFeed};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Un tout petit logging optionnel
    tracing_subscriber::fmt::init();
    tracing::info!("Browsing for AirPlay devices, Ctrl+C to stop...");

    let feed = BonjourFeed::new();
    let mut subscription = feed.subscribe(SERVICE_AIRPLAY)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            candidate = subscription.next() => match candidate {
                Some(c) => println!("- {}", c),
                None => break,
            }
        }
    }

    Ok(())
}
