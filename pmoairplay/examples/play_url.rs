use pmoairplay::AirPlayDevice;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: play_url <host> <media-url> [port]";
    let host = args.next().expect(usage);
    let url = args.next().expect(usage);
    let port = args
        .next()
        .map(|p| p.parse())
        .transpose()?
        .unwrap_or(pmoairplay::DEFAULT_PORT);

    let device = AirPlayDevice::connect(&host, port).await?;
    device.play(&url).await?;
    println!("Playback handed to {}:{}", host, port);

    Ok(())
}
