//! Arena join: mirrors a remote authority and plays through intents.

use engine::{link, run_session, Autopilot, Config, JoinTransport, SessionController, SessionRole, TickOutput};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Frames between status lines.
const STATUS_EVERY: u64 = 250;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Arena join v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Authority: {}", config.net.url);
    info!("  Name: {}", config.session.player_name);

    let (observer, port) = link();
    let (cancel_tx, cancel_rx) = watch::channel(false);

    // The session stops when the authority goes away.
    let transport_cancel = cancel_tx.clone();
    let transport_rx = cancel_rx.clone();
    let url = config.net.url.clone();
    let transport = tokio::spawn(async move {
        let result = JoinTransport::new(url, port).run(transport_rx).await;
        let _ = transport_cancel.send(true);
        result
    });

    let pilot = Autopilot::new(config.player.min_split_mass as f32, None);
    let session = SessionController::new(config, SessionRole::Observer(observer));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }
        let _ = cancel_tx.send(true);
    });

    let summary = run_session(session, pilot, status_sink(), cancel_rx).await;
    if let Err(e) = transport.await? {
        error!("Connection error: {}", e);
    }
    info!("Stopped after {} ticks", summary.ticks);
    Ok(())
}

fn status_sink() -> impl FnMut(&TickOutput) + Send {
    let mut frames = 0u64;
    move |out: &TickOutput| {
        frames += 1;
        if frames % STATUS_EVERY == 0 {
            info!(
                "Authority tick {}: {:?}, score {:.0}, awaiting spawn: {}",
                out.tick, out.phase, out.score, out.awaiting_spawn
            );
        }
    }
}
