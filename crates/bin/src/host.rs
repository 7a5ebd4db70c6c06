//! Arena host: runs the authoritative world and serves observers over websockets.

use engine::{link, run_session, Autopilot, Config, HostTransport, SessionController, SessionRole, TickOutput};
use tokio::net::TcpListener;
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

    info!("Arena host v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Listen: {}:{}", config.net.bind, config.net.port);
    info!("  Border: {}x{}", config.border.width, config.border.height);
    info!("  Broadcast every {} ticks", config.session.broadcast_interval);

    let listener = TcpListener::bind((config.net.bind.as_str(), config.net.port)).await?;
    let (authority, port) = link();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let transport = tokio::spawn(HostTransport::new(port).serve(listener, cancel_rx.clone()));

    let pilot = Autopilot::new(config.player.min_split_mass as f32, config.session.seed);
    let session = SessionController::new(config, SessionRole::Authority(authority));

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }
        let _ = cancel_tx.send(true);
    });

    let summary = run_session(session, pilot, status_sink(), cancel_rx).await;
    transport.await??;
    info!("Stopped after {} ticks", summary.ticks);
    Ok(())
}

fn status_sink() -> impl FnMut(&TickOutput) + Send {
    let mut frames = 0u64;
    move |out: &TickOutput| {
        frames += 1;
        if frames % STATUS_EVERY == 0 {
            info!(
                "Tick {}: {:?}, score {:.0}, {} players, {} cells",
                out.tick,
                out.phase,
                out.score,
                out.snapshot.players.len(),
                out.snapshot.cells.len()
            );
        }
    }
}
