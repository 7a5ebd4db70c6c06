//! Arena solo: a local world against scripted opponents.

use engine::{run_session, Autopilot, Config, SessionController, SessionRole, TickOutput};
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

    info!("Arena solo v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("Loaded configuration");
    info!("  Border: {}x{}", config.border.width, config.border.height);
    info!("  Opponents: {} simple, {} smart", config.bots.simple, config.bots.smart);

    let pilot = Autopilot::new(config.player.min_split_mass as f32, config.session.seed);
    let session = SessionController::new(config, SessionRole::Solo);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutting down"),
            Err(e) => error!("Failed to listen for ctrl-c: {}", e),
        }
        let _ = cancel_tx.send(true);
    });

    let summary = run_session(session, pilot, status_sink(), cancel_rx).await;
    info!("Stopped after {} ticks", summary.ticks);
    Ok(())
}

fn status_sink() -> impl FnMut(&TickOutput) + Send {
    let mut frames = 0u64;
    move |out: &TickOutput| {
        frames += 1;
        if frames % STATUS_EVERY == 0 {
            let leader = out.leaderboard.first().map_or("-", |e| e.name.as_str());
            info!(
                "Tick {}: {:?}, score {:.0}, {} cells on field, leader {}",
                out.tick,
                out.phase,
                out.score,
                out.snapshot.cells.len(),
                leader
            );
        }
    }
}
