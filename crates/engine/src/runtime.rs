//! Tokio tick loop driving a [`SessionController`].

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::session::{FrameInput, Phase, SessionController, SessionSummary, TickOutput};

/// Ticks between timing reports.
const METRICS_EVERY: u64 = 400;

/// Supplies the local input for each tick.
pub trait InputSource: Send {
    /// `last` is the previous tick's output, `None` before the first tick.
    fn next_input(&mut self, last: Option<&TickOutput>) -> FrameInput;
}

/// Repeats the same input every tick.
impl InputSource for FrameInput {
    fn next_input(&mut self, _last: Option<&TickOutput>) -> FrameInput {
        *self
    }
}

/// Receives every tick's output.
pub trait OutputSink: Send {
    fn emit(&mut self, output: &TickOutput);
}

impl<F> OutputSink for F
where
    F: FnMut(&TickOutput) + Send,
{
    fn emit(&mut self, output: &TickOutput) {
        self(output)
    }
}

/// Drive `session` at its configured tick interval until `cancel` turns
/// true or its sender is dropped. Leaves the lobby on the first call.
/// Returns what the session reported on teardown.
pub async fn run_session<I, S>(
    mut session: SessionController,
    mut input: I,
    mut sink: S,
    mut cancel: watch::Receiver<bool>,
) -> SessionSummary
where
    I: InputSource,
    S: OutputSink,
{
    let tick_interval_ms = session.config().session.tick_interval_ms.max(1);
    let period = Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    if session.phase() == Phase::Lobby {
        session.start();
    }
    info!("Running {:?} session at {}ms per tick", session.role(), tick_interval_ms);

    let tick_budget = tick_interval_ms as f64 * 0.9;
    let mut last: Option<TickOutput> = None;
    let mut window_ms = 0.0f64;
    let mut worst_ms = 0.0f64;
    let mut count = 0u64;

    if !*cancel.borrow() {
        loop {
            tokio::select! {
                biased;
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let frame = input.next_input(last.as_ref());
                    let started = std::time::Instant::now();
                    let output = session.tick(frame);
                    let tick_ms = started.elapsed().as_secs_f64() * 1000.0;

                    if tick_ms > tick_budget {
                        warn!(
                            "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} cells",
                            output.tick,
                            tick_ms,
                            tick_budget,
                            output.snapshot.cells.len()
                        );
                    }
                    count += 1;
                    window_ms += tick_ms;
                    worst_ms = worst_ms.max(tick_ms);
                    if count % METRICS_EVERY == 0 {
                        debug!(
                            "Tick timing over last {} ticks: avg {:.3}ms, worst {:.3}ms",
                            METRICS_EVERY,
                            window_ms / METRICS_EVERY as f64,
                            worst_ms
                        );
                        window_ms = 0.0;
                        worst_ms = 0.0;
                    }

                    sink.emit(&output);
                    last = Some(output);
                }
            }
        }
    }

    session.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionRole;
    use crate::world::tests::empty_config;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_runs_until_cancelled() {
        let mut config = empty_config();
        config.session.tick_interval_ms = 10;
        let session = SessionController::new(config, SessionRole::Solo);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = move |out: &TickOutput| sink_seen.lock().unwrap().push(out.tick);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_session(session, FrameInput::default(), sink, cancel_rx));

        tokio::time::sleep(Duration::from_millis(150)).await;
        cancel_tx.send(true).unwrap();
        let ticks = handle.await.unwrap().ticks;

        let seen = seen.lock().unwrap();
        assert_eq!(ticks, seen.len() as u64);
        assert!(ticks >= 3);
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[tokio::test]
    async fn test_already_cancelled_runs_nothing() {
        let session = SessionController::new(empty_config(), SessionRole::Solo);
        let (_cancel_tx, cancel_rx) = watch::channel(true);
        let summary = run_session(session, FrameInput::default(), |_: &TickOutput| {}, cancel_rx).await;
        assert_eq!(summary, SessionSummary::default());
    }
}
