// Countdown driver — polls the clock, publishes text and reloads the page at contest boundaries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{evaluate, Boundary, Countdown};
use super::traits::{Clock, CountdownTarget, PageReloader};
use crate::config::ClientConfig;
use crate::context::{ContextError, ContextHandle};

/// Lifecycle of the engine on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForContext,
    /// Showing a time until the start or the end, or that the contest is over.
    Counting,
    /// Contest has no fixed start.
    Practice,
    /// Boundary crossed, reload scheduled. Terminal.
    Reloading(Boundary),
    /// Context failed to load. Terminal.
    Inert,
    /// Page torn down. Terminal.
    Detached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownOutcome {
    Inert(ContextError),
    Reloaded { boundary: Boundary, delay: Duration },
    Detached,
}

pub struct CountdownEngine {
    clock: Arc<dyn Clock>,
    reloader: Arc<dyn PageReloader>,
    targets: Mutex<Vec<Arc<dyn CountdownTarget>>>,
    sealed: AtomicBool,
    phase: Mutex<Phase>,
    poll_interval: Duration,
    reload_base: Duration,
    reload_jitter: Duration,
    watch_end: bool,
}

impl CountdownEngine {
    pub fn new(
        config: &ClientConfig,
        clock: Arc<dyn Clock>,
        reloader: Arc<dyn PageReloader>,
    ) -> Self {
        Self {
            clock,
            reloader,
            targets: Mutex::new(Vec::new()),
            sealed: AtomicBool::new(false),
            phase: Mutex::new(Phase::WaitingForContext),
            poll_interval: config.poll_interval(),
            reload_base: config.reload_base(),
            reload_jitter: config.reload_jitter(),
            watch_end: config.watch_contest_end,
        }
    }

    /// Register an element to receive countdown text.
    ///
    /// Targets are snapshotted once the context is ready; later registrations
    /// are ignored and return `false`.
    pub fn register(&self, target: Arc<dyn CountdownTarget>) -> bool {
        let mut targets = self.targets.lock();
        if self.sealed.load(Ordering::Acquire) {
            debug!("countdown target registered after start, ignoring");
            return false;
        }
        targets.push(target);
        true
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.lock() = phase;
    }

    /// Drive the countdown until a reload, a failed context, or `shutdown`.
    pub async fn run(&self, context: &ContextHandle, shutdown: CancellationToken) -> CountdownOutcome {
        let loaded = tokio::select! {
            _ = shutdown.cancelled() => return self.detach(),
            result = context.ready() => result,
        };
        let ctx = match loaded {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("countdown inert: {}", e);
                self.set_phase(Phase::Inert);
                return CountdownOutcome::Inert(e);
            }
        };

        let targets = {
            let targets = self.targets.lock();
            self.sealed.store(true, Ordering::Release);
            targets.clone()
        };
        info!(
            "countdown started: targets={} interval={:?}",
            targets.len(),
            self.poll_interval
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return self.detach(),
                _ = ticker.tick() => {}
            }

            let state = evaluate(self.clock.now(), &ctx, self.watch_end);
            let text = state.to_string();
            for target in &targets {
                target.set_text(&text);
            }

            let Some(boundary) = state.boundary() else {
                self.set_phase(match state {
                    Countdown::Practice | Countdown::WaitForStart => Phase::Practice,
                    _ => Phase::Counting,
                });
                continue;
            };

            // The poll stops here; nothing but the reload follows.
            let delay = reload_delay(&mut rand::thread_rng(), self.reload_base, self.reload_jitter);
            self.set_phase(Phase::Reloading(boundary));
            info!("contest boundary {:?} reached, reloading in {:?}", boundary, delay);

            tokio::select! {
                _ = shutdown.cancelled() => return self.detach(),
                _ = tokio::time::sleep(delay) => {}
            }
            self.reloader.reload();
            return CountdownOutcome::Reloaded { boundary, delay };
        }
    }

    fn detach(&self) -> CountdownOutcome {
        debug!("countdown detached");
        self.set_phase(Phase::Detached);
        CountdownOutcome::Detached
    }
}

/// Draw a reload delay uniformly from `[base, base + jitter]`, millisecond
/// granularity.
pub fn reload_delay<R: Rng + ?Sized>(rng: &mut R, base: Duration, jitter: Duration) -> Duration {
    let jitter_ms = jitter.as_millis() as u64;
    base + Duration::from_millis(rng.gen_range(0..=jitter_ms))
}
