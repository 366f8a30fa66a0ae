//! Periodic cleanup of payments that stayed `Pending` too long.

use super::cache::PaymentCache;
use super::lifecycle::PaymentService;
use crate::config::SweeperConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info};

/// Outcome of a single sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub cutoff: DateTime<Utc>,
    pub expired: usize,
}

/// Scheduled worker that fails stale pending payments.
///
/// It shares nothing with request handlers except the store behind
/// `PaymentService` and, optionally, the read cache it has to clear.
pub struct CleanupSweeper {
    service: Arc<PaymentService>,
    config: SweeperConfig,
    cache: Option<PaymentCache>,
}

impl CleanupSweeper {
    pub fn new(service: Arc<PaymentService>, config: SweeperConfig) -> Self {
        Self {
            service,
            config,
            cache: None,
        }
    }

    /// Clears `cache` after every sweep.
    pub fn with_cache(mut self, cache: PaymentCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Fails every pending payment created before `cutoff`.
    pub async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<SweepReport> {
        let expired = self.service.fail_pending_before(cutoff).await?;

        if expired == 0 {
            debug!(%cutoff, "No stale pending payments found");
        } else {
            info!(expired, %cutoff, "Marked stale pending payments as FAILED");
        }

        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }

        Ok(SweepReport { cutoff, expired })
    }

    /// Sweeps with `cutoff = now - pending_timeout`.
    pub async fn sweep_now(&self) -> Result<SweepReport> {
        let cutoff = self.config.pending_cutoff(Utc::now())?;
        self.sweep(cutoff).await
    }

    /// Start the sweeper in the background.
    ///
    /// The task stops once `shutdown` turns `true` or its sender is dropped.
    pub fn start(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            info!(
                interval_secs = self.config.interval_secs,
                pending_timeout_secs = self.config.pending_timeout_secs,
                "Cleanup sweeper started"
            );

            match self.run(shutdown).await {
                Ok(()) => {
                    info!("Cleanup sweeper stopped");
                    Ok(())
                }
                Err(e) => {
                    error!("Cleanup sweeper error: {}", e);
                    Err(e)
                }
            }
        })
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let period = self.config.interval();
        let first_tick = if self.config.align_to_interval {
            Instant::now() + delay_until_next_boundary(Utc::now(), period)
        } else {
            Instant::now() + period
        };
        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // sender gone, nobody can ask us to stop any more
                        return Ok(());
                    }
                }
                _ = ticker.tick() => {
                    // a failed sweep is retried on the next tick
                    if let Err(e) = self.sweep_now().await {
                        error!(error = %e, "Cleanup sweep failed");
                    }
                }
            }
        }
    }
}

/// Time left until the next wall-clock multiple of `period`.
///
/// Zero when `now` sits exactly on a boundary.
pub fn delay_until_next_boundary(now: DateTime<Utc>, period: Duration) -> Duration {
    let period_ms = period.as_millis().max(1);
    let now_ms = u128::try_from(now.timestamp_millis()).unwrap_or(0);
    let remainder = now_ms % period_ms;
    if remainder == 0 {
        Duration::ZERO
    } else {
        Duration::from_millis(u64::try_from(period_ms - remainder).unwrap_or(u64::MAX))
    }
}
