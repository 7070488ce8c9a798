/// Audit log retention
///
/// Sweeps the `logs` table on a fixed interval and deletes rows older than
/// the retention window. The first sweep runs right after startup.
///
/// # Example
///
/// ```no_run
/// use xfinance_worker::retention::{RetentionConfig, RetentionWorker};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let worker = RetentionWorker::new(pool, RetentionConfig::default());
///
/// let token = worker.shutdown_token();
/// tokio::spawn(async move {
///     tokio::signal::ctrl_c().await.ok();
///     token.cancel();
/// });
///
/// worker.run().await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use xfinance_shared::models::log::AuditLog;

/// Upper bound on `retention_days`, about a century
pub const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionConfig {
    /// Rows older than this many days are deleted
    pub retention_days: i64,

    /// Pause between sweeps
    pub interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention_days: 90,
            interval_secs: 3600,
        }
    }
}

impl RetentionConfig {
    /// Oldest timestamp that survives a sweep at `now`
    ///
    /// `None` when the window does not fit in a timestamp.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        TimeDelta::try_days(self.retention_days).and_then(|window| now.checked_sub_signed(window))
    }
}

pub struct RetentionWorker {
    db: PgPool,
    config: RetentionConfig,
    shutdown_token: CancellationToken,
}

impl RetentionWorker {
    pub fn new(db: PgPool, config: RetentionConfig) -> Self {
        Self {
            db,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Cancelling the token stops `run` after the current sweep
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Deletes expired rows once, returns how many went
    pub async fn sweep(&self) -> anyhow::Result<u64> {
        let cutoff = self.config.cutoff(Utc::now()).ok_or_else(|| {
            anyhow::anyhow!("retention window of {} days is out of range", self.config.retention_days)
        })?;
        let deleted = AuditLog::delete_older_than(&self.db, cutoff).await?;

        if deleted > 0 {
            tracing::info!(deleted, %cutoff, "Expired audit log rows deleted");
        } else {
            tracing::debug!(%cutoff, "No expired audit log rows");
        }

        Ok(deleted)
    }

    /// Sweeps until shutdown
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!(
            retention_days = self.config.retention_days,
            interval_secs = self.config.interval_secs,
            "Log retention worker starting"
        );

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Log retention worker shut down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        tracing::error!(error = %e, "Log retention sweep failed");
                    }
                }
            }
        }

        Ok(())
    }
}
