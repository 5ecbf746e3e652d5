//! Proactive token refresh.
//!
//! A background task checks the access token's `exp` claim on a fixed
//! interval and refreshes through the session's single-flight path when the
//! remaining lifetime drops below a threshold.

use crate::config::ClientConfig;
use crate::session::{RefreshOutcome, SessionManager};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub check_interval: Duration,
    pub threshold: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60),
            threshold: Duration::from_secs(5 * 60),
        }
    }
}

impl From<&ClientConfig> for RefreshPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            check_interval: config.refresh_check_interval,
            threshold: config.refresh_threshold,
        }
    }
}

/// What a single proactive check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProactiveCheck {
    Skipped,
    Refreshed(RefreshOutcome),
}

pub struct RefreshMonitor;

/// Handle to a running monitor task.
pub struct RefreshMonitorHandle {
    pub shutdown_tx: oneshot::Sender<()>,
    pub task: JoinHandle<()>,
}

impl RefreshMonitorHandle {
    /// Stop the monitor and wait for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

impl RefreshMonitor {
    /// Spawn the monitor on the current tokio runtime.
    pub fn start(session: SessionManager, policy: RefreshPolicy) -> RefreshMonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(policy.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = policy.check_interval.as_secs(),
                threshold_secs = policy.threshold.as_secs(),
                "Proactive token refresh started"
            );

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        debug!("Proactive token refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        Self::check_once(&session, policy.threshold, Utc::now()).await;
                    }
                }
            }
        });

        RefreshMonitorHandle { shutdown_tx, task }
    }

    /// Refresh if the stored access token expires within `threshold` of `now`.
    pub async fn check_once(
        session: &SessionManager,
        threshold: Duration,
        now: DateTime<Utc>,
    ) -> ProactiveCheck {
        let claims = match session.access_token_claims() {
            Ok(Some(claims)) => claims,
            Ok(None) => {
                // Access entry aged out of storage but the refresh token may remain
                if matches!(session.store().get_refresh_token(), Ok(Some(_))) {
                    debug!("Access token missing, refreshing with stored refresh token");
                    return ProactiveCheck::Refreshed(session.refresh_outcome().await);
                }
                return ProactiveCheck::Skipped;
            }
            Err(e) => {
                debug!(error = %e, "Cannot read access token expiry");
                return ProactiveCheck::Skipped;
            }
        };

        if !claims.expires_within(now, threshold) {
            return ProactiveCheck::Skipped;
        }

        debug!(
            remaining_secs = claims.remaining_at(now).num_seconds(),
            "Access token close to expiry, refreshing"
        );
        ProactiveCheck::Refreshed(session.refresh_outcome().await)
    }
}
