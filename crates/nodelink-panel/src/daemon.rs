//! Background sync loop.
//!
//! Two timers drive the client: the update tick pulls node config, users
//! and rules and publishes them as a [`SyncSnapshot`]; the report tick
//! pushes host status and the usage drained from the [`UsageCollector`].

use std::sync::Arc;
use std::time::Duration;

use nodelink_config::SyncConfig;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::PanelClient;
use crate::collector::UsageCollector;
use crate::error::PanelError;
use crate::model::{NodeConfig, UserRecord};
use crate::rules::DetectionRule;
use crate::status::SystemProbe;

/// Everything the proxy engine needs for one update cycle.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub node: NodeConfig,
    pub users: Vec<UserRecord>,
    pub rules: Vec<DetectionRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncIntervals {
    pub update: Duration,
    pub report: Duration,
}

impl From<&SyncConfig> for SyncIntervals {
    fn from(cfg: &SyncConfig) -> Self {
        Self {
            update: Duration::from_secs(cfg.update_interval_secs),
            report: Duration::from_secs(cfg.report_interval_secs),
        }
    }
}

/// Run the sync loop until `shutdown` is cancelled.
///
/// Both timers fire immediately on start. Failures are logged and retried
/// on the next tick; the previous snapshot stays published.
pub async fn run_sync_loop(
    client: Arc<PanelClient>,
    collector: UsageCollector,
    mut probe: SystemProbe,
    intervals: SyncIntervals,
    snapshots: watch::Sender<Option<SyncSnapshot>>,
    shutdown: CancellationToken,
) {
    let mut update_ticker = tokio::time::interval(intervals.update);
    update_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut report_ticker = tokio::time::interval(intervals.report);
    report_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("sync loop shutting down");
                return;
            }

            _ = update_ticker.tick() => {
                match pull_snapshot(&client).await {
                    Ok(snapshot) => {
                        info!(
                            port = snapshot.node.port,
                            users = snapshot.users.len(),
                            rules = snapshot.rules.len(),
                            "panel sync complete"
                        );
                        snapshots.send_replace(Some(snapshot));
                    }
                    Err(e) => warn!(error = %e, "panel sync failed"),
                }
            }

            _ = report_ticker.tick() => {
                report_usage(&client, &collector, &mut probe).await;
            }
        }
    }
}

async fn pull_snapshot(client: &PanelClient) -> Result<SyncSnapshot, PanelError> {
    let node = client.fetch_node_config().await?;
    let users = client.fetch_user_list().await?;
    let rules = client.fetch_rules().await?;
    Ok(SyncSnapshot { node, users, rules })
}

/// Push one round of reports. Each report is independent of the others.
async fn report_usage(client: &PanelClient, collector: &UsageCollector, probe: &mut SystemProbe) {
    if let Err(e) = client.report_status(&probe.sample()).await {
        warn!(error = %e, "failed to report node status");
    }

    let batch = collector.drain();

    if let Err(e) = client.report_online_users(&batch.sessions).await {
        warn!(error = %e, sessions = batch.sessions.len(), "failed to report online users");
    }

    if !batch.traffic.is_empty() {
        debug!(count = batch.traffic.len(), "sending traffic report");
        if let Err(e) = client.report_user_traffic(&batch.traffic).await {
            warn!(error = %e, dropped = batch.traffic.len(), "failed to report user traffic");
        }
    }

    if !batch.violations.is_empty()
        && let Err(e) = client.report_violations(&batch.violations).await
    {
        warn!(error = %e, "failed to report rule violations");
    }
}
