//! Per-user usage accumulator.
//!
//! The proxy engine records traffic, live sessions and rule hits here; the
//! sync daemon drains everything on each report tick.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{OnlineSession, UserTraffic, Violation};

#[derive(Debug, Default)]
struct Usage {
    traffic: BTreeMap<u32, (u64, u64)>,
    sessions: BTreeSet<(u32, String)>,
    violations: Vec<Violation>,
}

/// Thread-safe usage accumulator. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct UsageCollector {
    inner: Arc<Mutex<Usage>>,
}

/// Everything accumulated since the previous drain.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UsageBatch {
    pub traffic: Vec<UserTraffic>,
    pub sessions: Vec<OnlineSession>,
    pub violations: Vec<Violation>,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record traffic for a user (additive).
    pub fn record_traffic(&self, user_id: u32, upload: u64, download: u64) {
        let mut usage = self.inner.lock();
        let entry = usage.traffic.entry(user_id).or_default();
        entry.0 = entry.0.saturating_add(upload);
        entry.1 = entry.1.saturating_add(download);
    }

    /// Record a live session. The same user/IP pair counts once per batch.
    pub fn record_session(&self, user_id: u32, ip: impl Into<String>) {
        self.inner.lock().sessions.insert((user_id, ip.into()));
    }

    pub fn record_violation(&self, violation: Violation) {
        self.inner.lock().violations.push(violation);
    }

    /// Take all accumulated usage and reset.
    ///
    /// Traffic and sessions come out ordered by user id.
    pub fn drain(&self) -> UsageBatch {
        let usage = std::mem::take(&mut *self.inner.lock());
        UsageBatch {
            traffic: usage
                .traffic
                .into_iter()
                .filter(|(_, (up, down))| *up > 0 || *down > 0)
                .map(|(user_id, (upload, download))| UserTraffic {
                    user_id,
                    upload,
                    download,
                })
                .collect(),
            sessions: usage
                .sessions
                .into_iter()
                .map(|(user_id, ip)| OnlineSession { user_id, ip })
                .collect(),
            violations: usage.violations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_drain() {
        let collector = UsageCollector::new();
        collector.record_traffic(2, 50, 75);
        collector.record_traffic(1, 100, 200);
        collector.record_traffic(1, 100, 100);

        let batch = collector.drain();
        assert_eq!(
            batch.traffic,
            vec![
                UserTraffic { user_id: 1, upload: 200, download: 300 },
                UserTraffic { user_id: 2, upload: 50, download: 75 },
            ]
        );
    }

    #[test]
    fn zero_traffic_is_not_reported() {
        let collector = UsageCollector::new();
        collector.record_traffic(1, 0, 0);
        assert!(collector.drain().traffic.is_empty());
    }

    #[test]
    fn sessions_are_deduplicated() {
        let collector = UsageCollector::new();
        collector.record_session(1, "1.1.1.1");
        collector.record_session(1, "1.1.1.1");
        collector.record_session(1, "2.2.2.2");
        collector.record_session(3, "1.1.1.1");

        let batch = collector.drain();
        assert_eq!(batch.sessions.len(), 3);
        assert_eq!(batch.sessions[0].user_id, 1);
        assert_eq!(batch.sessions[2].user_id, 3);
    }

    #[test]
    fn drain_clears() {
        let collector = UsageCollector::new();
        collector.record_traffic(1, 100, 200);
        collector.record_session(1, "1.1.1.1");
        collector.record_violation(Violation { rule_id: -1, user_id: 1, reason: None });
        let _ = collector.drain();
        assert_eq!(collector.drain(), UsageBatch::default());
    }

    #[test]
    fn clone_shares_state() {
        let a = UsageCollector::new();
        let b = a.clone();
        a.record_traffic(1, 10, 20);
        b.record_traffic(1, 30, 40);
        let batch = a.drain();
        assert_eq!(batch.traffic, vec![UserTraffic { user_id: 1, upload: 40, download: 60 }]);
    }
}
