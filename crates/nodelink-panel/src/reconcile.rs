//! Device-limit reconciliation against recently reported online sessions.
//!
//! The panel counts a user's live sessions (`O`) and knows their device
//! limit (`L`). Handing `L` straight to the proxy engine would lock a user
//! out as soon as `O` reaches `L`, including sessions the engine already
//! admitted. Instead the effective limit is `L - O + P`, where `P` is the
//! count this node itself reported last time: the slots the user already
//! held here are added back, so a lower limit only throttles growth.
//!
//! A user with no headroom and nothing held on this node is left out of the
//! result entirely; the engine treats a missing user as "deny new
//! connections" for the cycle.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::model::{OnlineSession, PanelUser, UserRecord};

/// Effective device limit for one user, or `None` to drop the user.
///
/// `limit` is the base limit (0 = unlimited), `online` the panel's count
/// of live sessions and `previous` the count last reported from this node.
pub fn effective_device_limit(limit: u32, online: u32, previous: u32) -> Option<u32> {
    if limit == 0 || online == 0 {
        return Some(limit);
    }
    let candidate = i64::from(limit) - i64::from(online) + i64::from(previous);
    if candidate > 0 {
        Some(u32::try_from(candidate).unwrap_or(u32::MAX))
    } else if previous > 0 {
        Some(previous)
    } else {
        None
    }
}

/// Count sessions per user id.
pub fn count_sessions(sessions: &[OnlineSession]) -> HashMap<u32, u32> {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    for session in sessions {
        *counts.entry(session.user_id).or_default() += 1;
    }
    counts
}

/// Holds the last reported per-user session counts.
///
/// One lock guards both the report write and the whole reconciliation pass,
/// so a report never lands halfway through a user list.
#[derive(Debug, Default)]
pub struct LimitReconciler {
    last_online: Mutex<HashMap<u32, u32>>,
}

impl LimitReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the retained counts with those from a fresh online report.
    ///
    /// Returns the number of distinct users now tracked.
    pub fn record_report(&self, sessions: &[OnlineSession]) -> usize {
        let counts = count_sessions(sessions);
        let tracked = counts.len();
        *self.last_online.lock() = counts;
        tracked
    }

    /// Apply device-limit reconciliation to a freshly decoded user list.
    ///
    /// Order is preserved; users without headroom are dropped. Retained
    /// entries for users the panel now sees offline are pruned.
    pub fn reconcile(&self, users: Vec<PanelUser>) -> Vec<UserRecord> {
        let mut last_online = self.last_online.lock();
        let mut records = Vec::with_capacity(users.len());

        for user in users {
            let previous = last_online.get(&user.id).copied();

            if user.online_count == 0 && previous.is_some() {
                last_online.remove(&user.id);
            }

            match effective_device_limit(
                user.device_limit,
                user.online_count,
                previous.unwrap_or(0),
            ) {
                Some(device_limit) => records.push(UserRecord {
                    id: user.id,
                    credential: user.credential,
                    speed_limit: user.speed_limit,
                    device_limit,
                }),
                None => debug!(
                    user_id = user.id,
                    limit = user.device_limit,
                    online = user.online_count,
                    "no device headroom, withholding user this cycle"
                ),
            }
        }

        records
    }

    /// Retained session count for a user, if any.
    pub fn retained(&self, user_id: u32) -> Option<u32> {
        self.last_online.lock().get(&user_id).copied()
    }

    /// Copy of all retained counts.
    pub fn snapshot(&self) -> HashMap<u32, u32> {
        self.last_online.lock().clone()
    }

    /// Forget all retained counts.
    pub fn reset(&self) {
        self.last_online.lock().clear();
    }
}
