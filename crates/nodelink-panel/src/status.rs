//! Host load sampling for status reports.

use sysinfo::{Disks, System};

use crate::model::NodeStatus;

/// Samples host uptime, CPU, memory and disk usage.
///
/// CPU usage is measured between consecutive samples, so the first sample
/// after construction may read zero.
#[derive(Debug)]
pub struct SystemProbe {
    sys: System,
    disks: Disks,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            sys: System::new(),
            disks: Disks::new_with_refreshed_list(),
        }
    }

    pub fn sample(&mut self) -> NodeStatus {
        self.sys.refresh_memory();
        self.sys.refresh_cpu_usage();
        self.disks.refresh(true);

        let (disk_total, disk_available) = self
            .disks
            .list()
            .iter()
            .fold((0u64, 0u64), |(total, avail), d| {
                (
                    total.saturating_add(d.total_space()),
                    avail.saturating_add(d.available_space()),
                )
            });

        NodeStatus {
            uptime: System::uptime(),
            cpu: f64::from(self.sys.global_cpu_usage()),
            mem: percent(self.sys.used_memory(), self.sys.total_memory()),
            disk: percent(disk_total.saturating_sub(disk_available), disk_total),
        }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}
