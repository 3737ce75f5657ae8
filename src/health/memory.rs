//! Process memory sampling.

use std::sync::Mutex;

use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Memory figures in MiB, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryUsage {
    /// Resident memory of this process.
    pub used: f64,
    /// Total memory of the host.
    pub total: f64,
}

/// Round a byte count to MiB with two decimals.
pub fn to_mib(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MIB * 100.0).round() / 100.0
}

/// Reusable sysinfo handle scoped to the current process.
pub struct MemoryProbe {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = e, "Cannot resolve current pid; process memory reported as 0");
                None
            }
        };
        Self {
            pid,
            system: Mutex::new(System::new()),
        }
    }

    /// Take a fresh sample.
    pub fn sample(&self) -> MemoryUsage {
        let mut system = self.system.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        system.refresh_memory();

        let used = match self.pid {
            Some(pid) => {
                system.refresh_processes_specifics(
                    ProcessesToUpdate::Some(&[pid]),
                    true,
                    ProcessRefreshKind::nothing().with_memory(),
                );
                system.process(pid).map(|p| p.memory()).unwrap_or(0)
            }
            None => 0,
        };

        MemoryUsage {
            used: to_mib(used),
            total: to_mib(system.total_memory()),
        }
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}
