//! System-wide memory telemetry.

use parking_lot::Mutex;
use sysinfo::System;

use crate::common::{Error, Result};

/// Reports how much of the machine's memory is in use.
pub trait SystemTelemetry: Send + Sync {
    /// Used memory as a percentage of total (0.0 to 100.0).
    fn used_memory_percent(&self) -> Result<f32>;
}

/// [`SystemTelemetry`] backed by the `sysinfo` crate.
pub struct SysinfoTelemetry {
    system: Mutex<System>,
}

impl SysinfoTelemetry {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTelemetry for SysinfoTelemetry {
    fn used_memory_percent(&self) -> Result<f32> {
        let mut sys = self.system.lock();
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(Error::Telemetry("total memory reported as zero".into()));
        }
        Ok((sys.used_memory() as f64 / total as f64 * 100.0) as f32)
    }
}
