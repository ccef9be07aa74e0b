//! Background memory-pressure monitor.
//!
//! A named thread wakes every interval, samples [`SystemTelemetry`] and asks
//! the manager to shrink when system memory is under pressure. Dropping the
//! stop sender disconnects the channel and wakes the thread immediately.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, error, info, warn};

use crate::common::Result;
use crate::manager::memory_manager::MemoryManager;
use crate::manager::telemetry::SystemTelemetry;

pub(crate) struct MonitorHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub(crate) fn spawn(
        manager: Weak<MemoryManager>,
        telemetry: Arc<dyn SystemTelemetry>,
        interval: Duration,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let thread = thread::Builder::new()
            .name("framecache-monitor".into())
            .spawn(move || run(manager, telemetry, interval, stop_rx))?;

        info!(interval_ms = interval.as_millis() as u64, "memory monitor started");
        Ok(Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Signal the thread and wait for it to exit.
    pub(crate) fn stop(&mut self) {
        drop(self.stop.take());

        let Some(thread) = self.thread.take() else {
            return;
        };
        // The last manager reference can be released by the monitor itself.
        if thread.thread().id() == thread::current().id() {
            return;
        }
        if thread.join().is_err() {
            warn!("memory monitor thread panicked");
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    manager: Weak<MemoryManager>,
    telemetry: Arc<dyn SystemTelemetry>,
    interval: Duration,
    stop_rx: Receiver<()>,
) {
    let mut wait = interval;
    loop {
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let Some(manager) = manager.upgrade() else {
            break;
        };
        let outcome = manager.relieve_pressure(telemetry.as_ref());
        if let Err(e) = &outcome {
            error!(error = %e, "memory check failed, backing off");
        }
        wait = next_wait(interval, &outcome);
    }
    debug!("memory monitor stopped");
}

/// The configured interval after a successful check, twice it after a failure.
fn next_wait(interval: Duration, outcome: &Result<usize>) -> Duration {
    match outcome {
        Ok(_) => interval,
        Err(_) => interval.saturating_mul(2),
    }
}
