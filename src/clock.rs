use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A millisecond time source. All animation timing flows through this so the
/// engine can be driven by real time on hardware and by a scripted clock in
/// tests. Values wrap at `u32::MAX`; consumers take deltas with
/// `wrapping_sub`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Wall-clock time since construction.
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }
}

/// A manually advanced clock. Clones share the same underlying time, so a
/// test can keep one handle while the controller owns another.
#[derive(Clone, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.ms.fetch_add(ms, Ordering::Relaxed);
    }

    pub fn set(&self, ms: u32) {
        self.ms.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.ms.load(Ordering::Relaxed)
    }
}
