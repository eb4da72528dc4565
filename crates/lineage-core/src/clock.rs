use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use lineage_types::{Stamp, SteadyStamp};

/// Primary clock of a node.
///
/// May be real time or simulation time; simulation time can pause, jump, or
/// rewind, so nothing downstream may assume these stamps are monotonic.
pub trait Clock: Send + Sync {
    fn now(&self) -> Stamp;
}

/// Wall-clock time from the operating system.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Stamp {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Stamp(since_epoch.as_nanos() as i64)
    }
}

/// Externally driven clock for simulation time and tests.
///
/// `set` may move time in either direction; that is the whole point of
/// keeping a separate steady clock in [`TimeSource`].
#[derive(Debug)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Stamp) -> Self {
        Self {
            nanos: AtomicI64::new(start.0),
        }
    }

    pub fn set(&self, stamp: Stamp) {
        self.nanos.store(stamp.0, Ordering::Release);
    }

    pub fn advance(&self, delta_nanos: i64) {
        self.nanos.fetch_add(delta_nanos, Ordering::AcqRel);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Stamp {
        Stamp(self.nanos.load(Ordering::Acquire))
    }
}

/// Dual clock access for one node: a primary clock (possibly simulation
/// time) and a steady clock that is monotonic regardless of what the
/// primary clock does.
///
/// Every measurement the engine records captures both: the primary stamp is
/// what correlation matching compares against application header stamps, the
/// steady stamp is the only value with a meaningful ordering guarantee for
/// latency computation.
#[derive(Clone)]
pub struct TimeSource {
    primary: Arc<dyn Clock>,
    steady_epoch: Instant,
}

impl TimeSource {
    /// Time source backed by the operating system clock.
    pub fn system() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Time source with an injected primary clock (simulation time, tests).
    pub fn with_clock(primary: Arc<dyn Clock>) -> Self {
        Self {
            primary,
            steady_epoch: Instant::now(),
        }
    }

    /// Current primary-clock time.
    pub fn now(&self) -> Stamp {
        self.primary.now()
    }

    /// Current steady-clock time, nanoseconds since this source was created.
    pub fn steady_now(&self) -> SteadyStamp {
        SteadyStamp(self.steady_epoch.elapsed().as_nanos() as u64)
    }

    /// Capture both clocks at one point in time.
    pub fn stamp_pair(&self) -> (Stamp, SteadyStamp) {
        (self.now(), self.steady_now())
    }
}

impl std::fmt::Debug for TimeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeSource")
            .field("now", &self.primary.now())
            .field("steady_now", &self.steady_now())
            .finish()
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::system()
    }
}
