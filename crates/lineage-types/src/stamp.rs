use serde::{Deserialize, Serialize};

/// Primary-clock timestamp in nanoseconds.
///
/// The primary clock may be simulation time: it can pause, jump, or rewind,
/// so two `Stamp`s are only safe to subtract for latency when the producing
/// clock is known to be steady. Correlation matching compares `Stamp`s for
/// exact equality, which stays meaningful under any clock behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Stamp(pub i64);

impl Stamp {
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Saturates at the `i64` nanosecond range (roughly year 2262).
    pub fn from_secs_nanos(secs: i64, nanos: u32) -> Self {
        Self(
            secs.saturating_mul(1_000_000_000)
                .saturating_add(nanos as i64),
        )
    }
}

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.0.div_euclid(1_000_000_000);
        let nanos = self.0.rem_euclid(1_000_000_000);
        write!(f, "{}.{:09}", secs, nanos)
    }
}

/// Steady-clock timestamp in nanoseconds since an arbitrary per-process epoch.
///
/// Monotonic and strictly ordered regardless of simulation-time manipulation.
/// Only comparable within one process lifetime; it exists so latency along a
/// node's own callback path is measurable even when the primary clock is not
/// trustworthy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SteadyStamp(pub u64);

impl SteadyStamp {
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Nanoseconds elapsed from `earlier` to `self`, saturating at zero.
    pub fn elapsed_since(&self, earlier: SteadyStamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::fmt::Display for SteadyStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
