use serde::{Deserialize, Serialize};

/// Delivery-reliability policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reliability {
    #[default]
    Reliable,
    BestEffort,
}

/// Queueing and reliability knobs for one publisher or subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QosProfile {
    /// Queue depth. The in-process bus uses it as the per-subscription
    /// channel capacity in spawned dispatch.
    pub depth: usize,
    pub reliability: Reliability,
}

impl QosProfile {
    /// Reliable delivery with the given queue depth.
    pub fn depth(depth: usize) -> Self {
        Self {
            depth,
            reliability: Reliability::Reliable,
        }
    }

    pub fn best_effort(depth: usize) -> Self {
        Self {
            depth,
            reliability: Reliability::BestEffort,
        }
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self::depth(10)
    }
}
