use serde::{Deserialize, Serialize};

use crate::stamp::Stamp;

/// Single-shot timing advertisement: "my callback for this topic started now".
///
/// Emitted by the simplified instrumentation variant before each callback
/// invocation. Carries no correlation data; it is the strict subset of a
/// [`ProvenanceRecord`](crate::ProvenanceRecord) useful when only callback
/// start times are needed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInfo {
    /// Fully-qualified name of the subscribing node.
    pub node: String,
    /// Resolved name of the subscribed topic.
    pub topic: String,
    /// Primary-clock time at which the callback was entered.
    pub callback_start: Stamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_roundtrip() {
        let info = TopicInfo {
            node: "/sensing/driver".into(),
            topic: "/points/raw".into(),
            callback_start: Stamp(42),
        };
        let json = serde_json::to_string(&info).unwrap();
        let restored: TopicInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, restored);
    }
}
