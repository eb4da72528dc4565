use serde::{Deserialize, Serialize};

use crate::stamp::{Stamp, SteadyStamp};

/// Confidence of the causal attribution for one input topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationKind {
    /// The output's header stamp equals the input's header stamp exactly.
    /// The only case where attribution is certain.
    Explicit,
    /// Attributed by recency: the most recently received message on this
    /// topic is assumed to be the one in scope. Valid only under
    /// run-to-completion single-threaded dispatch.
    Implicit,
    /// No message has ever been observed on this topic.
    Unknown,
}

/// Receipt stamps of the most recent input observed on a topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputStamps {
    /// Primary-clock receipt time.
    pub wall: Stamp,
    /// Steady-clock receipt time.
    pub steady: SteadyStamp,
    /// Header stamp embedded in the payload, if the message type carries one.
    pub header: Option<Stamp>,
}

/// Stamps captured at publish time for the output message itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStamps {
    pub wall: Stamp,
    pub steady: SteadyStamp,
    /// Header stamp of the outbound payload, if present.
    pub header: Option<Stamp>,
}

/// One entry per topic the producing node subscribes to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    /// Resolved topic name.
    pub topic: String,
    /// Absent exactly when `kind` is [`CorrelationKind::Unknown`].
    pub stamps: Option<InputStamps>,
    pub kind: CorrelationKind,
}

/// The side-channel message emitted once per outbound application message.
///
/// Immutable once constructed. Downstream tooling joins successive records
/// on (topic, header stamp) to reconstruct cross-node causal chains offline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Fully-qualified name of the producing node.
    pub node: String,
    /// Output topic and publish-time stamps.
    pub output: OutputStamps,
    /// Resolved output topic name.
    pub topic: String,
    /// One entry per subscribed topic, ordered by topic name.
    pub entries: Vec<ProvenanceEntry>,
}

impl ProvenanceRecord {
    /// Look up the entry for a topic by resolved name.
    pub fn entry(&self, topic: &str) -> Option<&ProvenanceEntry> {
        self.entries.iter().find(|e| e.topic == topic)
    }
}
