//! Instrumentation wrappers for pub-sub processing nodes.
//!
//! [`TracedNode`] wraps a bus node so that every subscription records its
//! inputs and every publisher emits a companion
//! [`ProvenanceRecord`](lineage_types::ProvenanceRecord) on a sibling
//! `<topic>/info/pub` channel, from which offline tooling reconstructs
//! cross-node latency. Business callbacks are invoked unchanged; the
//! instrumentation is opt-in per call site and can be disabled wholesale at
//! node construction. [`TimingAdvertiseNode`] is the simplified variant that
//! only advertises callback start times.

pub mod config;
pub mod node;
pub mod publisher;
pub mod sink;
pub mod timing;

pub use config::NodeConfig;
pub use node::TracedNode;
pub use publisher::{TracedPublisher, INFO_TOPIC_SUFFIX};
pub use sink::{LogSink, NoopSink, TraceSink};
pub use timing::{TimingAdvertiseNode, TIMING_TOPIC_SUFFIX};
