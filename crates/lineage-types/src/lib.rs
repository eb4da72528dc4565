//! Wire types for the lineage side channel.
//!
//! These are the messages and timestamps that travel next to application
//! traffic: the per-publish [`ProvenanceRecord`] and the simplified
//! [`TopicInfo`] timing advertisement. Everything here is plain data:
//! serializable, comparable, and free of any transport detail.

pub mod provenance;
pub mod stamp;
pub mod topic_info;

pub use provenance::{CorrelationKind, InputStamps, OutputStamps, ProvenanceEntry, ProvenanceRecord};
pub use stamp::{Stamp, SteadyStamp};
pub use topic_info::TopicInfo;
