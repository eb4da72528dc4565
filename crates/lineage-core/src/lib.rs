//! Provenance/correlation engine.
//!
//! Per-node bookkeeping of the most recently observed input per subscribed
//! topic, and the publish-time algorithm that turns a snapshot of that table
//! into a [`ProvenanceRecord`](lineage_types::ProvenanceRecord):
//! - exact header-stamp equality → `Explicit` attribution,
//! - any previously seen input → `Implicit` (recency heuristic),
//! - never-seen topic → `Unknown`.
//!
//! The engine is synchronous, non-blocking, and has no failure path: the
//! worst outcome is a degraded record, never an error surfaced to the
//! wrapped application logic.

pub mod clock;
pub mod message;
pub mod table;

pub use clock::{Clock, ManualClock, SystemClock, TimeSource};
pub use message::Message;
pub use table::{CorrelationTable, InputState};
