use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use lineage_types::{
    CorrelationKind, InputStamps, OutputStamps, ProvenanceEntry, ProvenanceRecord, Stamp,
    SteadyStamp,
};

use crate::clock::TimeSource;
use crate::message::Message;

/// The most recently observed input on one subscribed topic.
///
/// Exactly one per (node, topic) pair; a newer inbound message overwrites
/// the previous state unconditionally. No history is retained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputState {
    /// Primary-clock receipt time.
    pub wall: Stamp,
    /// Steady-clock receipt time.
    pub steady: SteadyStamp,
    /// Header stamp extracted from the payload, if the type carries one.
    pub header: Option<Stamp>,
}

/// Per-node input-state table shared by every instrumented subscription
/// (writers) and every instrumented publisher (readers) of one node.
///
/// Keys are resolved topic names; a registered topic with no recorded input
/// yet holds an empty slot so that every provenance record carries exactly
/// one entry per subscribed topic. `BTreeMap` keeps the entry sequence
/// ordered and repeated snapshots structurally identical.
///
/// Implicit correlation assumes run-to-completion single-threaded dispatch
/// per node. Under concurrent dispatch the lock keeps the table itself
/// consistent, but a callback for topic B can still be attributed an input
/// on topic A that a concurrent callback overwrote mid-flight. Known
/// limitation, inherited from the recency heuristic itself.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    inputs: RwLock<BTreeMap<String, Option<InputState>>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, BTreeMap<String, Option<InputState>>> {
        match self.inputs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("input table lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Option<InputState>>> {
        match self.inputs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("input table lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Declare a subscribed topic. Idempotent; never clobbers recorded state.
    ///
    /// A registered topic with no input yet yields an `Unknown` entry in
    /// every provenance record built from this table.
    pub fn register_topic(&self, topic: &str) {
        let mut inputs = self.write_guard();
        if !inputs.contains_key(topic) {
            inputs.insert(topic.to_owned(), None);
        }
    }

    /// Record an inbound message: stamp both clocks, extract the header
    /// stamp if the payload type carries one, and overwrite the topic's
    /// input state. Last write wins; a payload without a header stamp is
    /// valid input and yields an implicit-only state.
    pub fn record_input<M: Message>(&self, topic: &str, message: &M, time: &TimeSource) {
        let (wall, steady) = time.stamp_pair();
        let state = InputState {
            wall,
            steady,
            header: message.header_stamp(),
        };

        let mut inputs = self.write_guard();
        inputs.insert(topic.to_owned(), Some(state));
        debug!(topic, %wall, %steady, has_header = state.header.is_some(), "recorded input");
    }

    /// Current input state for a topic, if one has been recorded.
    pub fn input_state(&self, topic: &str) -> Option<InputState> {
        self.read_guard().get(topic).copied().flatten()
    }

    /// Registered topic names, in entry order.
    pub fn topics(&self) -> Vec<String> {
        self.read_guard().keys().cloned().collect()
    }

    /// Build the provenance record for one outbound message from a snapshot
    /// of the current table.
    ///
    /// For each registered topic:
    /// - header stamps present on both sides and exactly equal → `Explicit`
    ///   (the forwarded-stamp idiom; nearest-match is deliberately not
    ///   attempted),
    /// - any recorded input otherwise → `Implicit`,
    /// - no input ever → `Unknown`.
    ///
    /// Pure read: no table mutation, never blocks beyond the lock, and two
    /// calls with no intervening `record_input` yield identical records.
    pub fn build_provenance(
        &self,
        node: &str,
        out_topic: &str,
        output: OutputStamps,
    ) -> ProvenanceRecord {
        let inputs = self.read_guard();
        let entries = inputs
            .iter()
            .map(|(topic, slot)| match slot {
                Some(state) => {
                    let explicit = match (output.header, state.header) {
                        (Some(out), Some(header)) => out == header,
                        _ => false,
                    };
                    ProvenanceEntry {
                        topic: topic.clone(),
                        stamps: Some(InputStamps {
                            wall: state.wall,
                            steady: state.steady,
                            header: state.header,
                        }),
                        kind: if explicit {
                            CorrelationKind::Explicit
                        } else {
                            CorrelationKind::Implicit
                        },
                    }
                }
                None => ProvenanceEntry {
                    topic: topic.clone(),
                    stamps: None,
                    kind: CorrelationKind::Unknown,
                },
            })
            .collect();

        ProvenanceRecord {
            node: node.to_owned(),
            output,
            topic: out_topic.to_owned(),
            entries,
        }
    }
}
