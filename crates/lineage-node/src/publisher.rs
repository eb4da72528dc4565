use std::sync::Arc;

use tracing::warn;

use lineage_bus::{BusError, RawPublisher, Transport};
use lineage_core::{CorrelationTable, Message, TimeSource};
use lineage_types::{OutputStamps, ProvenanceRecord};

/// Fixed suffix deriving the provenance side channel from a topic name.
pub const INFO_TOPIC_SUFFIX: &str = "/info/pub";

/// Publisher wrapper emitting a [`ProvenanceRecord`] alongside every
/// application message.
///
/// The record is published on the sibling `<topic>/info/pub` channel
/// *before* the application payload, so a consumer subscribed to both never
/// observes an application message whose companion record is not already
/// available. When instrumentation is disabled this is a plain pass-through
/// publisher with no companion channel.
pub struct TracedPublisher<M: Message, T: Transport> {
    app: T::Publisher<M>,
    info: Option<T::Publisher<ProvenanceRecord>>,
    table: Arc<CorrelationTable>,
    time: TimeSource,
    node: String,
    topic: String,
}

impl<M: Message, T: Transport> TracedPublisher<M, T> {
    pub(crate) fn new(
        app: T::Publisher<M>,
        info: Option<T::Publisher<ProvenanceRecord>>,
        table: Arc<CorrelationTable>,
        time: TimeSource,
        node: String,
        topic: String,
    ) -> Self {
        Self {
            app,
            info,
            table,
            time,
            node,
            topic,
        }
    }

    /// Resolved name of the application topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Resolved name of the companion provenance topic, if instrumented.
    pub fn info_topic(&self) -> Option<&str> {
        self.info.as_ref().map(|publisher| publisher.topic())
    }

    /// Publish `message`, preceded by its provenance record.
    ///
    /// A failure to publish the record degrades to a warning; the
    /// application message is delivered regardless. Only the application
    /// publish result is surfaced.
    pub fn publish(&self, message: M) -> Result<(), BusError> {
        if let Some(info) = &self.info {
            let (wall, steady) = self.time.stamp_pair();
            let output = OutputStamps {
                wall,
                steady,
                header: message.header_stamp(),
            };
            let record = self.table.build_provenance(&self.node, &self.topic, output);
            if let Err(error) = info.publish(record) {
                warn!(topic = %self.topic, %error, "provenance publish failed, delivering application message anyway");
            }
        }
        self.app.publish(message)
    }
}
