use std::sync::Arc;

use tracing::info;

use lineage_bus::{BusError, Envelope, QosProfile, RawPublisher, Transport};
use lineage_core::{CorrelationTable, Message, TimeSource};
use lineage_types::ProvenanceRecord;

use crate::config::NodeConfig;
use crate::publisher::{TracedPublisher, INFO_TOPIC_SUFFIX};
use crate::sink::{NoopSink, TraceSink};

/// Node wrapper: one input-state table shared by every instrumented
/// subscription (writers) and publisher (readers) created through it.
///
/// Wrapped creation calls keep the signatures of the underlying transport,
/// so instrumentation is opt-in per call site with no change to message
/// types or callback shapes. The enabled flag is fixed at construction;
/// when off, subscribe and advertise delegate straight to the transport
/// with zero added work per message.
pub struct TracedNode<T: Transport> {
    transport: T,
    table: Arc<CorrelationTable>,
    time: TimeSource,
    sink: Arc<dyn TraceSink>,
    config: NodeConfig,
}

impl<T: Transport> TracedNode<T> {
    pub fn new(transport: T, config: NodeConfig) -> Self {
        Self::with_parts(transport, config, TimeSource::system(), Arc::new(NoopSink))
    }

    /// Construct with an injected time source and trace sink.
    pub fn with_parts(
        transport: T,
        config: NodeConfig,
        time: TimeSource,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        info!(
            node = transport.fully_qualified_name(),
            enabled = config.enabled,
            "instrumented node created"
        );
        Self {
            transport,
            table: Arc::new(CorrelationTable::new()),
            time,
            sink,
            config,
        }
    }

    pub fn fully_qualified_name(&self) -> &str {
        self.transport.fully_qualified_name()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The node's input-state table.
    pub fn table(&self) -> &Arc<CorrelationTable> {
        &self.table
    }

    pub fn time(&self) -> &TimeSource {
        &self.time
    }

    /// Create an instrumented subscription.
    ///
    /// Before the caller's callback runs, the inbound message is stamped on
    /// both clocks and recorded as the topic's current input state; the
    /// callback then receives the message exactly as the transport delivered
    /// it. Registering the topic up front guarantees an `Unknown` entry in
    /// provenance records until the first message arrives.
    pub fn subscribe<M, F>(
        &self,
        topic: &str,
        qos: QosProfile,
        callback: F,
    ) -> Result<T::Subscription, BusError>
    where
        M: Message,
        F: FnMut(Envelope<M>) + Send + 'static,
    {
        if !self.config.enabled {
            return self.transport.subscribe(topic, qos, callback);
        }

        let resolved = self.transport.resolve_topic(topic);
        let table = Arc::clone(&self.table);
        let time = self.time.clone();
        let sink = Arc::clone(&self.sink);
        let node = self.fully_qualified_name().to_owned();
        let topic_key = resolved.clone();
        let mut callback = callback;
        let subscription = self.transport.subscribe(topic, qos, move |message: Envelope<M>| {
            sink.message_taken(&node, &topic_key, time.steady_now());
            table.record_input(&topic_key, &*message, &time);
            callback(message);
        })?;

        // Only a live subscription earns a table slot; a rejected one must
        // not leave a phantom Unknown entry in every future record.
        self.table.register_topic(&resolved);
        self.sink
            .subscription_init(self.fully_qualified_name(), &resolved);
        Ok(subscription)
    }

    /// Create an instrumented publisher.
    ///
    /// Also registers the companion provenance publisher on
    /// `<resolved>/info/pub` with the configured (default single-slot) queue
    /// depth. A registration failure for either publisher propagates
    /// unchanged; the wrapper adds no failure mode of its own.
    pub fn advertise<M: Message>(
        &self,
        topic: &str,
        qos: QosProfile,
    ) -> Result<TracedPublisher<M, T>, BusError> {
        let app = self.transport.advertise::<M>(topic, qos)?;
        let resolved = app.topic().to_owned();

        let info = if self.config.enabled {
            let info_topic = format!("{resolved}{INFO_TOPIC_SUFFIX}");
            let info = self
                .transport
                .advertise::<ProvenanceRecord>(&info_topic, QosProfile::depth(self.config.info_qos_depth))?;
            self.sink.publisher_init(self.fully_qualified_name(), &resolved);
            Some(info)
        } else {
            None
        };

        Ok(TracedPublisher::new(
            app,
            info,
            Arc::clone(&self.table),
            self.time.clone(),
            self.fully_qualified_name().to_owned(),
            resolved,
        ))
    }
}
