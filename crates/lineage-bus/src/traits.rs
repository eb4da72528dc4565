use lineage_core::Message;

use crate::envelope::Envelope;
use crate::error::BusError;
use crate::qos::QosProfile;

/// A plain publisher for one topic, created by [`Transport::advertise`].
pub trait RawPublisher<M: Message>: Send + Sync {
    fn publish(&self, message: M) -> Result<(), BusError>;

    /// Resolved name of the topic this publisher writes to.
    fn topic(&self) -> &str;
}

/// The capability set the instrumentation layer requires from a hosting bus.
///
/// Implementations decide the threading model: callbacks may be dispatched
/// run-to-completion on the publishing thread or concurrently from worker
/// tasks. The instrumentation layer works under either, with the documented
/// implicit-correlation caveat under concurrency.
pub trait Transport: Send + Sync {
    type Publisher<M: Message>: RawPublisher<M> + 'static;
    type Subscription: Send;

    /// Fully-qualified identity of this node within the bus namespace.
    fn fully_qualified_name(&self) -> &str;

    /// Resolve a possibly relative topic name within the node's namespace.
    fn resolve_topic(&self, topic: &str) -> String;

    fn advertise<M: Message>(
        &self,
        topic: &str,
        qos: QosProfile,
    ) -> Result<Self::Publisher<M>, BusError>;

    fn subscribe<M, F>(
        &self,
        topic: &str,
        qos: QosProfile,
        callback: F,
    ) -> Result<Self::Subscription, BusError>
    where
        M: Message,
        F: FnMut(Envelope<M>) + Send + 'static;
}
