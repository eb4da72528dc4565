use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, RwLock, Weak};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use lineage_core::Message;

use crate::envelope::Envelope;
use crate::error::BusError;
use crate::qos::QosProfile;
use crate::traits::{RawPublisher, Transport};

/// How the bus invokes subscription callbacks.
///
/// This is the explicit configuration choice behind the correlation
/// engine's threading assumption: under `Inline` dispatch each callback
/// runs to completion before the next begins, and implicit correlation is
/// trustworthy; under `Spawned` dispatch callbacks for different
/// subscriptions run concurrently, and implicit correlation can
/// misattribute inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Callbacks run synchronously on the publishing thread.
    #[default]
    Inline,
    /// Each subscription gets a dedicated task draining a bounded queue.
    Spawned,
}

/// Subscription identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub uuid::Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

enum Delivery {
    Delivered,
    QueueFull,
    Closed,
}

type Payload = Arc<dyn Any + Send + Sync>;
type DeliverFn = Box<dyn Fn(Payload) -> Delivery + Send + Sync>;

struct SubscriberSlot {
    id: SubscriptionId,
    deliver: DeliverFn,
}

struct TopicEntry {
    type_id: TypeId,
    type_name: &'static str,
    subscribers: Vec<Arc<SubscriberSlot>>,
}

struct BusInner {
    dispatch: DispatchMode,
    topics: RwLock<HashMap<String, TopicEntry>>,
}

impl BusInner {
    fn read_topics(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, TopicEntry>> {
        match self.topics.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("topic registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_topics(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, TopicEntry>> {
        match self.topics.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("topic registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Fix the payload type of a topic on first registration; reject
    /// conflicting registrations afterwards.
    fn check_type<M: Message>(&self, topic: &str) -> Result<(), BusError> {
        let mut topics = self.write_topics();
        match topics.get(topic) {
            Some(entry) => {
                if entry.type_id != TypeId::of::<M>() {
                    return Err(BusError::TypeMismatch {
                        topic: topic.to_owned(),
                        registered: entry.type_name,
                        requested: std::any::type_name::<M>(),
                    });
                }
            }
            None => {
                topics.insert(
                    topic.to_owned(),
                    TopicEntry {
                        type_id: TypeId::of::<M>(),
                        type_name: std::any::type_name::<M>(),
                        subscribers: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    fn add_subscriber(&self, topic: &str, slot: SubscriberSlot) {
        let mut topics = self.write_topics();
        if let Some(entry) = topics.get_mut(topic) {
            entry.subscribers.push(Arc::new(slot));
        }
    }

    fn remove_subscriber(&self, topic: &str, id: &SubscriptionId) {
        let mut topics = self.write_topics();
        if let Some(entry) = topics.get_mut(topic) {
            entry.subscribers.retain(|slot| slot.id != *id);
        }
    }

    /// Fan a payload out to every subscriber of a topic.
    ///
    /// The subscriber snapshot is taken under the lock but delivery happens
    /// outside it, so a callback may itself publish without re-entering the
    /// registry lock.
    fn publish_erased(&self, topic: &str, payload: Payload) -> usize {
        let slots: Vec<Arc<SubscriberSlot>> = {
            let topics = self.read_topics();
            match topics.get(topic) {
                Some(entry) => entry.subscribers.clone(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for slot in &slots {
            match (slot.deliver)(payload.clone()) {
                Delivery::Delivered => delivered += 1,
                Delivery::QueueFull => {
                    warn!(topic, "subscriber queue full, dropping message");
                }
                Delivery::Closed => closed.push(slot.id.clone()),
            }
        }

        if !closed.is_empty() {
            let mut topics = self.write_topics();
            if let Some(entry) = topics.get_mut(topic) {
                entry.subscribers.retain(|slot| !closed.contains(&slot.id));
            }
            debug!(topic, removed = closed.len(), "cleaned up closed subscriptions");
        }

        delivered
    }
}

/// In-process reference bus.
///
/// Topics are typed at first registration; publishers and subscribers
/// rendezvous by resolved topic name. Callback dispatch follows the bus-wide
/// [`DispatchMode`].
#[derive(Clone)]
pub struct LocalBus {
    inner: Arc<BusInner>,
}

impl LocalBus {
    pub fn new(dispatch: DispatchMode) -> Self {
        Self {
            inner: Arc::new(BusInner {
                dispatch,
                topics: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Create a handle representing one named node on this bus.
    ///
    /// `namespace` may be empty; both parts are given with no leading slash.
    pub fn node(&self, namespace: &str, name: &str) -> NodeHandle {
        let namespace = if namespace.is_empty() {
            String::new()
        } else {
            format!("/{namespace}")
        };
        let fqn = format!("{namespace}/{name}");
        NodeHandle {
            inner: self.inner.clone(),
            namespace,
            fqn,
        }
    }

    /// All registered topic names, unordered.
    pub fn topic_names(&self) -> Vec<String> {
        self.inner.read_topics().keys().cloned().collect()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .read_topics()
            .get(topic)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(DispatchMode::Inline)
    }
}

/// One node's view of a [`LocalBus`]: identity, namespace, registration.
pub struct NodeHandle {
    inner: Arc<BusInner>,
    namespace: String,
    fqn: String,
}

impl NodeHandle {
    fn validate(topic: &str) -> Result<(), BusError> {
        if topic.is_empty() || topic == "/" {
            return Err(BusError::InvalidTopic(topic.to_owned()));
        }
        Ok(())
    }
}

impl Transport for NodeHandle {
    type Publisher<M: Message> = LocalPublisher<M>;
    type Subscription = LocalSubscription;

    fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    fn resolve_topic(&self, topic: &str) -> String {
        if topic.starts_with('/') {
            topic.to_owned()
        } else {
            format!("{}/{}", self.namespace, topic)
        }
    }

    fn advertise<M: Message>(
        &self,
        topic: &str,
        _qos: QosProfile,
    ) -> Result<Self::Publisher<M>, BusError> {
        Self::validate(topic)?;
        let resolved = self.resolve_topic(topic);
        self.inner.check_type::<M>(&resolved)?;
        debug!(node = %self.fqn, topic = %resolved, "publisher registered");
        Ok(LocalPublisher {
            inner: self.inner.clone(),
            topic: resolved,
            _marker: PhantomData,
        })
    }

    fn subscribe<M, F>(
        &self,
        topic: &str,
        qos: QosProfile,
        callback: F,
    ) -> Result<Self::Subscription, BusError>
    where
        M: Message,
        F: FnMut(Envelope<M>) + Send + 'static,
    {
        Self::validate(topic)?;
        let resolved = self.resolve_topic(topic);
        self.inner.check_type::<M>(&resolved)?;

        let id = SubscriptionId::new();
        let deliver: DeliverFn = match self.inner.dispatch {
            DispatchMode::Inline => {
                let callback = Mutex::new(callback);
                Box::new(move |payload: Payload| {
                    let Ok(message) = payload.downcast::<M>() else {
                        warn!("payload type did not match subscription, skipping");
                        return Delivery::Delivered;
                    };
                    let mut callback = match callback.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => {
                            warn!("subscription callback lock was poisoned, recovering");
                            poisoned.into_inner()
                        }
                    };
                    (callback)(Envelope::Shared(message));
                    Delivery::Delivered
                })
            }
            DispatchMode::Spawned => {
                let runtime = tokio::runtime::Handle::try_current()
                    .map_err(|_| BusError::NoRuntime)?;
                let (tx, mut rx) = mpsc::channel::<Payload>(qos.depth.max(1));
                let mut callback = callback;
                runtime.spawn(async move {
                    while let Some(payload) = rx.recv().await {
                        match payload.downcast::<M>() {
                            Ok(message) => callback(Envelope::Shared(message)),
                            Err(_) => {
                                warn!("payload type did not match subscription, skipping");
                            }
                        }
                    }
                });
                Box::new(move |payload: Payload| match tx.try_send(payload) {
                    Ok(()) => Delivery::Delivered,
                    Err(mpsc::error::TrySendError::Full(_)) => Delivery::QueueFull,
                    Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
                })
            }
        };

        self.inner.add_subscriber(&resolved, SubscriberSlot { id: id.clone(), deliver });
        debug!(node = %self.fqn, topic = %resolved, mode = ?self.inner.dispatch, "subscription registered");

        Ok(LocalSubscription {
            inner: Arc::downgrade(&self.inner),
            topic: resolved,
            id,
        })
    }
}

/// Publisher handle for one topic on a [`LocalBus`].
pub struct LocalPublisher<M> {
    inner: Arc<BusInner>,
    topic: String,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Message> RawPublisher<M> for LocalPublisher<M> {
    fn publish(&self, message: M) -> Result<(), BusError> {
        let payload: Payload = Arc::new(message);
        self.inner.publish_erased(&self.topic, payload);
        Ok(())
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}

/// Live subscription handle; dropping it leaves the subscription active,
/// call [`unsubscribe`](LocalSubscription::unsubscribe) to remove it.
#[derive(Debug)]
pub struct LocalSubscription {
    inner: Weak<BusInner>,
    topic: String,
    id: SubscriptionId,
}

impl LocalSubscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.remove_subscriber(&self.topic, &self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_types::Stamp;

    struct Scan {
        stamp: Stamp,
    }

    impl Message for Scan {
        fn header_stamp(&self) -> Option<Stamp> {
            Some(self.stamp)
        }
    }

    struct Twist;

    impl Message for Twist {}

    #[test]
    fn inline_publish_invokes_callback() {
        let bus = LocalBus::default();
        let node = bus.node("sensing", "driver");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        node.subscribe("points", QosProfile::default(), move |message: Envelope<Scan>| {
            sink.lock().unwrap().push(message.stamp);
        })
        .unwrap();

        let publisher = node.advertise::<Scan>("points", QosProfile::default()).unwrap();
        publisher.publish(Scan { stamp: Stamp(7) }).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Stamp(7)]);
    }

    #[test]
    fn fan_out_to_every_subscriber() {
        let bus = LocalBus::default();
        let node = bus.node("", "solo");

        let count = Arc::new(Mutex::new(0usize));
        for _ in 0..3 {
            let count = count.clone();
            node.subscribe("/t", QosProfile::default(), move |_message: Envelope<Twist>| {
                *count.lock().unwrap() += 1;
            })
            .unwrap();
        }

        let publisher = node.advertise::<Twist>("/t", QosProfile::default()).unwrap();
        publisher.publish(Twist).unwrap();
        assert_eq!(*count.lock().unwrap(), 3);
    }

    #[test]
    fn topic_names_resolve_within_namespace() {
        let bus = LocalBus::default();
        let node = bus.node("sensing", "driver");

        assert_eq!(node.fully_qualified_name(), "/sensing/driver");
        assert_eq!(node.resolve_topic("points"), "/sensing/points");
        assert_eq!(node.resolve_topic("/map/grid"), "/map/grid");
    }

    #[test]
    fn type_conflict_is_rejected_at_registration() {
        let bus = LocalBus::default();
        let node = bus.node("", "n");

        node.advertise::<Scan>("/t", QosProfile::default()).unwrap();
        let err = node
            .subscribe("/t", QosProfile::default(), |_message: Envelope<Twist>| {})
            .unwrap_err();
        assert!(matches!(err, BusError::TypeMismatch { .. }));
    }

    #[test]
    fn empty_topic_is_rejected() {
        let bus = LocalBus::default();
        let node = bus.node("", "n");
        assert!(matches!(
            node.advertise::<Twist>("", QosProfile::default()),
            Err(BusError::InvalidTopic(_))
        ));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = LocalBus::default();
        let node = bus.node("", "n");

        let count = Arc::new(Mutex::new(0usize));
        let sink = count.clone();
        let subscription = node
            .subscribe("/t", QosProfile::default(), move |_message: Envelope<Twist>| {
                *sink.lock().unwrap() += 1;
            })
            .unwrap();

        let publisher = node.advertise::<Twist>("/t", QosProfile::default()).unwrap();
        publisher.publish(Twist).unwrap();
        subscription.unsubscribe();
        publisher.publish(Twist).unwrap();

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count("/t"), 0);
    }

    #[test]
    fn callback_may_publish_reentrantly() {
        let bus = LocalBus::default();
        let node = bus.node("", "relay");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        node.subscribe("/out", QosProfile::default(), move |message: Envelope<Scan>| {
            sink.lock().unwrap().push(message.stamp);
        })
        .unwrap();

        let out = node.advertise::<Scan>("/out", QosProfile::default()).unwrap();
        node.subscribe("/in", QosProfile::default(), move |message: Envelope<Scan>| {
            out.publish(Scan { stamp: message.stamp }).unwrap();
        })
        .unwrap();

        let input = node.advertise::<Scan>("/in", QosProfile::default()).unwrap();
        input.publish(Scan { stamp: Stamp(3) }).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Stamp(3)]);
    }

    #[test]
    fn spawned_dispatch_without_runtime_is_rejected() {
        let bus = LocalBus::new(DispatchMode::Spawned);
        let node = bus.node("", "n");

        let result = node.subscribe("/t", QosProfile::default(), |_message: Envelope<Twist>| {});
        assert!(matches!(result, Err(BusError::NoRuntime)));
    }

    #[tokio::test]
    async fn spawned_dispatch_delivers() {
        let bus = LocalBus::new(DispatchMode::Spawned);
        let node = bus.node("", "n");

        let (tx, mut rx) = mpsc::unbounded_channel();
        node.subscribe("/t", QosProfile::depth(8), move |message: Envelope<Scan>| {
            let _ = tx.send(message.stamp);
        })
        .unwrap();

        let publisher = node.advertise::<Scan>("/t", QosProfile::default()).unwrap();
        publisher.publish(Scan { stamp: Stamp(11) }).unwrap();

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("delivery timed out");
        assert_eq!(received, Some(Stamp(11)));
    }

    #[tokio::test]
    async fn spawned_subscriptions_dispatch_concurrently() {
        let bus = LocalBus::new(DispatchMode::Spawned);
        let node = bus.node("", "n");

        let (tx, mut rx) = mpsc::unbounded_channel();
        for topic in ["/a", "/b"] {
            let tx = tx.clone();
            node.subscribe(topic, QosProfile::depth(8), move |_message: Envelope<Twist>| {
                let _ = tx.send(());
            })
            .unwrap();
        }
        drop(tx);

        let a = node.advertise::<Twist>("/a", QosProfile::default()).unwrap();
        let b = node.advertise::<Twist>("/b", QosProfile::default()).unwrap();
        a.publish(Twist).unwrap();
        b.publish(Twist).unwrap();

        for _ in 0..2 {
            tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
                .await
                .expect("delivery timed out")
                .expect("channel closed early");
        }
    }
}
