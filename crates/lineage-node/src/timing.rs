use tracing::warn;

use lineage_bus::{BusError, Envelope, QosProfile, RawPublisher, Transport};
use lineage_core::{Message, TimeSource};
use lineage_types::TopicInfo;

/// Fixed suffix deriving the timing-advertisement channel from a topic name.
pub const TIMING_TOPIC_SUFFIX: &str = "_info";

/// Simplified instrumentation: every subscription advertises its callback
/// start time.
///
/// For each subscribed topic a companion `<resolved>_info` publisher emits a
/// [`TopicInfo`] immediately before the user callback runs. No input state
/// is kept and no correlation is attempted; this is the single-shot subset
/// of [`TracedNode`](crate::TracedNode).
pub struct TimingAdvertiseNode<T: Transport> {
    transport: T,
    time: TimeSource,
}

impl<T: Transport> TimingAdvertiseNode<T> {
    pub fn new(transport: T) -> Self {
        Self::with_time(transport, TimeSource::system())
    }

    pub fn with_time(transport: T, time: TimeSource) -> Self {
        Self { transport, time }
    }

    pub fn fully_qualified_name(&self) -> &str {
        self.transport.fully_qualified_name()
    }

    /// Subscribe with a timing advertisement on every message.
    ///
    /// The companion publisher keeps a single-slot queue; only the latest
    /// advertisement matters to a late subscriber.
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
        let resolved = self.transport.resolve_topic(topic);
        let info_topic = format!("{resolved}{TIMING_TOPIC_SUFFIX}");
        let info = self
            .transport
            .advertise::<TopicInfo>(&info_topic, QosProfile::depth(1))?;

        let node = self.fully_qualified_name().to_owned();
        let time = self.time.clone();
        let mut callback = callback;
        self.transport.subscribe(topic, qos, move |message: Envelope<M>| {
            let advert = TopicInfo {
                node: node.clone(),
                topic: resolved.clone(),
                callback_start: time.now(),
            };
            if let Err(error) = info.publish(advert) {
                warn!(topic = %resolved, %error, "timing advertisement failed");
            }
            callback(message);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_bus::LocalBus;
    use lineage_core::ManualClock;
    use lineage_types::Stamp;
    use std::sync::{Arc, Mutex};

    struct Twist;

    impl Message for Twist {}

    #[test]
    fn advertises_callback_start_before_callback() {
        let bus = LocalBus::default();
        let clock = Arc::new(ManualClock::new(Stamp(500)));
        let node = TimingAdvertiseNode::with_time(
            bus.node("sensing", "driver"),
            TimeSource::with_clock(clock.clone()),
        );

        let order = Arc::new(Mutex::new(Vec::new()));

        let observer = bus.node("", "observer");
        let adverts = order.clone();
        observer
            .subscribe(
                "/sensing/points_info",
                QosProfile::default(),
                move |info: Envelope<TopicInfo>| {
                    adverts
                        .lock()
                        .unwrap()
                        .push(format!("info {} {}", info.topic, info.callback_start.as_nanos()));
                },
            )
            .unwrap();

        let callbacks = order.clone();
        node.subscribe("points", QosProfile::default(), move |_message: Envelope<Twist>| {
            callbacks.lock().unwrap().push("callback".to_owned());
        })
        .unwrap();

        let driver = bus.node("sensing", "raw");
        let publisher = driver.advertise::<Twist>("points", QosProfile::default()).unwrap();
        publisher.publish(Twist).unwrap();
        clock.set(Stamp(900));
        publisher.publish(Twist).unwrap();

        assert_eq!(
            *order.lock().unwrap(),
            vec![
                "info /sensing/points 500",
                "callback",
                "info /sensing/points 900",
                "callback",
            ]
        );
    }

    #[test]
    fn companion_registration_failure_propagates() {
        let bus = LocalBus::default();
        let node = TimingAdvertiseNode::new(bus.node("", "n"));

        // Occupy the info topic with a conflicting type.
        let other = bus.node("", "other");
        other
            .advertise::<Twist>("/t_info", QosProfile::default())
            .unwrap();

        let result = node.subscribe("/t", QosProfile::default(), |_message: Envelope<Twist>| {});
        assert!(matches!(result, Err(BusError::TypeMismatch { .. })));
    }
}
