use lineage_types::SteadyStamp;
use tracing::trace;

/// Fire-and-forget trace-point sink.
///
/// The node emits point events at registration time and on every inbound
/// message for external low-overhead trace capture. Delivery is not
/// guaranteed and nothing in the node's lifecycle depends on the sink being
/// present.
pub trait TraceSink: Send + Sync {
    fn subscription_init(&self, node: &str, topic: &str);
    fn publisher_init(&self, node: &str, topic: &str);
    fn message_taken(&self, node: &str, topic: &str, steady: SteadyStamp);
}

/// Discards every event. The default sink.
#[derive(Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn subscription_init(&self, _node: &str, _topic: &str) {}
    fn publisher_init(&self, _node: &str, _topic: &str) {}
    fn message_taken(&self, _node: &str, _topic: &str, _steady: SteadyStamp) {}
}

/// Forwards events to the `tracing` subscriber at trace level.
#[derive(Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn subscription_init(&self, node: &str, topic: &str) {
        trace!(node, topic, "subscription init");
    }

    fn publisher_init(&self, node: &str, topic: &str) {
        trace!(node, topic, "publisher init");
    }

    fn message_taken(&self, node: &str, topic: &str, steady: SteadyStamp) {
        trace!(node, topic, %steady, "message taken");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<String>>,
    }

    impl TraceSink for Recording {
        fn subscription_init(&self, _node: &str, topic: &str) {
            self.events.lock().unwrap().push(format!("sub {topic}"));
        }

        fn publisher_init(&self, _node: &str, topic: &str) {
            self.events.lock().unwrap().push(format!("pub {topic}"));
        }

        fn message_taken(&self, _node: &str, topic: &str, _steady: SteadyStamp) {
            self.events.lock().unwrap().push(format!("take {topic}"));
        }
    }

    #[test]
    fn recording_sink_sees_point_events() {
        let sink = Recording::default();
        sink.subscription_init("/n", "/a");
        sink.message_taken("/n", "/a", SteadyStamp(5));
        sink.publisher_init("/n", "/b");
        assert_eq!(
            *sink.events.lock().unwrap(),
            vec!["sub /a", "take /a", "pub /b"]
        );
    }
}
