use lineage_types::{ProvenanceRecord, Stamp, TopicInfo};

/// Capability trait for messages crossing an instrumented node.
///
/// The engine treats payloads as opaque except for one optional capability:
/// exposing an embedded header stamp. Types that carry one override
/// [`header_stamp`](Message::header_stamp); everything else gets the `None`
/// default and produces implicit-only correlation. The check resolves
/// statically per message type, not per message.
pub trait Message: Send + Sync + 'static {
    /// The header stamp embedded in the payload, if this type carries one.
    fn header_stamp(&self) -> Option<Stamp> {
        None
    }
}

// Side-channel messages travel over the same bus as application payloads.
impl Message for ProvenanceRecord {}
impl Message for TopicInfo {}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn stamped_type_exposes_header() {
        let scan = Scan { stamp: Stamp(9) };
        assert_eq!(scan.header_stamp(), Some(Stamp(9)));
    }

    #[test]
    fn unstamped_type_defaults_to_none() {
        assert_eq!(Twist.header_stamp(), None);
    }
}
