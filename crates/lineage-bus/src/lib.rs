//! Message-bus collaborator boundary.
//!
//! The instrumentation layer needs four capabilities from whatever bus hosts
//! it: create a subscription with a callback, create a publisher, resolve a
//! topic name, and report the node's fully-qualified identity. The
//! [`Transport`] trait captures exactly that set; [`LocalBus`] is an
//! in-process implementation with selectable dispatch (synchronous
//! run-to-completion or per-subscription task dispatch), so both of the
//! supported threading models are concretely exercisable.

pub mod envelope;
pub mod error;
pub mod local;
pub mod qos;
pub mod traits;

pub use envelope::Envelope;
pub use error::BusError;
pub use local::{DispatchMode, LocalBus, LocalPublisher, LocalSubscription, NodeHandle, SubscriptionId};
pub use qos::{QosProfile, Reliability};
pub use traits::{RawPublisher, Transport};
