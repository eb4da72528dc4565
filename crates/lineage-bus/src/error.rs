use thiserror::Error;

/// Errors from bus registration operations.
///
/// Delivery itself does not error: a full subscriber queue drops the message
/// with a warning, per the bus's QoS policy, and a closed subscriber is
/// cleaned up silently.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid topic name: '{0}'")]
    InvalidTopic(String),

    #[error("topic '{topic}' already carries {registered}, not {requested}")]
    TypeMismatch {
        topic: String,
        registered: &'static str,
        requested: &'static str,
    },

    #[error("spawned dispatch requires an ambient tokio runtime")]
    NoRuntime,
}
