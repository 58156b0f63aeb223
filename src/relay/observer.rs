use crate::relay::error::RelayError;
use crate::relay::model::StatusSnapshot;

/// Subscriber for what the worker channel learns from its connection.
///
/// Called synchronously from the channel's own handlers, in registration order.
pub trait ChannelObserver: Send {
    /// A full status push arrived.
    fn on_status(&self, _snapshot: &StatusSnapshot) {}

    /// The connection could not be established or closed with an error.
    fn on_fatal(&self, _error: &RelayError) {}
}
