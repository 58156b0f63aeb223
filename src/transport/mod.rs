pub mod process;

use crate::relay::model::ConnectionId;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(Value),
    /// The connection is gone. `error` is set when it did not end cleanly.
    Closed { error: Option<String> },
}

/// Something a connection reported. A connection's `Closed` is always its last event.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub connection: ConnectionId,
    pub event: InboundEvent,
}

impl Inbound {
    pub fn message(connection: ConnectionId, message: Value) -> Self {
        Self { connection, event: InboundEvent::Message(message) }
    }

    pub fn closed(connection: ConnectionId, error: Option<String>) -> Self {
        Self { connection, event: InboundEvent::Closed { error } }
    }
}

pub type InboundSender = mpsc::UnboundedSender<Inbound>;
pub type InboundReceiver = mpsc::UnboundedReceiver<Inbound>;

/// Establishes connections to the worker.
pub trait Transport: Send {
    fn name(&self) -> &'static str;

    /// Synchronous attempt. Everything the connection later receives, and its
    /// close, is delivered through `inbound` tagged with `id`.
    fn connect(&mut self, id: ConnectionId, inbound: InboundSender) -> anyhow::Result<Box<dyn Connection>>;
}

/// A live connection. Dropping it tears the connection down.
pub trait Connection: Send {
    fn id(&self) -> ConnectionId;

    /// Queues a message for the worker. Write failures surface as a close.
    fn post(&mut self, message: &Value);
}
