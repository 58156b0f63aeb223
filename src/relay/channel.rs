use crate::relay::error::RelayError;
use crate::relay::model::{ConnectionId, WorkerMessage};
use crate::relay::observer::ChannelObserver;
use crate::transport::{Connection, Inbound, InboundEvent, InboundSender, Transport};
use serde_json::Value;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

/// The one connection to the worker, created on first use and again after
/// every disconnect.
pub struct WorkerChannel {
    transport: Box<dyn Transport>,
    inbound_tx: InboundSender,
    connection: Option<Box<dyn Connection>>,
    observers: Vec<Box<dyn ChannelObserver>>,
}

impl WorkerChannel {
    pub fn new(transport: Box<dyn Transport>, inbound_tx: InboundSender) -> Self {
        Self { transport, inbound_tx, connection: None, observers: vec![] }
    }

    pub fn subscribe(&mut self, observer: Box<dyn ChannelObserver>) {
        self.observers.push(observer);
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(|c| c.id())
    }

    /// Fire-and-forget. When no connection can be made the failure goes to the
    /// observers and the message is dropped.
    pub fn send(&mut self, message: Value) {
        let Some(conn) = self.connect_if_needed() else {
            return;
        };
        debug!(connection = %conn.id(), "forwarding message to worker");
        conn.post(&message);
    }

    fn connect_if_needed(&mut self) -> Option<&mut Box<dyn Connection>> {
        if !self.is_connected() {
            let id = Uuid::new_v4();
            info!(connection = %id, transport = self.transport.name(), "connecting to worker");
            match self.transport.connect(id, self.inbound_tx.clone()) {
                Ok(conn) => self.connection = Some(conn),
                Err(e) => {
                    self.fatal(RelayError::ConnectionEstablishment(format!("{:#}", e)));
                    return None;
                }
            }
        }
        self.connection.as_mut()
    }

    pub fn dispatch(&mut self, inbound: Inbound) {
        match inbound.event {
            InboundEvent::Message(message) => match WorkerMessage::decode(message) {
                WorkerMessage::Status { data } => {
                    debug!(connection = %inbound.connection, entries = data.len(), "status push");
                    for entry in data.entries() {
                        trace!(
                            title = ?entry.title(),
                            url = ?entry.url(),
                            state = ?entry.state(),
                            status_text = ?entry.status_text(),
                            "status entry"
                        );
                    }
                    for o in &self.observers {
                        o.on_status(&data);
                    }
                }
                WorkerMessage::Unknown => {
                    debug!(connection = %inbound.connection, "ignoring unrecognized worker message");
                }
            },
            InboundEvent::Closed { error } => {
                if self.connection_id() != Some(inbound.connection) {
                    debug!(connection = %inbound.connection, "close from a stale connection");
                    return;
                }
                self.connection = None;
                match error {
                    Some(detail) => self.fatal(RelayError::AbnormalDisconnect(detail)),
                    None => info!(connection = %inbound.connection, "worker disconnected"),
                }
            }
        }
    }

    fn fatal(&self, err: RelayError) {
        error!("{}", err);
        for o in &self.observers {
            o.on_fatal(&err);
        }
    }
}
