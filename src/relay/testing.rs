//! In-memory transport and observers for unit tests.

use crate::relay::error::RelayError;
use crate::relay::model::ConnectionId;
use crate::relay::observer::ChannelObserver;
use crate::transport::{Connection, InboundSender, Transport};
use serde_json::Value;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MockState {
    connects: usize,
    fail_next: Option<String>,
    posted: Vec<(ConnectionId, Value)>,
    inbound: Vec<(ConnectionId, InboundSender)>,
}

/// Counts connection attempts and records every posted message.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn fail_next_connect(&self, reason: &str) {
        self.state.lock().unwrap().fail_next = Some(reason.to_string());
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn posted(&self) -> Vec<(ConnectionId, Value)> {
        self.state.lock().unwrap().posted.clone()
    }

    /// The inbound sender handed to the most recent successful connect.
    pub fn last_inbound(&self) -> Option<(ConnectionId, InboundSender)> {
        self.state.lock().unwrap().inbound.last().cloned()
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn connect(&mut self, id: ConnectionId, inbound: InboundSender) -> anyhow::Result<Box<dyn Connection>> {
        let mut state = self.state.lock().unwrap();
        state.connects += 1;
        if let Some(reason) = state.fail_next.take() {
            anyhow::bail!(reason);
        }
        state.inbound.push((id, inbound));
        Ok(Box::new(MockConnection { id, state: self.state.clone() }))
    }
}

struct MockConnection {
    id: ConnectionId,
    state: Arc<Mutex<MockState>>,
}

impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn post(&mut self, message: &Value) {
        self.state.lock().unwrap().posted.push((self.id, message.clone()));
    }
}

/// Collects fatal notifications as display strings.
#[derive(Clone, Default)]
pub struct FatalLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl FatalLog {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ChannelObserver for FatalLog {
    fn on_fatal(&self, error: &RelayError) {
        self.messages.lock().unwrap().push(error.to_string());
    }
}
