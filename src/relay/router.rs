use crate::relay::cache::StatusCache;
use crate::relay::channel::WorkerChannel;
use crate::relay::model::{Command, StatusSnapshot};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

/// A request from the panel. `reply` is only used for status queries.
#[derive(Debug)]
pub struct PanelRequest {
    pub message: Value,
    pub reply: Option<oneshot::Sender<StatusSnapshot>>,
}

impl PanelRequest {
    pub fn new(message: Value) -> Self {
        Self { message, reply: None }
    }

    pub fn with_reply(message: Value) -> (Self, oneshot::Receiver<StatusSnapshot>) {
        let (tx, rx) = oneshot::channel();
        (Self { message, reply: Some(tx) }, rx)
    }
}

pub struct CommandRouter {
    channel: WorkerChannel,
    cache: StatusCache,
}

impl CommandRouter {
    pub fn new(channel: WorkerChannel, cache: StatusCache) -> Self {
        Self { channel, cache }
    }

    pub fn channel_mut(&mut self) -> &mut WorkerChannel {
        &mut self.channel
    }

    pub fn route(&mut self, request: PanelRequest) {
        let PanelRequest { message, reply } = request;

        match Command::classify(&message) {
            Command::GetStatus => {
                let snapshot = StatusSnapshot::clone(&self.cache.read());
                match reply {
                    Some(tx) => {
                        if tx.send(snapshot).is_err() {
                            debug!("panel went away before the status reply");
                        }
                    }
                    None => debug!("status query without a reply sink"),
                }
            }
            command => {
                debug!(?command, "forwarding panel command");
                self.channel.send(message);
            }
        }
    }
}
