use crate::relay::cache::StatusCache;
use crate::relay::channel::WorkerChannel;
use crate::relay::observer::ChannelObserver;
use crate::relay::router::{CommandRouter, PanelRequest};
use crate::transport::{InboundReceiver, Transport};
use tokio::sync::mpsc;
use tracing::info;

/// Event loop over panel requests and worker events.
///
/// Handlers never await, so each event is fully handled before the next one
/// is picked up.
pub struct Relay {
    router: CommandRouter,
    inbound_rx: InboundReceiver,
    cache: StatusCache,
}

impl Relay {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let cache = StatusCache::new();
        let mut channel = WorkerChannel::new(transport, inbound_tx);
        channel.subscribe(Box::new(cache.clone()));

        Self { router: CommandRouter::new(channel, cache.clone()), inbound_rx, cache }
    }

    pub fn subscribe(&mut self, observer: Box<dyn ChannelObserver>) {
        self.router.channel_mut().subscribe(observer);
    }

    pub fn status(&self) -> &StatusCache {
        &self.cache
    }

    /// Runs until the panel side closes `requests`.
    pub async fn run(mut self, mut requests: mpsc::Receiver<PanelRequest>) {
        info!("relay ready");
        loop {
            tokio::select! {
                Some(inbound) = self.inbound_rx.recv() => {
                    self.router.channel_mut().dispatch(inbound);
                }
                request = requests.recv() => match request {
                    Some(request) => self.router.route(request),
                    None => break,
                },
            }
        }
        info!("panel closed; relay shutting down");
    }
}
