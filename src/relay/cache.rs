use crate::relay::model::StatusSnapshot;
use crate::relay::observer::ChannelObserver;
use std::sync::{Arc, PoisonError, RwLock};

/// Latest status snapshot pushed by the worker.
///
/// Clones share the same slot. The lock only guards an `Arc` swap, so readers
/// never wait on anything but another swap.
#[derive(Clone, Default)]
pub struct StatusCache {
    current: Arc<RwLock<Arc<StatusSnapshot>>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, snapshot: StatusSnapshot) {
        let next = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn read(&self) -> Arc<StatusSnapshot> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ChannelObserver for StatusCache {
    fn on_status(&self, snapshot: &StatusSnapshot) {
        self.replace(snapshot.clone());
    }
}
