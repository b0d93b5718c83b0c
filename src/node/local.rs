use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::node::publisher::Publisher;
use crate::node::subscriber::Subscriber;

/// Publishers and subscribers of one node, by topic name.
///
/// Shared by the node, its slave service and its data endpoint. Publishers
/// and subscribers only hold a weak reference back to it.
#[derive(Default)]
pub(crate) struct LocalTopics {
    publishers: Mutex<HashMap<String, Publisher>>,
    subscribers: Mutex<HashMap<String, Subscriber>>,
}

impl LocalTopics {
    pub(crate) fn publishers(&self) -> MutexGuard<'_, HashMap<String, Publisher>> {
        self.publishers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribers(&self) -> MutexGuard<'_, HashMap<String, Subscriber>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publisher(&self, topic: &str) -> Option<Publisher> {
        self.publishers().get(topic).cloned()
    }

    pub(crate) fn subscriber(&self, topic: &str) -> Option<Subscriber> {
        self.subscribers().get(topic).cloned()
    }

    pub(crate) fn drain(&self) -> (Vec<Publisher>, Vec<Subscriber>) {
        let publishers = self.publishers().drain().map(|(_, p)| p).collect();
        let subscribers = self.subscribers().drain().map(|(_, s)| s).collect();
        (publishers, subscribers)
    }
}
