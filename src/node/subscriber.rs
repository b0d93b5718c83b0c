//! Subscribers
//!
//! A [`Subscriber`] registers with the master in the background and then
//! keeps one data stream per publisher of its topic. The publisher list it
//! gets back from the registration only adds connections; the updates the
//! master pushes afterwards are the full list and may also remove them,
//! depending on the [`DisconnectPolicy`].
//!
//! Under [`DisconnectPolicy::Disconnect`] the newest pushed list wins: pushes
//! older than one already applied are ignored, and a connection that
//! completes after a newer list dropped its publisher is closed again.
//!
//! Every message arriving on any stream is handed to every listener.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use futures::future::join_all;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DisconnectPolicy;
use crate::identity::{NodeIdentifier, PublisherIdentifier, SubscriberRecord, TopicDefinition};
use crate::master::MasterClient;
use crate::node::local::LocalTopics;
use crate::node::negotiator::{ConnectionNegotiator, DataConnection};
use crate::transport::{DataFrame, Message};
use crate::utils::{ConnectionError, CountDownLatch};

/// Receives every message of a subscription.
pub trait MessageListener: Send + Sync + 'static {
    fn on_message(&self, message: &Message);
}

impl<F> MessageListener for F
where
    F: Fn(&Message) + Send + Sync + 'static,
{
    fn on_message(&self, message: &Message) {
        self(message)
    }
}

#[derive(Clone)]
pub struct Subscriber {
    inner: Arc<SubscriberInner>,
}

struct SubscriberInner {
    node: NodeIdentifier,
    topic: TopicDefinition,
    master: MasterClient,
    negotiator: ConnectionNegotiator,
    policy: DisconnectPolicy,
    state: Mutex<LinkState>,
    listeners: RwLock<Vec<Arc<dyn MessageListener>>>,
    registered: CountDownLatch,
    topics: Weak<LocalTopics>,
}

/// Connection bookkeeping, kept under one lock.
struct LinkState {
    record: SubscriberRecord,
    /// Publishers a connection attempt is in flight for.
    pending: HashSet<PublisherIdentifier>,
    readers: HashMap<PublisherIdentifier, JoinHandle<()>>,
    /// Newest full publisher list applied, once one has been.
    listed: Option<HashSet<PublisherIdentifier>>,
    /// Revision of the newest pushed list applied.
    revision: Option<u64>,
    closed: bool,
}

impl Subscriber {
    pub(crate) fn new(
        node: NodeIdentifier,
        topic: TopicDefinition,
        master: MasterClient,
        negotiator: ConnectionNegotiator,
        policy: DisconnectPolicy,
        topics: Weak<LocalTopics>,
    ) -> Self {
        let record = SubscriberRecord::new(node.clone(), topic.clone());
        Self {
            inner: Arc::new(SubscriberInner {
                node,
                topic,
                master,
                negotiator,
                policy,
                state: Mutex::new(LinkState {
                    record,
                    pending: HashSet::new(),
                    readers: HashMap::new(),
                    listed: None,
                    revision: None,
                    closed: false,
                }),
                listeners: RwLock::new(Vec::new()),
                registered: CountDownLatch::new(1),
                topics,
            }),
        }
    }

    /// Register with the master in the background and connect to the
    /// publishers it reports.
    pub(crate) fn start_registration(&self) {
        let subscriber = self.clone();
        tokio::spawn(async move {
            let inner = &subscriber.inner;
            match inner.master.register_subscriber(&inner.node, &inner.topic).await {
                Ok(publishers) => {
                    info!("{} registered as subscriber of {}", inner.node.name(), inner.topic);
                    inner.registered.count_down();
                    subscriber.connect_all(publishers).await;
                }
                Err(e) => warn!(
                    "{} failed to register as subscriber of {}: {}",
                    inner.node.name(),
                    inner.topic.name(),
                    e
                ),
            }
        });
    }

    pub fn topic(&self) -> &TopicDefinition {
        &self.inner.topic
    }

    pub fn node(&self) -> &NodeIdentifier {
        &self.inner.node
    }

    /// Wait until the master acknowledged the registration. Returns `false`
    /// if that did not happen within `timeout`.
    pub async fn await_registration(&self, timeout: Duration) -> bool {
        self.inner.registered.await_timeout(timeout).await
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registered.count() == 0
    }

    pub fn add_message_listener(&self, listener: impl MessageListener) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Publishers with a live data stream, sorted.
    pub fn connected_publishers(&self) -> Vec<PublisherIdentifier> {
        let mut publishers: Vec<_> = self
            .inner
            .state()
            .record
            .connected_publishers()
            .cloned()
            .collect();
        publishers.sort();
        publishers
    }

    pub fn record(&self) -> SubscriberRecord {
        self.inner.state().record.clone()
    }

    /// Connect to `publisher` unless a stream to it exists or is being
    /// opened.
    pub async fn add_publisher(&self, publisher: PublisherIdentifier) -> Result<(), ConnectionError> {
        self.connect(publisher, false).await
    }

    /// `listed` connections came from a publisher list and are dropped on
    /// completion if a newer list no longer names them.
    async fn connect(&self, publisher: PublisherIdentifier, listed: bool) -> Result<(), ConnectionError> {
        {
            let mut state = self.inner.state();
            if state.closed || state.record.is_connected(&publisher) || !state.pending.insert(publisher.clone()) {
                return Ok(());
            }
        }

        let result = self.inner.negotiator.connect(&publisher).await;

        let mut state = self.inner.state();
        state.pending.remove(&publisher);
        let connection = match result {
            Ok(connection) => connection,
            Err(e) => {
                warn!("{} could not connect to {}: {}", self.inner.node.name(), publisher, e);
                return Err(e);
            }
        };
        if state.closed {
            return Ok(());
        }
        if listed && self.inner.policy == DisconnectPolicy::Disconnect && !state.is_listed(&publisher) {
            debug!("{} no longer listed, closing new stream", publisher);
            return Ok(());
        }

        info!(
            "{} connected to {} over {}",
            self.inner.node.name(),
            publisher,
            connection.protocol()
        );
        state.record.add(publisher.clone());
        let reader = tokio::spawn(read_messages(
            Arc::downgrade(&self.inner),
            publisher.clone(),
            connection,
        ));
        state.readers.insert(publisher, reader);
        Ok(())
    }

    /// Apply the publisher list the master pushed as `revision`, unless a
    /// newer one was applied already.
    pub async fn apply_update(&self, revision: u64, publishers: Vec<PublisherIdentifier>) {
        {
            let mut state = self.inner.state();
            if state.revision.is_some_and(|applied| revision <= applied) {
                debug!(
                    "Ignoring publisher list {} for {}, already at {:?}",
                    revision,
                    self.inner.topic.name(),
                    state.revision
                );
                return;
            }
            state.revision = Some(revision);
            self.reconcile(&mut state, &publishers);
        }

        self.connect_all(publishers).await;
    }

    /// Reconcile with a full publisher list.
    pub async fn update_publishers(&self, publishers: Vec<PublisherIdentifier>) {
        {
            let mut state = self.inner.state();
            self.reconcile(&mut state, &publishers);
        }

        self.connect_all(publishers).await;
    }

    fn reconcile(&self, state: &mut LinkState, publishers: &[PublisherIdentifier]) {
        if self.inner.policy != DisconnectPolicy::Disconnect {
            return;
        }

        let listed: HashSet<PublisherIdentifier> = publishers.iter().cloned().collect();
        let removed: Vec<PublisherIdentifier> = state
            .record
            .connected_publishers()
            .filter(|p| !listed.contains(*p))
            .cloned()
            .collect();
        for publisher in removed {
            info!("{} disconnecting from {}", self.inner.node.name(), publisher);
            state.disconnect(&publisher);
        }
        state.listed = Some(listed);
    }

    async fn connect_all(&self, publishers: Vec<PublisherIdentifier>) {
        let attempts = publishers.into_iter().map(|p| self.connect(p, true));
        let failed = join_all(attempts).await.into_iter().filter(Result::is_err).count();
        if failed > 0 {
            debug!("{} of the publishers of {} unreachable", failed, self.inner.topic.name());
        }
    }

    /// Close every stream, leave the node and unregister from the master.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        {
            let mut state = inner.state();
            state.closed = true;
            let publishers: Vec<_> = state.readers.keys().cloned().collect();
            for publisher in publishers {
                state.disconnect(&publisher);
            }
        }

        if let Some(topics) = inner.topics.upgrade() {
            let mut subscribers = topics.subscribers();
            if subscribers
                .get(inner.topic.name())
                .is_some_and(|s| Arc::ptr_eq(&s.inner, inner))
            {
                subscribers.remove(inner.topic.name());
            }
        }

        if let Err(e) = inner
            .master
            .unregister_subscriber(&inner.node, inner.topic.name())
            .await
        {
            warn!(
                "{} failed to unregister subscriber of {}: {}",
                inner.node.name(),
                inner.topic.name(),
                e
            );
        }
    }
}

impl SubscriberInner {
    fn state(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, message: &Message) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_message(message);
        }
    }
}

impl LinkState {
    fn is_listed(&self, publisher: &PublisherIdentifier) -> bool {
        self.listed.as_ref().is_none_or(|listed| listed.contains(publisher))
    }

    fn disconnect(&mut self, publisher: &PublisherIdentifier) {
        self.record.remove(publisher);
        if let Some(reader) = self.readers.remove(publisher) {
            reader.abort();
        }
    }
}

async fn read_messages(inner: Weak<SubscriberInner>, publisher: PublisherIdentifier, connection: DataConnection) {
    let mut stream = connection.into_stream();

    while let Some(Ok(msg)) = stream.next().await {
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else {
            continue;
        };

        match serde_json::from_str::<DataFrame>(text) {
            Ok(DataFrame::Message(message)) => {
                let Some(inner) = inner.upgrade() else {
                    break;
                };
                inner.dispatch(&message);
            }
            Ok(other) => debug!("Ignoring frame from {}: {:?}", publisher, other),
            Err(e) => warn!("Invalid frame from {}: {}", publisher, e),
        }
    }

    debug!("Stream from {} closed", publisher);
    if let Some(inner) = inner.upgrade() {
        let mut state = inner.state();
        state.record.remove(&publisher);
        state.readers.remove(&publisher);
    }
}
