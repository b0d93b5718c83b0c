use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::config::NodeSettings;
use crate::identity::{NodeIdentifier, TopicDefinition};
use crate::master::MasterClient;
use crate::node::local::LocalTopics;
use crate::node::negotiator::ConnectionNegotiator;
use crate::node::publisher::{Publisher, serve_data};
use crate::node::slave::SlaveService;
use crate::node::subscriber::Subscriber;
use crate::transport::{Endpoint, EndpointHandle, serve_rpc};
use crate::utils::NodeError;

/// A participant of the graph.
///
/// Owns the slave and data endpoints, both bound on an ephemeral port of
/// `settings.host` and advertised under `settings.advertise_host`. At most
/// one publisher and one subscriber exist per topic; asking again returns
/// the existing one.
pub struct Node {
    identifier: NodeIdentifier,
    settings: NodeSettings,
    master: MasterClient,
    topics: Arc<LocalTopics>,
    slave: EndpointHandle,
    data: EndpointHandle,
    closed: AtomicBool,
}

impl Node {
    pub async fn new(name: impl Into<String>, settings: &NodeSettings) -> Result<Self, NodeError> {
        let master_uri = Url::parse(&settings.master_uri).map_err(|source| NodeError::InvalidMasterUri {
            uri: settings.master_uri.clone(),
            source,
        })?;
        let master = MasterClient::new(master_uri, settings.rpc_timeout());
        let topics = Arc::new(LocalTopics::default());

        let data_endpoint = Endpoint::bind(&settings.host, 0, &settings.advertise_host).await?;
        let data = serve_data(data_endpoint, topics.clone());

        let slave_endpoint = Endpoint::bind(&settings.host, 0, &settings.advertise_host).await?;
        let identifier = NodeIdentifier::new(name, slave_endpoint.uri().clone());
        let service = Arc::new(SlaveService::new(topics.clone(), data.uri().clone()));
        let slave = serve_rpc(slave_endpoint, service);

        info!("Node {} up, data on {}", identifier, data.uri());

        Ok(Self {
            identifier,
            settings: settings.clone(),
            master,
            topics,
            slave,
            data,
            closed: AtomicBool::new(false),
        })
    }

    /// A node with a generated, unique name.
    pub async fn anonymous(prefix: &str, settings: &NodeSettings) -> Result<Self, NodeError> {
        Self::new(format!("{}_{}", prefix, Uuid::new_v4().simple()), settings).await
    }

    pub fn identifier(&self) -> &NodeIdentifier {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        self.identifier.name()
    }

    pub fn master(&self) -> &MasterClient {
        &self.master
    }

    pub fn data_uri(&self) -> &Url {
        self.data.uri()
    }

    pub fn new_publisher(&self, topic: &str, message_type: &str) -> Result<Publisher, NodeError> {
        self.ensure_open()?;
        let mut publishers = self.topics.publishers();

        if let Some(existing) = publishers.get(topic) {
            check_type(existing.topic(), message_type)?;
            return Ok(existing.clone());
        }

        let publisher = Publisher::new(
            self.identifier.clone(),
            TopicDefinition::new(topic, message_type),
            self.master.clone(),
            Arc::downgrade(&self.topics),
        );
        publishers.insert(topic.to_string(), publisher.clone());
        publisher.start_registration();
        Ok(publisher)
    }

    pub fn new_subscriber(&self, topic: &str, message_type: &str) -> Result<Subscriber, NodeError> {
        self.ensure_open()?;
        let mut subscribers = self.topics.subscribers();

        if let Some(existing) = subscribers.get(topic) {
            check_type(existing.topic(), message_type)?;
            return Ok(existing.clone());
        }

        let definition = TopicDefinition::new(topic, message_type);
        let negotiator = ConnectionNegotiator::new(
            self.identifier.name(),
            definition.clone(),
            self.settings.protocols.clone(),
            self.settings.rpc_timeout(),
        );
        let subscriber = Subscriber::new(
            self.identifier.clone(),
            definition,
            self.master.clone(),
            negotiator,
            self.settings.disconnect_policy,
            Arc::downgrade(&self.topics),
        );
        subscribers.insert(topic.to_string(), subscriber.clone());
        subscriber.start_registration();
        Ok(subscriber)
    }

    /// Unregister every publisher and subscriber and stop both endpoints.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Node {} shutting down", self.identifier.name());

        let (publishers, subscribers) = self.topics.drain();
        for publisher in publishers {
            publisher.shutdown().await;
        }
        for subscriber in subscribers {
            subscriber.shutdown().await;
        }

        self.slave.shutdown();
        self.data.shutdown();
    }

    fn ensure_open(&self) -> Result<(), NodeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NodeError::ShutDown(self.identifier.name().to_string()));
        }
        Ok(())
    }
}

fn check_type(existing: &TopicDefinition, requested: &str) -> Result<(), NodeError> {
    if existing.message_type() != requested {
        return Err(NodeError::TopicTypeMismatch {
            topic: existing.name().to_string(),
            existing: existing.message_type().to_string(),
            requested: requested.to_string(),
        });
    }
    Ok(())
}
