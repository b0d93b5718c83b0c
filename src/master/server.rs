use std::sync::Arc;

use tracing::info;
use url::Url;

use crate::config::MasterSettings;
use crate::master::service::MasterService;
use crate::registry::TopicRegistry;
use crate::transport::{Endpoint, EndpointHandle, serve_rpc};
use crate::utils::ServerError;

/// A running master. Dropping it stops the endpoint.
#[derive(Debug)]
pub struct MasterServer {
    handle: EndpointHandle,
    registry: Arc<TopicRegistry>,
}

impl MasterServer {
    /// Bind the configured address and start serving.
    pub async fn start(settings: &MasterSettings) -> Result<Self, ServerError> {
        let endpoint = Endpoint::bind(&settings.host, settings.port, &settings.advertise_host).await?;
        let registry = Arc::new(TopicRegistry::new());
        let service = Arc::new(MasterService::new(
            registry.clone(),
            settings.notify_timeout(),
        ));

        let handle = serve_rpc(endpoint, service);
        info!("Master listening on {}", handle.uri());

        Ok(Self { handle, registry })
    }

    pub fn uri(&self) -> &Url {
        self.handle.uri()
    }

    pub fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    pub fn shutdown(&self) {
        info!("Master at {} shutting down", self.handle.uri());
        self.handle.shutdown();
    }
}
