use std::time::Duration;

use tokio::net::TcpListener;
use url::Url;

use crate::config::{DisconnectPolicy, MasterSettings, NodeSettings};
use crate::master::MasterServer;
use crate::transport::WEBSOCKET_PROTOCOL;

/// URI of a local port nothing listens on.
pub(crate) async fn closed_port_uri() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("ws://127.0.0.1:{port}")).unwrap()
}

pub(crate) async fn start_master() -> MasterServer {
    let settings = MasterSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        advertise_host: "127.0.0.1".to_string(),
        notify_timeout_ms: 500,
    };
    MasterServer::start(&settings).await.expect("master start")
}

pub(crate) fn node_settings(master_uri: &Url) -> NodeSettings {
    NodeSettings {
        master_uri: master_uri.to_string(),
        host: "127.0.0.1".to_string(),
        advertise_host: "127.0.0.1".to_string(),
        rpc_timeout_ms: 1000,
        protocols: vec![WEBSOCKET_PROTOCOL.to_string()],
        disconnect_policy: DisconnectPolicy::Disconnect,
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub(crate) async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
