use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the master, for nodes started by this process and
/// for logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub master: MasterSettings,
    pub node: NodeSettings,
    pub logging: LoggingSettings,
}

/// Configuration settings for the master.
///
/// `host`/`port` is where the master binds; `advertise_host` is the host put
/// in the URI handed to nodes.
#[derive(Debug, Deserialize, Clone)]
pub struct MasterSettings {
    pub host: String,
    pub port: u16,
    pub advertise_host: String,
    pub notify_timeout_ms: u64,
}

impl MasterSettings {
    /// Bound on one publisher update pushed to one subscriber.
    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}

/// Configuration settings for a node.
#[derive(Debug, Deserialize, Clone)]
pub struct NodeSettings {
    pub master_uri: String,
    pub host: String,
    pub advertise_host: String,
    pub rpc_timeout_ms: u64,
    /// Data protocols offered to publishers, most preferred first.
    pub protocols: Vec<String>,
    pub disconnect_policy: DisconnectPolicy,
}

impl NodeSettings {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

/// What a subscriber does with a connection to a publisher that disappeared
/// from the master's latest publisher list.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectPolicy {
    /// Close the connection right away.
    #[default]
    Disconnect,
    /// Keep it until the data stream itself ends.
    Keep,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Any subset of the settings may be given; missing values are filled from the defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub master: Option<PartialMasterSettings>,
    pub node: Option<PartialNodeSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialMasterSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub advertise_host: Option<String>,
    pub notify_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialNodeSettings {
    pub master_uri: Option<String>,
    pub host: Option<String>,
    pub advertise_host: Option<String>,
    pub rpc_timeout_ms: Option<u64>,
    pub protocols: Option<Vec<String>>,
    pub disconnect_policy: Option<DisconnectPolicy>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Settings {
    /// Fill everything `partial` leaves out with the defaults.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let master = partial.master.unwrap_or_default();
        let node = partial.node.unwrap_or_default();
        let logging = partial.logging.unwrap_or_default();

        Settings {
            master: MasterSettings {
                host: master.host.unwrap_or(default.master.host),
                port: master.port.unwrap_or(default.master.port),
                advertise_host: master.advertise_host.unwrap_or(default.master.advertise_host),
                notify_timeout_ms: master
                    .notify_timeout_ms
                    .unwrap_or(default.master.notify_timeout_ms),
            },
            node: NodeSettings {
                master_uri: node.master_uri.unwrap_or(default.node.master_uri),
                host: node.host.unwrap_or(default.node.host),
                advertise_host: node.advertise_host.unwrap_or(default.node.advertise_host),
                rpc_timeout_ms: node.rpc_timeout_ms.unwrap_or(default.node.rpc_timeout_ms),
                protocols: node.protocols.unwrap_or(default.node.protocols),
                disconnect_policy: node
                    .disconnect_policy
                    .unwrap_or(default.node.disconnect_policy),
            },
            logging: LoggingSettings {
                level: logging.level.unwrap_or(default.logging.level),
            },
        }
    }
}

/// Provides default values for `Settings`.
///
/// A master on the conventional port 11311 of the loopback interface, and
/// nodes that talk to it.
impl Default for Settings {
    fn default() -> Self {
        Self {
            master: MasterSettings {
                host: "127.0.0.1".to_string(),
                port: 11311,
                advertise_host: "127.0.0.1".to_string(),
                notify_timeout_ms: 5000,
            },
            node: NodeSettings {
                master_uri: "ws://127.0.0.1:11311".to_string(),
                host: "127.0.0.1".to_string(),
                advertise_host: "127.0.0.1".to_string(),
                rpc_timeout_ms: 5000,
                protocols: vec![crate::transport::WEBSOCKET_PROTOCOL.to_string()],
                disconnect_policy: DisconnectPolicy::Disconnect,
            },
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}
