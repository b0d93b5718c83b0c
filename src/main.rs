//! CLI for rosmaster
//!
//! Subcommands:
//! - `master`: run the master until Ctrl-C
//! - `topics`: list the published topics
//! - `info`: show the publishers and subscribers of a topic
//! - `echo`: subscribe to a topic and log every message

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rosmaster::config::{Settings, load_config_from};
use rosmaster::master::{MasterClient, MasterServer};
use rosmaster::node::{ANY_TYPE, Node};
use rosmaster::transport::Message;
use tracing::{error, info, warn};
use url::Url;

#[derive(Parser)]
#[command(name = "rosmaster", version, about)]
struct Cli {
    /// Configuration file, instead of config/default
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the master
    Master,
    /// List the published topics
    Topics,
    /// Show the publishers and subscribers of a topic
    Info { topic: String },
    /// Subscribe to a topic and log every message
    Echo {
        topic: String,
        /// Message type to subscribe with
        #[arg(default_value = ANY_TYPE)]
        message_type: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match load_config_from(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            rosmaster::utils::logging::init("info");
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    rosmaster::utils::logging::init(&settings.logging.level);

    let result = match cli.command {
        Command::Master => run_master(&settings).await,
        Command::Topics => run_topics(&settings).await,
        Command::Info { topic } => run_info(&settings, &topic).await,
        Command::Echo {
            topic,
            message_type,
        } => run_echo(&settings, &topic, &message_type).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_master(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let master = MasterServer::start(&settings.master).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully.");
    master.shutdown();

    Ok(())
}

fn master_client(settings: &Settings) -> Result<MasterClient, Box<dyn std::error::Error>> {
    let uri = Url::parse(&settings.node.master_uri)?;
    Ok(MasterClient::new(uri, settings.node.rpc_timeout()))
}

async fn run_topics(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let master = master_client(settings)?;

    for topic in master.published_topics().await? {
        println!("{} [{}]", topic.name(), topic.message_type());
    }

    Ok(())
}

async fn run_info(settings: &Settings, topic: &str) -> Result<(), Box<dyn std::error::Error>> {
    let master = master_client(settings)?;
    let publishers = master.lookup_publishers(topic).await?;
    let state = master.system_state().await?;

    let message_type = publishers
        .iter()
        .find_map(|p| p.topic())
        .map(|t| t.message_type().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("Topic: {topic}");
    println!("Type: {message_type}");

    println!("Publishers:");
    for publisher in &publishers {
        if let (Some(name), Some(uri)) = (publisher.node_name(), publisher.node_uri()) {
            println!("  * {name} ({uri})");
        }
    }

    println!("Subscribers:");
    for members in state.subscribers.iter().filter(|m| m.topic == topic) {
        for node in &members.nodes {
            println!("  * {node}");
        }
    }

    Ok(())
}

async fn run_echo(settings: &Settings, topic: &str, message_type: &str) -> Result<(), Box<dyn std::error::Error>> {
    let node = Node::anonymous("echo", &settings.node).await?;
    let subscriber = node.new_subscriber(topic, message_type)?;

    subscriber.add_message_listener(|message: &Message| {
        info!("[{}] {}: {}", message.timestamp, message.topic, message.payload);
    });

    if !subscriber
        .await_registration(settings.node.rpc_timeout() + Duration::from_secs(1))
        .await
    {
        warn!("Master at {} did not acknowledge the subscription", settings.node.master_uri);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully.");
    node.shutdown().await;

    Ok(())
}
