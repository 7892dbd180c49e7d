//! zwaveflow - Z-Wave discovery bridge
//!
//! Connects to the broker the OpenZWave daemon publishes to, feeds every
//! node and value message through a discovery session and keeps an adapter
//! for each entity found.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing::{debug, info, warn};

use zwaveflow_core::config::{Config, ConfigBuilder};
use zwaveflow_core::logging;
use zwaveflow_devices::command::{CommandSender, RecordingSender};
use zwaveflow_devices::message::OzwMessageDecoder;
use zwaveflow_devices::protocols::MqttConnection;
use zwaveflow_engine::{services, DiscoverySession, EntityStore};

/// Controller command sent once after connecting
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ControllerAction {
    /// Start inclusion
    AddNode,
    /// Start secure inclusion
    AddSecureNode,
    /// Start exclusion
    RemoveNode,
    /// Remove the failed node given by --node-id
    RemoveFailedNode,
    /// Replace the failed node given by --node-id
    ReplaceFailedNode,
    /// Cancel the controller command in progress
    Cancel,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "zwaveflow")]
#[command(about = "Discover Z-Wave entities from OpenZWave MQTT traffic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "ZWAVEFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Prefix of environment variables overriding the configuration
    #[arg(long, default_value = "ZWAVEFLOW")]
    env_prefix: String,

    /// MQTT broker host
    #[arg(long)]
    host: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    port: Option<u16>,

    /// Log filter, overrides the configured level
    #[arg(long)]
    log_level: Option<String>,

    /// Record commands instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Print every entity as JSON on exit
    #[arg(long)]
    dump: bool,

    /// Send a controller command after connecting
    #[arg(long, value_enum)]
    controller: Option<ControllerAction>,

    /// Node targeted by the failed node commands
    #[arg(long, required_if_eq_any([("controller", "remove-failed-node"), ("controller", "replace-failed-node")]))]
    node_id: Option<u8>,

    /// Daemon instance receiving the controller command
    #[arg(long, default_value_t = 1)]
    instance: u32,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut builder = ConfigBuilder::new().with_environment_prefix(&self.env_prefix);
        if let Some(path) = &self.config {
            builder = builder.with_config_file(path);
        }
        let mut config = builder.build().context("Failed to load configuration")?;

        if let Some(host) = &self.host {
            config.mqtt.host = host.clone();
        }
        if let Some(port) = self.port {
            config.mqtt.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

fn run_controller(args: &Args, sender: &dyn CommandSender) -> anyhow::Result<()> {
    let action = match args.controller {
        Some(action) => action,
        None => return Ok(()),
    };
    let node_id = || {
        args.node_id
            .ok_or_else(|| anyhow::anyhow!("--node-id is required for {:?}", action))
    };
    match action {
        ControllerAction::AddNode => services::add_node(sender, args.instance, false)?,
        ControllerAction::AddSecureNode => services::add_node(sender, args.instance, true)?,
        ControllerAction::RemoveNode => services::remove_node(sender, args.instance)?,
        ControllerAction::RemoveFailedNode => {
            services::remove_failed_node(sender, args.instance, node_id()?)?
        }
        ControllerAction::ReplaceFailedNode => {
            services::replace_failed_node(sender, args.instance, node_id()?)?
        }
        ControllerAction::Cancel => services::cancel_command(sender, args.instance)?,
    }
    Ok(())
}

fn dump(store: &EntityStore) -> anyhow::Result<()> {
    let entities: Vec<_> = store
        .iter()
        .map(|(key, platform)| {
            let entity = platform.entity();
            json!({
                "entity_id": key,
                "name": entity.name(),
                "state": entity.state(),
                "available": store.is_available(key),
                "enabled_by_default": entity.enabled_by_default(),
                "attributes": entity.attributes(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    logging::init_from_config(&config.logging)?;
    zwaveflow_engine::init()?;
    info!(
        "Starting {} ({}) against {}:{}",
        config.general.app_name, config.general.environment, config.mqtt.host, config.mqtt.port
    );

    let mut connection = MqttConnection::new(&config.mqtt);
    let sender: Arc<dyn CommandSender> = if args.dry_run {
        info!("Dry run, commands are recorded and not published");
        Arc::new(RecordingSender::with_prefix(config.mqtt.topic_prefix.clone()))
    } else {
        Arc::new(connection.sender())
    };

    run_controller(&args, sender.as_ref()).context("Failed to send controller command")?;

    let store = Arc::new(Mutex::new(EntityStore::new(sender)));
    let mut session = DiscoverySession::from_config(&config);
    session.add_listener(Box::new(store.clone()));
    let mut decoder = OzwMessageDecoder::new(config.mqtt.topic_prefix.clone());

    loop {
        tokio::select! {
            message = connection.next_message() => {
                let (topic, payload) = message?;
                match decoder.decode(&topic, &payload) {
                    Ok(Some(event)) => session.handle(event),
                    Ok(None) => debug!("Ignoring message on {}", topic),
                    Err(e) => warn!("Dropping message on {}: {}", topic, e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    info!(
        "{} nodes, {} entities ready",
        session.nodes().len(),
        session.ready_count()
    );
    if args.dump {
        let store = store
            .lock()
            .map_err(|_| anyhow::anyhow!("entity store lock poisoned"))?;
        dump(&store)?;
    }

    connection.disconnect().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_defaults() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "zwaveflow",
            "--host",
            "broker.local",
            "--port",
            "1884",
            "--log-level",
            "zwaveflow_engine=debug",
            "--env-prefix",
            "ZWAVEFLOW_CLI_TEST",
            "--dry-run",
        ])?;
        assert!(args.dry_run);
        assert!(!args.dump);

        let config = args.load_config()?;
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 1884);
        assert_eq!(config.logging.level, "zwaveflow_engine=debug");
        assert_eq!(config.mqtt.topic_prefix, "OpenZWave/");
        Ok(())
    }

    #[test]
    fn test_controller_action() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "zwaveflow",
            "--controller",
            "remove-failed-node",
            "--node-id",
            "12",
            "--instance",
            "2",
        ])?;
        let sender = RecordingSender::new();
        run_controller(&args, &sender)?;

        let sent = sender.controller_commands();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "OpenZWave/2/command/removefailednode/");

        assert!(Args::try_parse_from(["zwaveflow", "--controller", "replace-failed-node"]).is_err());

        let args = Args::try_parse_from(["zwaveflow"])?;
        run_controller(&args, &sender)?;
        assert_eq!(sender.controller_commands().len(), 1);
        Ok(())
    }
}
