//! Node and controller services.

use tracing::{info, warn};

use zwaveflow_core::types::Value;
use zwaveflow_devices::command::{CommandSender, ControllerCommand};
use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::value::ValueType;

use crate::dispatcher::DiscoverySession;
use crate::error::{Error, Result};

/// Set a configuration parameter of a node
///
/// `selection` is interpreted according to the type of the configuration
/// value: `"True"` switches a bool on and anything else off, list values
/// take the option label, buttons are pressed and released, every other
/// type takes an integer.
pub fn set_config_parameter(
    session: &DiscoverySession,
    sender: &dyn CommandSender,
    node_id: u8,
    parameter: u16,
    selection: &str,
) -> Result<()> {
    if !session.nodes().contains_node(node_id) {
        return Err(Error::UnknownNode(node_id));
    }

    let value = session
        .nodes()
        .values(node_id)
        .find(|value| value.command_class == CommandClass::Configuration && value.index == parameter);
    let value = match value {
        Some(value) => value,
        None => {
            warn!(
                "Unknown config parameter {} on Node {} with selection {}",
                parameter, node_id, selection
            );
            return Err(Error::UnknownConfigParameter { node_id, parameter });
        }
    };

    info!(
        "Setting config parameter {} on Node {} with selection {}",
        parameter, node_id, selection
    );
    match value.value_type {
        ValueType::Bool => {
            sender.send_value(value, Value::Integer(i64::from(selection == "True")))?;
        }
        ValueType::List => {
            sender.send_value(value, Value::from(selection))?;
        }
        ValueType::Button => {
            sender.send_value(value, Value::Bool(true))?;
            sender.send_value(value, Value::Bool(false))?;
        }
        _ => {
            let number: i64 = selection.trim().parse().map_err(|_| {
                Error::invalid_selection(format!(
                    "{} is not a valid value for config parameter {}",
                    selection, parameter
                ))
            })?;
            sender.send_value(value, Value::Integer(number))?;
        }
    }
    Ok(())
}

/// Put the controller of `ozw_instance` into inclusion mode
pub fn add_node(sender: &dyn CommandSender, ozw_instance: u32, secure: bool) -> Result<()> {
    info!("Starting inclusion on instance {} (secure: {})", ozw_instance, secure);
    controller_command(sender, ozw_instance, ControllerCommand::AddNode { secure })
}

/// Put the controller of `ozw_instance` into exclusion mode
pub fn remove_node(sender: &dyn CommandSender, ozw_instance: u32) -> Result<()> {
    info!("Starting exclusion on instance {}", ozw_instance);
    controller_command(sender, ozw_instance, ControllerCommand::RemoveNode)
}

/// Remove a failed node from the controller
pub fn remove_failed_node(sender: &dyn CommandSender, ozw_instance: u32, node_id: u8) -> Result<()> {
    info!("Removing failed node {} on instance {}", node_id, ozw_instance);
    controller_command(sender, ozw_instance, ControllerCommand::RemoveFailedNode { node_id })
}

/// Replace a failed node with a new device
pub fn replace_failed_node(sender: &dyn CommandSender, ozw_instance: u32, node_id: u8) -> Result<()> {
    info!("Replacing failed node {} on instance {}", node_id, ozw_instance);
    controller_command(sender, ozw_instance, ControllerCommand::ReplaceFailedNode { node_id })
}

/// Cancel the controller command in progress
pub fn cancel_command(sender: &dyn CommandSender, ozw_instance: u32) -> Result<()> {
    info!("Cancelling controller command on instance {}", ozw_instance);
    controller_command(sender, ozw_instance, ControllerCommand::CancelCommand)
}

fn controller_command(sender: &dyn CommandSender, ozw_instance: u32, command: ControllerCommand) -> Result<()> {
    sender.send_controller_command(ozw_instance, command)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use zwaveflow_devices::command::RecordingSender;
    use zwaveflow_devices::value::ValueId;

    fn session() -> DiscoverySession {
        let (mut session, _) = session_with_recorder();
        session.node_added(switch_node(5));
        session.value_added(config_value(5, 1, 501).with_type(ValueType::Bool));
        session.value_added(config_value(5, 2, 502).with_type(ValueType::List));
        session.value_added(config_value(5, 3, 503).with_type(ValueType::Button));
        session.value_added(config_value(5, 4, 504).with_type(ValueType::Short));
        session
    }

    #[test_log::test]
    fn test_selection_follows_value_type() {
        let session = session();
        let sender = RecordingSender::new();

        set_config_parameter(&session, &sender, 5, 1, "True").unwrap();
        set_config_parameter(&session, &sender, 5, 1, "yes").unwrap();
        set_config_parameter(&session, &sender, 5, 2, "Blink").unwrap();
        set_config_parameter(&session, &sender, 5, 3, "").unwrap();
        set_config_parameter(&session, &sender, 5, 4, " 300 ").unwrap();

        assert_eq!(
            sender.values(),
            vec![
                Value::Integer(1),
                Value::Integer(0),
                Value::from("Blink"),
                Value::Bool(true),
                Value::Bool(false),
                Value::Integer(300),
            ]
        );
        let targets: Vec<ValueId> = sender.sent().iter().map(|s| s.command.value_id).collect();
        assert_eq!(targets[0], ValueId(501));
        assert_eq!(targets[5], ValueId(504));
    }

    #[test_log::test]
    fn test_failures() {
        let session = session();
        let sender = RecordingSender::new();

        assert!(matches!(
            set_config_parameter(&session, &sender, 5, 99, "1"),
            Err(Error::UnknownConfigParameter { node_id: 5, parameter: 99 })
        ));
        assert!(matches!(
            set_config_parameter(&session, &sender, 6, 1, "1"),
            Err(Error::UnknownNode(6))
        ));
        assert!(matches!(
            set_config_parameter(&session, &sender, 5, 4, "lots"),
            Err(Error::InvalidSelection(_))
        ));
        assert!(sender.sent().is_empty());
    }

    #[test_log::test]
    fn test_controller_services() {
        let sender = RecordingSender::new();

        add_node(&sender, 1, false).unwrap();
        add_node(&sender, 1, true).unwrap();
        remove_node(&sender, 1).unwrap();
        remove_failed_node(&sender, 2, 14).unwrap();
        replace_failed_node(&sender, 1, 15).unwrap();
        cancel_command(&sender, 1).unwrap();

        let sent = sender.controller_commands();
        let commands: Vec<ControllerCommand> = sent.iter().map(|s| s.command).collect();
        assert_eq!(
            commands,
            vec![
                ControllerCommand::AddNode { secure: false },
                ControllerCommand::AddNode { secure: true },
                ControllerCommand::RemoveNode,
                ControllerCommand::RemoveFailedNode { node_id: 14 },
                ControllerCommand::ReplaceFailedNode { node_id: 15 },
                ControllerCommand::CancelCommand,
            ]
        );
        assert_eq!(sent[3].topic, "OpenZWave/2/command/removefailednode/");
        assert_eq!(sent[4].topic, "OpenZWave/1/command/replacefailednode/");
        assert!(sender.sent().is_empty());
    }
}
