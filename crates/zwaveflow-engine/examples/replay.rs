/*!
 * Replay example
 *
 * Feeds a handful of captured daemon messages through the decoder and a
 * discovery session, then drives the resulting light. No broker needed.
 */
use std::sync::{Arc, Mutex};

use zwaveflow_core::logging;
use zwaveflow_devices::command::RecordingSender;
use zwaveflow_devices::message::OzwMessageDecoder;
use zwaveflow_engine::platforms::light::LightTurnOn;
use zwaveflow_engine::{DiscoverySession, EntityStore, Platform};

const MESSAGES: &[(&str, &str)] = &[
    (
        "OpenZWave/1/node/2/",
        r#"{"NodeID": 2, "NodeManufacturerName": "AEON Labs", "NodeProductName": "ZW098 LED Bulb",
            "NodeGeneric": 17, "NodeSpecific": 1, "NodeManufacturerID": "0x0086",
            "NodeProductType": "0x0103", "NodeProductID": "0x0062"}"#,
    ),
    (
        "OpenZWave/1/node/2/instance/1/commandclass/38/value/38371345/",
        r#"{"Label": "Level", "Value": 0, "Type": "Byte", "Instance": 1, "Index": 0, "Genre": "User"}"#,
    ),
    (
        "OpenZWave/1/node/2/instance/1/commandclass/51/value/659128337/",
        r##"{"Label": "Color", "Value": "#000000FF00", "Type": "String", "Instance": 1, "Index": 0, "Genre": "User"}"##,
    ),
    (
        "OpenZWave/1/node/2/instance/1/commandclass/51/value/659341329/",
        r#"{"Label": "Color Channels", "Value": 31, "Type": "Int", "Instance": 1, "Index": 2, "Genre": "System"}"#,
    ),
    (
        "OpenZWave/1/node/2/instance/1/commandclass/38/value/38371345/",
        r#"{"Label": "Level", "Value": 99, "Type": "Byte", "Instance": 1, "Index": 0, "Genre": "User"}"#,
    ),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info,zwaveflow_engine=debug")?;

    let sender = RecordingSender::new();
    let store = Arc::new(Mutex::new(EntityStore::new(Arc::new(sender.clone()))));
    let mut session = DiscoverySession::default();
    session.add_listener(Box::new(store.clone()));

    let mut decoder = OzwMessageDecoder::new("OpenZWave/");
    for (topic, payload) in MESSAGES {
        if let Some(event) = decoder.decode(topic, payload.as_bytes())? {
            session.handle(event);
        }
    }

    let mut store = store.lock().map_err(|_| "entity store lock poisoned")?;
    for (key, platform) in store.iter() {
        println!("{} = {} ({})", key, platform.entity().state(), platform.entity().name());
    }

    if let Some(Platform::Light(light)) = store.get_mut("light.2-38371345") {
        println!("rgb {:?}, white {:?}", light.rgb(), light.white());
        light.turn_on(LightTurnOn {
            rgb: Some((255, 0, 0)),
            brightness: Some(128),
            ..LightTurnOn::default()
        })?;
    }

    for sent in sender.sent() {
        println!("{} <- {}", sent.topic, serde_json::to_string(&sent.command)?);
    }
    Ok(())
}
