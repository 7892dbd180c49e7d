/*!
 * Daemon instance status.
 *
 * Every daemon instance publishes its driver state on
 * `{prefix}{instance}/status/`. Entities are only available once the
 * driver has queried the nodes.
 */
use std::fmt;

use serde::{Deserialize, Serialize};

/// Driver state reported by a daemon instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DriverState {
    /// The daemon is not running
    Offline,
    /// The daemon is starting up
    Starting,
    /// The daemon is up, the driver is not
    Started,
    /// The daemon stopped
    Stopped,
    /// The driver opened the controller
    DriverReady,
    /// The driver could not open the controller
    DriverFailed,
    /// The controller was reset
    DriverReset,
    /// The controller was removed
    DriverRemoved,
    /// Every node was queried, some of them are dead
    AllNodesQueriedSomeDead,
    /// Every node was queried
    AllNodesQueried,
    /// Every awake node was queried
    AwakeNodesQueried,
    /// A state this crate does not know
    Other(String),
}

impl DriverState {
    /// Parse the daemon's status string
    pub fn from_status(status: &str) -> Self {
        match status {
            "Offline" => DriverState::Offline,
            "starting" => DriverState::Starting,
            "started" => DriverState::Started,
            "stopped" => DriverState::Stopped,
            "driverReady" => DriverState::DriverReady,
            "driverFailed" => DriverState::DriverFailed,
            "driverReset" => DriverState::DriverReset,
            "driverRemoved" => DriverState::DriverRemoved,
            "driverAllNodesQueriedSomeDead" => DriverState::AllNodesQueriedSomeDead,
            "driverAllNodesQueried" => DriverState::AllNodesQueried,
            "driverAwakeNodesQueried" => DriverState::AwakeNodesQueried,
            other => DriverState::Other(other.to_string()),
        }
    }

    /// The daemon's status string
    pub fn as_str(&self) -> &str {
        match self {
            DriverState::Offline => "Offline",
            DriverState::Starting => "starting",
            DriverState::Started => "started",
            DriverState::Stopped => "stopped",
            DriverState::DriverReady => "driverReady",
            DriverState::DriverFailed => "driverFailed",
            DriverState::DriverReset => "driverReset",
            DriverState::DriverRemoved => "driverRemoved",
            DriverState::AllNodesQueriedSomeDead => "driverAllNodesQueriedSomeDead",
            DriverState::AllNodesQueried => "driverAllNodesQueried",
            DriverState::AwakeNodesQueried => "driverAwakeNodesQueried",
            DriverState::Other(other) => other.as_str(),
        }
    }

    /// Whether entities of the instance can be used
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            DriverState::AllNodesQueriedSomeDead
                | DriverState::AllNodesQueried
                | DriverState::AwakeNodesQueried
        )
    }
}

impl From<String> for DriverState {
    fn from(status: String) -> Self {
        Self::from_status(&status)
    }
}

impl From<DriverState> for String {
    fn from(state: DriverState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one daemon instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceStatus {
    /// Daemon instance id
    pub ozw_instance: u32,
    /// Driver state
    pub state: DriverState,
}

impl InstanceStatus {
    /// Create a status record
    pub fn new(ozw_instance: u32, state: DriverState) -> Self {
        Self { ozw_instance, state }
    }

    /// Whether entities of the instance can be used
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }
}
