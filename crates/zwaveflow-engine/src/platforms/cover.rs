/*!
 * Covers: roller shutters, blinds and garage doors.
 *
 * Only multilevel-switch covers get an adapter. The Fibaro FGRM222 reports
 * its position and tilt through manufacturer proprietary values, so for that
 * product both are read from and written to those slots.
 */
use std::sync::Arc;

use tracing::warn;

use zwaveflow_devices::command::CommandSender;
use zwaveflow_devices::command_class::CommandClass;
use zwaveflow_devices::node::NodeRecord;

use crate::entity_values::EntityValues;
use crate::error::{Error, Result};
use crate::platforms::{EntityBase, ZwaveEntity};
use crate::schema::Slot;

const MANUFACTURER_ID_FIBARO: &str = "0x010f";
const PRODUCT_TYPE_FIBARO_FGRM222: &str = "0x0302";

/// Levels below this count as closed
const CLOSED_BELOW: i64 = 5;
const OPEN_LEVEL: i64 = 99;
const CLOSED_LEVEL: i64 = 0;

/// Supported cover features
pub mod features {
    /// Can be opened
    pub const OPEN: u32 = 1;
    /// Can be closed
    pub const CLOSE: u32 = 2;
    /// Position can be set
    pub const SET_POSITION: u32 = 4;
    /// Tilt can be opened
    pub const OPEN_TILT: u32 = 16;
    /// Tilt can be closed
    pub const CLOSE_TILT: u32 = 32;
    /// Tilt position can be set
    pub const SET_TILT_POSITION: u32 = 128;

    /// Position features
    pub const POSITION: u32 = OPEN | CLOSE | SET_POSITION;
    /// Tilt features
    pub const TILT: u32 = OPEN_TILT | CLOSE_TILT | SET_TILT_POSITION;
}

/// A position controlled cover
#[derive(Debug)]
pub struct ZwaveCover {
    base: EntityBase,
    fgrm222: bool,
}

impl ZwaveCover {
    /// Create the adapter
    ///
    /// Returns `None` when the primary value is not a multilevel switch.
    pub fn new(node: &NodeRecord, values: &EntityValues, sender: Arc<dyn CommandSender>) -> Option<Self> {
        if values.primary().command_class != CommandClass::SwitchMultilevel {
            warn!("Cover not implemented for value {}", values.primary());
            return None;
        }
        let fgrm222 = node.manufacturer_id == MANUFACTURER_ID_FIBARO
            && node.product_type == PRODUCT_TYPE_FIBARO_FGRM222;
        Some(Self {
            base: EntityBase::new(node, values, sender),
            fgrm222,
        })
    }

    fn position_slot(&self) -> Slot {
        if self.fgrm222 {
            Slot::SlatPosition
        } else {
            Slot::Primary
        }
    }

    fn level(&self, slot: Slot) -> Option<i64> {
        self.base.get(slot).and_then(|value| value.value.as_integer())
    }

    /// Feature bitmask
    pub fn supported_features(&self) -> u32 {
        if self.fgrm222 {
            features::POSITION | features::TILT
        } else {
            features::POSITION
        }
    }

    /// Current position, 0 (closed) to 99 (open)
    pub fn current_position(&self) -> Option<i64> {
        self.level(self.position_slot())
    }

    /// Current tilt, FGRM222 only
    pub fn current_tilt_position(&self) -> Option<i64> {
        if self.fgrm222 {
            self.level(Slot::TiltPosition)
        } else {
            None
        }
    }

    /// Whether the cover is closed
    pub fn is_closed(&self) -> bool {
        self.current_position()
            .map_or(false, |position| position < CLOSED_BELOW)
    }

    /// Open fully
    pub fn open(&self) -> Result<()> {
        self.base.send(self.position_slot(), OPEN_LEVEL)?;
        if self.fgrm222 {
            self.base.send(Slot::TiltPosition, OPEN_LEVEL)?;
        }
        Ok(())
    }

    /// Close fully
    pub fn close(&self) -> Result<()> {
        self.base.send(self.position_slot(), CLOSED_LEVEL)?;
        if self.fgrm222 {
            self.base.send(Slot::TiltPosition, CLOSED_LEVEL)?;
        }
        Ok(())
    }

    /// Move to a position
    pub fn set_position(&self, position: u8) -> Result<()> {
        self.base.send(self.position_slot(), position)
    }

    fn require_tilt(&self) -> Result<()> {
        if self.fgrm222 {
            Ok(())
        } else {
            Err(Error::unsupported(format!(
                "cover {} has no tilt",
                self.base.values().unique_id()
            )))
        }
    }

    /// Set the tilt position
    pub fn set_tilt_position(&self, tilt: u8) -> Result<()> {
        self.require_tilt()?;
        self.base.send(Slot::TiltPosition, tilt)
    }

    /// Open the tilt fully
    pub fn open_tilt(&self) -> Result<()> {
        self.require_tilt()?;
        self.base.send(Slot::TiltPosition, OPEN_LEVEL)
    }

    /// Close the tilt fully
    pub fn close_tilt(&self) -> Result<()> {
        self.require_tilt()?;
        self.base.send(Slot::TiltPosition, CLOSED_LEVEL)
    }
}

impl ZwaveEntity for ZwaveCover {
    fn values(&self) -> &EntityValues {
        self.base.values()
    }

    fn name(&self) -> String {
        self.base.name()
    }

    fn state(&self) -> String {
        if self.is_closed() { "closed" } else { "open" }.to_string()
    }

    fn update_values(&mut self, values: &EntityValues) {
        self.base.update(values);
    }
}
