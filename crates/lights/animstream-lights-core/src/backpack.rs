//! Backpack lights: one entry per source instead of full pattern stacks.
//! The default source follows the charger state.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use animstream_api_core::{BackpackLights, DeviceMessage};

use crate::config::BackpackTable;
use crate::layer::LightLayer;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChargerState {
    #[default]
    OffCharger,
    Charging,
    Charged,
    BadCharger,
}

#[derive(Clone, Debug)]
pub struct BackpackLightScheduler {
    table: BackpackTable,
    charger: ChargerState,
    user: Option<BackpackLights>,
    behavior: Option<BackpackLights>,
    last_sent: Option<BackpackLights>,
}

impl BackpackLightScheduler {
    pub fn new(table: BackpackTable) -> Self {
        Self {
            table,
            charger: ChargerState::default(),
            user: None,
            behavior: None,
            last_sent: None,
        }
    }

    /// Set or clear the entry for `layer`. The default layer is derived from
    /// the charger state and cannot be set directly.
    pub fn set_lights(&mut self, layer: LightLayer, lights: Option<BackpackLights>) -> bool {
        match layer {
            LightLayer::User => self.user = lights,
            LightLayer::Behavior => self.behavior = lights,
            LightLayer::Default => {
                warn!("backpack: default layer follows the charger state");
                return false;
            }
        }
        true
    }

    pub fn clear(&mut self, layer: LightLayer) -> bool {
        self.set_lights(layer, None)
    }

    /// Returns `false` (and changes nothing) when already in `state`.
    pub fn set_charger_state(&mut self, state: ChargerState) -> bool {
        if state == self.charger {
            warn!("backpack: charger already {state:?}");
            return false;
        }
        debug!("backpack: charger {:?} -> {state:?}", self.charger);
        self.charger = state;
        true
    }

    pub fn charger_state(&self) -> ChargerState {
        self.charger
    }

    fn default_lights(&self) -> &BackpackLights {
        match self.charger {
            ChargerState::OffCharger => &self.table.off_charger,
            ChargerState::Charging => &self.table.charging,
            ChargerState::Charged => &self.table.charged,
            ChargerState::BadCharger => &self.table.bad_charger,
        }
    }

    pub fn current_layer(&self) -> LightLayer {
        if self.user.is_some() {
            LightLayer::User
        } else if self.behavior.is_some() {
            LightLayer::Behavior
        } else {
            LightLayer::Default
        }
    }

    pub fn current(&self) -> &BackpackLights {
        self.user
            .as_ref()
            .or(self.behavior.as_ref())
            .unwrap_or_else(|| self.default_lights())
    }

    pub fn last_sent(&self) -> Option<&BackpackLights> {
        self.last_sent.as_ref()
    }

    /// Emit the resolved state when it differs from the last one sent.
    pub fn update(&mut self) -> Option<DeviceMessage> {
        let lights = self.current().clone();
        if self.last_sent.as_ref() == Some(&lights) {
            return None;
        }
        self.last_sent = Some(lights.clone());
        Some(DeviceMessage::BackpackLights(lights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use animstream_api_core::{Rgba, BACKPACK_LED_COUNT};

    #[test]
    fn sources_resolve_by_priority_and_emit_on_change() {
        let table = BackpackTable::default();
        let mut bp = BackpackLightScheduler::new(table.clone());
        assert_eq!(bp.update(), Some(DeviceMessage::BackpackLights(table.off_charger.clone())));
        assert_eq!(bp.update(), None);

        let red = BackpackLights::solid([Rgba::RED; BACKPACK_LED_COUNT]);
        let blue = BackpackLights::solid([Rgba::BLUE; BACKPACK_LED_COUNT]);
        bp.set_lights(LightLayer::Behavior, Some(red.clone()));
        bp.set_lights(LightLayer::User, Some(blue.clone()));
        assert_eq!(bp.current_layer(), LightLayer::User);
        assert_eq!(bp.update(), Some(DeviceMessage::BackpackLights(blue)));

        bp.clear(LightLayer::User);
        assert_eq!(bp.update(), Some(DeviceMessage::BackpackLights(red)));
        bp.clear(LightLayer::Behavior);
        assert_eq!(bp.current_layer(), LightLayer::Default);
    }

    #[test]
    fn charger_state_drives_the_default_layer() {
        let table = BackpackTable::default();
        let mut bp = BackpackLightScheduler::new(table.clone());
        bp.update();
        assert!(bp.set_charger_state(ChargerState::Charging));
        assert!(!bp.set_charger_state(ChargerState::Charging));
        assert_eq!(bp.update(), Some(DeviceMessage::BackpackLights(table.charging)));
        assert!(!bp.set_lights(LightLayer::Default, Some(BackpackLights::off())));
    }
}
