use rotor_protocol::Rotation;
use serde_json::{Map, Value};
use tracing::warn;

use crate::merge::apply;
use crate::slice::Slice;

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Mirror of the rotor hardware state. The angle may exceed 0..360 to
/// represent the multi-turn overlap region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotorState {
    pub rotation: Rotation,
    pub angle: f64,
    pub adc_v: f64,
    pub speed: u8,
    pub target: Option<f64>,
}

impl RotorState {
    /// 16-wind compass name for the current angle.
    pub fn cardinal(&self) -> &'static str {
        let mut compass_angle = self.angle % 360.0;
        if compass_angle < 0.0 {
            compass_angle += 360.0;
        }
        let step = 360.0 / CARDINALS.len() as f64;
        let index = (compass_angle / step).round() as usize;
        CARDINALS[index % CARDINALS.len()]
    }

    pub fn is_overlap(&self) -> bool {
        self.angle > 360.0
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

pub struct RotorStore {
    slice: Slice<RotorState>,
}

impl RotorStore {
    pub fn new() -> Self {
        Self { slice: Slice::default() }
    }

    pub fn get(&self) -> RotorState {
        self.slice.get()
    }

    pub fn version(&self) -> u64 {
        self.slice.version()
    }

    pub fn subscribe(&self, listener: impl Fn(&RotorState) + Send + Sync + 'static) {
        self.slice.subscribe(listener);
    }

    /// Optimistic local speed write; the controller echoes it back.
    pub(crate) fn set_speed(&self, speed: u8) {
        self.slice.update(|state| state.speed = speed);
    }

    /// Partial update: the controller may broadcast only the fields
    /// that changed.
    pub(crate) fn merge_remote(&self, fields: &Map<String, Value>) {
        self.slice.update(|state| {
            let was_rotating = state.rotation != Rotation::Stop;
            for (key, value) in fields {
                match key.as_str() {
                    "rotation" => apply(
                        "rotor",
                        key,
                        value
                            .as_i64()
                            .and_then(|raw| i8::try_from(raw).ok())
                            .and_then(|raw| Rotation::try_from(raw).ok()),
                        &mut state.rotation,
                    ),
                    "angle" => apply("rotor", key, value.as_f64(), &mut state.angle),
                    "adc_v" => apply("rotor", key, value.as_f64(), &mut state.adc_v),
                    "speed" => apply(
                        "rotor",
                        key,
                        value.as_u64().and_then(|raw| u8::try_from(raw).ok()),
                        &mut state.speed,
                    ),
                    "target" => {
                        if value.is_null() {
                            state.target = None;
                        } else {
                            apply("rotor", key, value.as_f64().map(Some), &mut state.target);
                        }
                    }
                    _ => warn!(key, "unknown rotor field"),
                }
            }
            // The controller stops reporting a target once rotation
            // ends; mirror that locally.
            if was_rotating && state.rotation == Rotation::Stop {
                state.target = None;
            }
        });
    }
}

impl Default for RotorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinal_wraps_and_normalizes() {
        let mut state = RotorState::default();
        assert_eq!(state.cardinal(), "N");
        state.angle = 90.0;
        assert_eq!(state.cardinal(), "E");
        state.angle = -90.0;
        assert_eq!(state.cardinal(), "W");
        state.angle = 450.0;
        assert_eq!(state.cardinal(), "E");
        assert!(state.is_overlap());
    }
}
