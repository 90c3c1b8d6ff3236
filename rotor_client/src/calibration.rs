use serde_json::{Map, Value};
use tracing::warn;

use crate::merge::apply;
use crate::slice::Slice;

/// Two calibration points (ADC voltage vs. angle) plus an offset. The
/// controller does the actual voltage-to-angle mapping; the client only
/// carries the numbers for display and for the calibration dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationState {
    pub u1: f64,
    pub u2: f64,
    pub a1: f64,
    pub a2: f64,
    pub offset: f64,
}

pub struct CalibrationStore {
    slice: Slice<CalibrationState>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self { slice: Slice::default() }
    }

    pub fn get(&self) -> CalibrationState {
        self.slice.get()
    }

    pub fn version(&self) -> u64 {
        self.slice.version()
    }

    pub fn subscribe(&self, listener: impl Fn(&CalibrationState) + Send + Sync + 'static) {
        self.slice.subscribe(listener);
    }

    pub(crate) fn merge_remote(&self, fields: &Map<String, Value>) {
        self.slice.update(|state| {
            for (key, value) in fields {
                match key.as_str() {
                    "u1" => apply("calibration", key, value.as_f64(), &mut state.u1),
                    "u2" => apply("calibration", key, value.as_f64(), &mut state.u2),
                    "a1" => apply("calibration", key, value.as_f64(), &mut state.a1),
                    "a2" => apply("calibration", key, value.as_f64(), &mut state.a2),
                    "offset" => apply("calibration", key, value.as_f64(), &mut state.offset),
                    _ => warn!(key, "unknown calibration field"),
                }
            }
        });
    }
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self::new()
    }
}
