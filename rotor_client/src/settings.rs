use serde_json::{Map, Value};
use tracing::warn;

use crate::merge::apply;
use crate::slice::Slice;

/// Device identity and capability bag, merged from SETTINGS broadcasts.
/// The controller reports rssi as a string, so it stays one here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceSettings {
    pub version: String,
    pub esp_id: String,
    pub ssid: String,
    pub rssi: String,
    pub has_screen: bool,
    pub use_screen: bool,
    pub md5: String,
}

pub struct SettingsStore {
    slice: Slice<DeviceSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self { slice: Slice::default() }
    }

    pub fn get(&self) -> DeviceSettings {
        self.slice.get()
    }

    pub fn version(&self) -> u64 {
        self.slice.version()
    }

    pub fn subscribe(&self, listener: impl Fn(&DeviceSettings) + Send + Sync + 'static) {
        self.slice.subscribe(listener);
    }

    pub(crate) fn merge_remote(&self, fields: &Map<String, Value>) {
        self.slice.update(|state| {
            for (key, value) in fields {
                let as_string = || value.as_str().map(str::to_string);
                match key.as_str() {
                    "version" => apply("settings", key, as_string(), &mut state.version),
                    "espID" => apply("settings", key, as_string(), &mut state.esp_id),
                    "ssid" => apply("settings", key, as_string(), &mut state.ssid),
                    "rssi" => apply("settings", key, as_string(), &mut state.rssi),
                    "hasScreen" => apply("settings", key, value.as_bool(), &mut state.has_screen),
                    "useScreen" => apply("settings", key, value.as_bool(), &mut state.use_screen),
                    "md5" => apply("settings", key, as_string(), &mut state.md5),
                    _ => warn!(key, "unknown settings field"),
                }
            }
        });
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
