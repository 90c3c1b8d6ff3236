use std::sync::Arc;

use rotor_protocol::Identifier;
use serde_json::{Map, Value};

use crate::calibration::CalibrationStore;
use crate::error::DispatchError;
use crate::favorites::FavoritesStore;
use crate::lock::LockStore;
use crate::rotor::RotorStore;
use crate::settings::SettingsStore;

/// The single identifier-to-handler registry. Consumes decoded frames
/// from the connection actor and hands each payload to the store that
/// owns the slice.
#[derive(Clone)]
pub struct Router {
    rotor: Arc<RotorStore>,
    calibration: Arc<CalibrationStore>,
    settings: Arc<SettingsStore>,
    favorites: Arc<FavoritesStore>,
    lock: Arc<LockStore>,
}

impl Router {
    pub fn new(
        rotor: Arc<RotorStore>,
        calibration: Arc<CalibrationStore>,
        settings: Arc<SettingsStore>,
        favorites: Arc<FavoritesStore>,
        lock: Arc<LockStore>,
    ) -> Self {
        Self { rotor, calibration, settings, favorites, lock }
    }

    /// Route one raw frame. Every error class here is recoverable: the
    /// caller logs, drops the frame and keeps the loop alive.
    pub fn dispatch(&self, raw: &str) -> Result<(), DispatchError> {
        let (tag, payload) = rotor_protocol::split(raw)?;
        let identifier = Identifier::from_tag(tag)
            .ok_or_else(|| DispatchError::UnknownIdentifier(tag.to_string()))?;

        match identifier {
            Identifier::Rotor => self.rotor.merge_remote(&fields("ROTOR", payload)?),
            Identifier::Calibration => {
                self.calibration.merge_remote(&fields("CALIBRATION", payload)?)
            }
            Identifier::Settings => self.settings.merge_remote(&fields("SETTINGS", payload)?),
            Identifier::Favorites => self.favorites.merge_remote(payload)?,
            Identifier::Lock => self.lock.merge_remote(&fields("LOCK", payload)?),
            // Reserved for future use, explicitly ignored.
            Identifier::Ui => {}
        }
        Ok(())
    }
}

fn fields(
    identifier: &'static str,
    payload: &str,
) -> Result<Map<String, Value>, DispatchError> {
    serde_json::from_str(payload).map_err(|source| DispatchError::Payload { identifier, source })
}
