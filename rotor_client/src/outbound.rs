use rotor_protocol::{
    CalibrationCmd, Favorite, Identifier, LockMsg, Rotation, RotationCmd, ScreenCmd, SpeedCmd,
    TargetCmd,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// Fire-and-forget sender for outbound frames.
///
/// No acknowledgment, retry or timeout is tracked per frame:
/// confirmation of effect arrives later as a controller broadcast that
/// the router merges back into the same store.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbound {
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }

    fn send<T: Serialize + ?Sized>(&self, identifier: Identifier, payload: &T) {
        match rotor_protocol::encode(identifier, payload) {
            Ok(frame) => {
                let _ = self.tx.send(frame);
            }
            Err(e) => warn!(%identifier, error = %e, "failed to encode outbound frame"),
        }
    }

    pub(crate) fn send_raw(&self, identifier: Identifier, payload: &str) {
        let _ = self.tx.send(rotor_protocol::encode_raw(identifier, payload));
    }

    pub fn send_rotation(&self, rotation: Rotation) {
        self.send(Identifier::Rotor, &RotationCmd { rotation });
    }

    pub fn send_speed(&self, speed: u8) {
        self.send(Identifier::Rotor, &SpeedCmd { speed });
    }

    pub fn send_target(&self, target: f64, use_overlap: bool, use_smooth_speed: bool) {
        self.send(
            Identifier::Rotor,
            &TargetCmd { target, use_overlap, use_smooth_speed },
        );
    }

    pub fn send_calibration(&self, a1: f64, u1: f64, a2: f64, u2: f64) {
        self.send(Identifier::Calibration, &CalibrationCmd { a1, u1, a2, u2 });
    }

    pub fn send_screen(&self, use_screen: bool) {
        self.send(Identifier::Settings, &ScreenCmd { use_screen });
    }

    pub fn send_favorites(&self, entries: &[Favorite]) {
        self.send(Identifier::Favorites, entries);
    }

    pub fn send_lock(&self, msg: &LockMsg) {
        self.send(Identifier::Lock, msg);
    }
}
