use std::sync::Arc;

use rotor_protocol::Rotation;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::calibration::CalibrationStore;
use crate::connection::{self, ConnectionConfig, LinkState};
use crate::favorites::FavoritesStore;
use crate::lock::LockStore;
use crate::outbound::Outbound;
use crate::persist::KeyValueStore;
use crate::rotor::RotorStore;
use crate::router::Router;
use crate::settings::SettingsStore;

/// The assembled synchronization core: one store per entity, one
/// outbound channel, one connection actor. Built once at startup and
/// handed to consumers explicitly; exactly one instance per running
/// client is the intended shape.
pub struct RotorClient {
    pub rotor: Arc<RotorStore>,
    pub calibration: Arc<CalibrationStore>,
    pub settings: Arc<SettingsStore>,
    pub favorites: Arc<FavoritesStore>,
    pub lock: Arc<LockStore>,
    outbound: Outbound,
    link_rx: watch::Receiver<LinkState>,
    task: JoinHandle<()>,
}

impl RotorClient {
    /// Wire everything up and spawn the connection actor. Must be
    /// called from within a tokio runtime.
    pub fn spawn(cfg: ConnectionConfig, persist: Arc<dyn KeyValueStore>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let outbound = Outbound::new(outbound_tx);

        let rotor = Arc::new(RotorStore::new());
        let calibration = Arc::new(CalibrationStore::new());
        let settings = Arc::new(SettingsStore::new());
        let favorites = Arc::new(FavoritesStore::new(outbound.clone()));
        let lock = Arc::new(LockStore::new(outbound.clone(), persist));

        let router = Router::new(
            rotor.clone(),
            calibration.clone(),
            settings.clone(),
            favorites.clone(),
            lock.clone(),
        );

        let (link_tx, link_rx) = watch::channel(LinkState::Disconnected);
        let task = tokio::spawn(connection::run(cfg, outbound_rx, router, link_tx));

        Self { rotor, calibration, settings, favorites, lock, outbound, link_rx, task }
    }

    pub fn link_state(&self) -> LinkState {
        *self.link_rx.borrow()
    }

    /// The "connection lost" signal consumers may poll or watch.
    pub fn connection_lost(&self) -> bool {
        self.link_state().is_lost()
    }

    pub fn watch_link(&self) -> watch::Receiver<LinkState> {
        self.link_rx.clone()
    }

    /// Start or stop manual rotation. Refused (returns false, nothing
    /// sent) while another client holds the lock; the gate is advisory,
    /// the controller remains the arbitration authority.
    pub fn set_rotation(&self, rotation: Rotation) -> bool {
        if self.lock.is_locked_by_else() {
            return false;
        }
        self.outbound.send_rotation(rotation);
        true
    }

    /// Set the max rotation speed (0-100). Applied optimistically to
    /// the local slice, then sent; the controller's echo confirms it.
    pub fn set_speed(&self, speed: u8) -> bool {
        if self.lock.is_locked_by_else() {
            return false;
        }
        let speed = speed.min(100);
        self.rotor.set_speed(speed);
        self.outbound.send_speed(speed);
        true
    }

    /// Request auto-rotation to a target angle.
    pub fn request_target(&self, angle: f64, use_overlap: bool, use_smooth_speed: bool) -> bool {
        if self.lock.is_locked_by_else() {
            return false;
        }
        self.outbound.send_target(angle, use_overlap, use_smooth_speed);
        true
    }

    /// Send a two-point calibration. Not lock-gated; calibration is a
    /// settings concern, not a motion command.
    pub fn send_calibration(&self, a1: f64, u1: f64, a2: f64, u2: f64) {
        self.outbound.send_calibration(a1, u1, a2, u2);
    }

    /// Toggle the controller's OLED screen.
    pub fn set_screen(&self, use_screen: bool) {
        self.outbound.send_screen(use_screen);
    }

    /// Stop the connection actor. Store handles stay readable.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}
