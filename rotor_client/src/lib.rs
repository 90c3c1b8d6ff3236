//! Client-side synchronization core for an antenna-rotor controller.
//!
//! The controller is the authoritative source of truth; this crate
//! keeps a local mirror of its state over one long-lived websocket,
//! applies optimistic local mutations and reconciles them against the
//! controller's broadcasts. No rendering, no transport security, no
//! device-side logic.

mod calibration;
mod client;
mod connection;
mod error;
mod favorites;
mod lock;
mod merge;
mod ordering;
mod outbound;
mod persist;
mod rotor;
mod router;
mod settings;
mod slice;

pub use crate::calibration::{CalibrationState, CalibrationStore};
pub use crate::client::RotorClient;
pub use crate::connection::{ConnectionConfig, LinkState, LIVENESS_TIMEOUT, RECONNECT_DELAY};
pub use crate::error::DispatchError;
pub use crate::favorites::{FavoritesList, FavoritesStore};
pub use crate::lock::{LockState, LockStore, IDENTITY_KEY};
pub use crate::ordering::SortKey;
pub use crate::outbound::Outbound;
pub use crate::persist::{KeyValueStore, MemoryStore};
pub use crate::rotor::{RotorState, RotorStore};
pub use crate::router::Router;
pub use crate::settings::{DeviceSettings, SettingsStore};
pub use crate::slice::Slice;

pub use rotor_protocol::{Favorite, Identifier, LockMsg, Rotation, MAX_FAVORITES};
