use rotor_protocol::{Favorite, Identifier, MAX_FAVORITES};
use serde_json::Value;
use tracing::error;

use crate::error::DispatchError;
use crate::ordering::{self, SortKey};
use crate::outbound::Outbound;
use crate::slice::Slice;

/// Ordered favorites plus the remembered sort key.
///
/// Invariant: ids are exactly 1..=N (dense, no gaps, no duplicates)
/// immediately after any add or remove, and N never exceeds
/// `MAX_FAVORITES`.
#[derive(Debug, Clone, Default)]
pub struct FavoritesList {
    pub entries: Vec<Favorite>,
    pub sort_key: SortKey,
}

pub struct FavoritesStore {
    slice: Slice<FavoritesList>,
    outbound: Outbound,
}

impl FavoritesStore {
    pub fn new(outbound: Outbound) -> Self {
        Self { slice: Slice::default(), outbound }
    }

    pub fn get(&self) -> FavoritesList {
        self.slice.get()
    }

    pub fn version(&self) -> u64 {
        self.slice.version()
    }

    pub fn subscribe(&self, listener: impl Fn(&FavoritesList) + Send + Sync + 'static) {
        self.slice.subscribe(listener);
    }

    pub fn has_max(&self) -> bool {
        self.slice.read(|list| list.entries.len() >= MAX_FAVORITES)
    }

    /// Append a new favorite and push the full list to the controller.
    /// Returns false without mutating anything when the list is full.
    /// The new id is pre-insertion length + 1, which is dense because
    /// every prior operation keeps ids dense.
    pub fn add(&self, name: &str, angle: f64) -> bool {
        let added = self.slice.try_update(|list| {
            if list.entries.len() >= MAX_FAVORITES {
                return false;
            }
            let id = list.entries.len() as u32 + 1;
            list.entries.push(Favorite { id, name: name.to_string(), angle });
            ordering::sort(&mut list.entries, list.sort_key);
            true
        });
        if added {
            self.send_snapshot();
        }
        added
    }

    /// Remove the entry at `index` (current display order), renumber
    /// the remainder by ascending old id, reapply the remembered sort
    /// and push the full list.
    pub fn remove(&self, index: usize) {
        let removed = self.slice.try_update(|list| {
            if index >= list.entries.len() {
                return false;
            }
            list.entries.remove(index);
            ordering::renumber(&mut list.entries);
            ordering::sort(&mut list.entries, list.sort_key);
            true
        });
        if removed {
            self.send_snapshot();
        }
    }

    /// Re-sort the list in place. With `persist`, the key is remembered
    /// and reapplied after future structural mutations.
    pub fn sort_by(&self, key: SortKey, persist: bool) {
        self.slice.update(|list| {
            ordering::sort(&mut list.entries, key);
            if persist {
                list.sort_key = key;
            }
        });
    }

    /// Push the full current list to the controller.
    pub fn send_snapshot(&self) {
        let entries = self.slice.read(|list| list.entries.clone());
        self.outbound.send_favorites(&entries);
    }

    /// Replace the list wholesale from a FAVORITES broadcast. An
    /// invalid payload resets the local list to empty and asserts the
    /// empty list back to the controller as the recovered canonical
    /// state, rather than attempting a partial repair.
    pub(crate) fn merge_remote(&self, payload: &str) -> Result<(), DispatchError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|source| DispatchError::Payload { identifier: "FAVORITES", source })?;

        match validate(&value) {
            Some(entries) => {
                self.slice.update(|list| {
                    list.entries = entries;
                    ordering::sort(&mut list.entries, list.sort_key);
                });
                Ok(())
            }
            None => {
                error!(payload, "received favorites are not valid, resyncing empty list");
                self.slice.update(|list| list.entries.clear());
                self.outbound.send_raw(Identifier::Favorites, "[]");
                Err(DispatchError::InvalidFavorites(payload.to_string()))
            }
        }
    }
}

/// A valid favorites payload is an array of at most `MAX_FAVORITES`
/// records each carrying id, name and angle.
fn validate(value: &Value) -> Option<Vec<Favorite>> {
    let array = value.as_array()?;
    if array.len() > MAX_FAVORITES {
        return None;
    }
    array
        .iter()
        .map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}
