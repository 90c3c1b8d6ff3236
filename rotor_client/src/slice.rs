use std::sync::{Arc, Mutex};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Observable state cell, one per entity slice.
///
/// Listeners run synchronously on every mutation. No lock is held while
/// they run, so a listener may call `get()`, `subscribe()` or mutate
/// slices (this one included) from inside its own callback; it only has
/// to converge instead of mutating unconditionally.
pub struct Slice<T> {
    value: Mutex<Versioned<T>>,
    listeners: Mutex<Vec<Listener<T>>>,
}

struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T: Clone> Slice<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(Versioned { value, version: 0 }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.read(|value| value.clone())
    }

    /// Monotonic counter, bumped on every mutation.
    pub fn version(&self) -> u64 {
        lock_or_recover(&self.value).version
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) {
        lock_or_recover(&self.listeners).push(Arc::new(listener));
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&lock_or_recover(&self.value).value)
    }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let (result, snapshot) = {
            let mut guard = lock_or_recover(&self.value);
            let result = f(&mut guard.value);
            guard.version += 1;
            (result, guard.value.clone())
        };
        self.notify(&snapshot);
        result
    }

    /// Like `update`, but only bumps the version and notifies when the
    /// closure reports an actual mutation.
    pub(crate) fn try_update(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        let snapshot = {
            let mut guard = lock_or_recover(&self.value);
            if !f(&mut guard.value) {
                return false;
            }
            guard.version += 1;
            guard.value.clone()
        };
        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &T) {
        // Clone the registry out so a callback re-entering this slice
        // does not meet its own held lock.
        let listeners: Vec<Listener<T>> = lock_or_recover(&self.listeners).clone();
        for listener in &listeners {
            listener(snapshot);
        }
    }
}

impl<T: Clone + Default> Default for Slice<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// A poisoned lock only means a listener panicked mid-notify; the slice
// value itself is still consistent, so keep going with it.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
