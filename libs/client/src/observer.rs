//! Observer registry with handle-scoped registration.
//!
//! Callbacks are held strongly and keyed by a token; registration returns an
//! [`ObserverHandle`] that unregisters on drop, so an observer can never
//! outlive its owner or be dispatched to after release. The observer list has
//! its own short lock, distinct from any lock guarding the data being
//! observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Inner<E> {
    observers: Mutex<HashMap<u64, Callback<E>>>,
    next_token: AtomicU64,
}

/// Multi-observer dispatch for change events of type `E`.
pub struct ObserverRegistry<E> {
    inner: Arc<Inner<E>>,
}

impl<E> ObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                observers: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(1),
            }),
        }
    }

    /// Register a callback. Dropping the returned handle unregisters it.
    pub fn register<F>(&self, callback: F) -> ObserverHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
        E: 'static,
    {
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().insert(token, Arc::new(callback));

        let weak: Weak<Inner<E>> = Arc::downgrade(&self.inner);
        ObserverHandle {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.observers.lock().remove(&token);
                }
            })),
        }
    }

    /// Dispatch an event to every registered observer.
    ///
    /// The list is copied out under the lock; callbacks run without it, so an
    /// observer may re-register or release itself during dispatch.
    pub fn notify(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self.inner.observers.lock().values().cloned().collect();
        for callback in callbacks {
            callback(event);
        }
    }

    /// Drop every registration. Outstanding handles become no-ops.
    pub fn remove_all(&self) {
        self.inner.observers.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.observers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped registration token. Unregisters its observer when dropped.
pub struct ObserverHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ObserverHandle {
    /// Unregister explicitly, before the handle goes out of scope.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
