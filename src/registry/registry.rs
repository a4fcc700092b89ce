use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::key::StoreKey;
use crate::error::{Result, StoreError};

/// A store handle that can be kept in a [`StoreRegistry`].
///
/// Implemented by [`Store`](crate::Store) and [`ScopedStore`](crate::ScopedStore).
pub trait Registrable: Clone + Send + Sync + 'static {
    type State: 'static;
    type Operations: 'static;

    fn key(suffix: Option<&str>) -> StoreKey {
        StoreKey::of::<Self::State, Self::Operations>(suffix)
    }
}

/// Type-erased view of a registered handle.
trait ErasedStore: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<H: Registrable> ErasedStore for H {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<H>()
    }
}

struct Entry {
    id: u64,
    handle: Box<dyn ErasedStore>,
}

#[derive(Default)]
struct RegistryInner {
    entries: Mutex<HashMap<StoreKey, Entry>>,
    next_id: AtomicU64,
}

/// Keyed collection of child stores.
///
/// Handles are recovered with their concrete type checked, so asking for the
/// wrong kind of store is an error rather than a bad cast. A registry owns the
/// handles it holds; registering a store inside one of its own descendants
/// creates a cycle that is never freed.
#[derive(Clone, Default)]
pub struct StoreRegistry {
    inner: Arc<RegistryInner>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under the key derived from its types and `suffix`.
    pub fn register<H: Registrable>(
        &self,
        handle: H,
        suffix: Option<&str>,
    ) -> Result<RegistrationToken> {
        let key = H::key(suffix);
        let mut entries = self.inner.entries.lock();
        if entries.contains_key(&key) {
            return Err(StoreError::AlreadyRegistered { key });
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        entries.insert(
            key.clone(),
            Entry {
                id,
                handle: Box::new(handle),
            },
        );
        tracing::debug!(%key, "store registered");

        Ok(RegistrationToken {
            key,
            id,
            registry: Arc::downgrade(&self.inner),
        })
    }

    /// Get a clone of the handle registered under `H`'s key.
    pub fn get<H: Registrable>(&self, suffix: Option<&str>) -> Result<H> {
        let key = H::key(suffix);
        let entries = self.inner.entries.lock();
        let entry = match entries.get(&key) {
            Some(entry) => entry,
            None => return Err(StoreError::NotRegistered { key }),
        };
        match entry.handle.as_any().downcast_ref::<H>() {
            Some(handle) => Ok(handle.clone()),
            None => Err(StoreError::TypeMismatch {
                expected: std::any::type_name::<H>(),
                found: entry.handle.type_name(),
                key,
            }),
        }
    }

    pub fn contains(&self, key: &StoreKey) -> bool {
        self.inner.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<StoreKey> {
        let mut keys: Vec<_> = self.inner.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Proof of one registration. [`unregister`](Self::unregister) consumes it,
/// so it can remove its entry at most once.
#[derive(Debug)]
pub struct RegistrationToken {
    key: StoreKey,
    id: u64,
    registry: Weak<RegistryInner>,
}

impl RegistrationToken {
    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    /// Remove the entry this token created.
    ///
    /// Returns `false` if the registry is gone or the entry was already
    /// replaced by a later registration under the same key.
    pub fn unregister(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut entries = registry.entries.lock();
        let owned = entries
            .get(&self.key)
            .is_some_and(|entry| entry.id == self.id);
        if owned {
            entries.remove(&self.key);
            tracing::debug!(key = %self.key, "store unregistered");
        }
        owned
    }
}
