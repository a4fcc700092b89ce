use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::subscription::{Subscription, SubscriptionToken};

type Subscriber<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// Tokens are unique across every storage in the process.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

struct Entry<V> {
    token: SubscriptionToken,
    active: Arc<AtomicBool>,
    callback: Subscriber<V>,
}

/// Thread-safe holder of a single state value and its subscribers.
///
/// `Storage` is a shared handle: clones point at the same value, and the value
/// is dropped once the last handle goes away.
///
/// Every write goes through a closure that runs while the value lock is held.
/// Subscribers are invoked after the lock is released, on the thread that
/// performed the write, with the value produced by that write.
///
/// # Examples
///
/// ```
/// use weir::Storage;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let storage = Storage::new(0);
/// let seen = Arc::new(AtomicUsize::new(0));
/// let seen_clone = seen.clone();
///
/// let token = storage.subscribe(move |value: &i32| {
///     seen_clone.store(*value as usize, Ordering::SeqCst);
/// });
///
/// storage.update(|value| *value += 5);
/// assert_eq!(storage.read(), 5);
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
///
/// storage.unsubscribe(token);
/// ```
pub struct Storage<V> {
    shared: Arc<Shared<V>>,
}

struct Shared<V> {
    value: Mutex<V>,
    subscribers: Mutex<Vec<Entry<V>>>,
}

impl<V> Storage<V> {
    /// Create a new storage holding `initial`.
    pub fn new(initial: V) -> Self {
        Self {
            shared: Arc::new(Shared {
                value: Mutex::new(initial),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Read the value with a function without cloning.
    ///
    /// The lock is held while `f` runs, so keep it short and never write to
    /// the same storage from inside it.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        let value = self.shared.value.lock();
        f(&value)
    }

    /// Register a callback for every value published after this call.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionToken
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.shared.subscribe(Arc::new(callback))
    }

    /// Remove a subscriber. Returns `false` if the token was unknown or
    /// already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.shared.unsubscribe(token)
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.lock().len()
    }

    /// Whether both handles point at the same underlying value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Number of live handles sharing this storage.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.shared)
    }

    fn has_subscribers(&self) -> bool {
        !self.shared.subscribers.lock().is_empty()
    }

    fn notify(&self, value: &V) {
        // Copy the list out so callbacks may subscribe, unsubscribe or write.
        // Entries removed mid-round are skipped through their active flag.
        let subscribers: Vec<(Arc<AtomicBool>, Subscriber<V>)> = self
            .shared
            .subscribers
            .lock()
            .iter()
            .map(|entry| (Arc::clone(&entry.active), Arc::clone(&entry.callback)))
            .collect();
        tracing::trace!(subscribers = subscribers.len(), "notifying");
        for (active, subscriber) in subscribers {
            if active.load(Ordering::Acquire) {
                subscriber(value);
            }
        }
    }
}

impl<V> Shared<V> {
    fn subscribe(&self, callback: Subscriber<V>) -> SubscriptionToken {
        let token = SubscriptionToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push(Entry {
            token,
            active: Arc::new(AtomicBool::new(true)),
            callback,
        });
        tracing::trace!(token = token.0, "subscriber added");
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(index) = subscribers.iter().position(|entry| entry.token == token) else {
            return false;
        };
        let entry = subscribers.remove(index);
        entry.active.store(false, Ordering::Release);
        tracing::trace!(token = token.0, "subscriber removed");
        true
    }
}

impl<V: Clone> Storage<V> {
    /// Get a snapshot of the current value.
    pub fn read(&self) -> V {
        self.shared.value.lock().clone()
    }

    /// Apply `f` to the live value, then notify subscribers.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut V),
    {
        let snapshot = {
            let mut value = self.shared.value.lock();
            f(&mut value);
            self.snapshot(&value)
        };
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
    }

    /// Apply a fallible edit in place.
    ///
    /// On `Err` the lock is released, no subscriber is notified and the error
    /// is returned. Edits made before the failure are kept; use
    /// [`transact`](Self::transact) to discard them.
    pub fn try_update<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut V) -> Result<(), E>,
    {
        let snapshot = {
            let mut value = self.shared.value.lock();
            f(&mut value)?;
            self.snapshot(&value)
        };
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
        Ok(())
    }

    /// Apply a fallible edit to a copy of the value and swap it in only if the
    /// edit succeeds. A failed edit leaves the stored value untouched.
    pub fn transact<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut V) -> Result<(), E>,
    {
        let snapshot = {
            let mut value = self.shared.value.lock();
            let mut draft = value.clone();
            f(&mut draft)?;
            *value = draft;
            self.snapshot(&value)
        };
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
        Ok(())
    }

    fn snapshot(&self, value: &V) -> Option<V> {
        self.has_subscribers().then(|| value.clone())
    }
}

impl<V: Send + 'static> Storage<V> {
    /// Subscribe for as long as the returned guard is alive.
    ///
    /// The guard only holds a weak reference, so it never keeps the storage
    /// alive on its own.
    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        let token = self.shared.subscribe(Arc::new(callback));
        let weak = Arc::downgrade(&self.shared);
        Subscription::new(token, move |token| {
            if let Some(shared) = weak.upgrade() {
                shared.unsubscribe(token);
            }
        })
    }
}

impl<V> Clone for Storage<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V: Default> Default for Storage<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Storage<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("value", &*self.shared.value.lock())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Clone, Debug, PartialEq, Default)]
    struct Counter {
        value: usize,
        writes: usize,
    }

    fn recorder<V: Clone + Send + 'static>() -> (Arc<Mutex<Vec<V>>>, impl Fn(&V) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        (seen, move |v: &V| seen_clone.lock().push(v.clone()))
    }

    #[test]
    fn read_your_write() {
        let storage = Storage::new(Counter::default());
        storage.update(|c| c.value = 7);
        assert_eq!(storage.read().value, 7);
        assert_eq!(storage.with(|c| c.value), 7);
    }

    #[test]
    fn subscriber_sees_each_post_update_value_in_order() {
        let storage = Storage::new(0);
        let (seen, callback) = recorder::<i32>();
        storage.subscribe(callback);

        for _ in 0..5 {
            storage.update(|v| *v += 1);
        }

        assert_eq!(*seen.lock(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn subscriber_does_not_receive_value_at_registration() {
        let storage = Storage::new(10);
        let (seen, callback) = recorder::<i32>();
        storage.subscribe(callback);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn unsubscribe_stops_delivery_and_is_idempotent() {
        let storage = Storage::new(0);
        let (seen, callback) = recorder::<i32>();
        let token = storage.subscribe(callback);

        storage.update(|v| *v = 1);
        assert!(storage.unsubscribe(token));
        storage.update(|v| *v = 2);

        assert_eq!(*seen.lock(), vec![1]);
        assert!(!storage.unsubscribe(token));
        assert_eq!(storage.subscriber_count(), 0);
    }

    #[test]
    fn unknown_token_is_a_noop() {
        let storage = Storage::new(0);
        let other = Storage::new(0);
        let token = other.subscribe(|_| {});
        storage.subscribe(|_| {});
        assert!(!storage.unsubscribe(token));
        assert_eq!(storage.subscriber_count(), 1);
    }

    #[test]
    fn subscriber_removed_mid_round_is_skipped() {
        let storage = Storage::new(0);
        let (seen, callback) = recorder::<i32>();
        let victim = Arc::new(Mutex::new(None));

        let handle = storage.clone();
        let victim_clone = Arc::clone(&victim);
        storage.subscribe(move |_| {
            if let Some(token) = victim_clone.lock().take() {
                assert!(handle.unsubscribe(token));
            }
        });
        *victim.lock() = Some(storage.subscribe(callback));

        storage.update(|v| *v = 1);
        storage.update(|v| *v = 2);

        assert!(seen.lock().is_empty());
        assert_eq!(storage.subscriber_count(), 1);
    }

    #[test]
    fn dropped_guard_is_skipped_in_the_same_round() {
        let storage = Storage::new(0);
        let (seen, callback) = recorder::<i32>();
        let guard = Arc::new(Mutex::new(None::<Subscription>));

        let guard_clone = Arc::clone(&guard);
        storage.subscribe(move |_| {
            guard_clone.lock().take();
        });
        *guard.lock() = Some(storage.watch(callback));

        storage.update(|v| *v = 1);

        assert!(seen.lock().is_empty());
        assert_eq!(storage.subscriber_count(), 1);
    }

    #[test]
    fn tokens_are_unique_across_storages() {
        let a = Storage::new(0);
        let b = Storage::new(0);
        let token_a = a.subscribe(|_| {});
        let token_b = b.subscribe(|_| {});

        assert_ne!(token_a, token_b);
        assert!(!b.unsubscribe(token_a));
        assert_eq!(b.subscriber_count(), 1);
        assert!(a.unsubscribe(token_a));
    }

    #[test]
    fn failed_try_update_does_not_notify() {
        let storage = Storage::new(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        storage.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let result: Result<(), &str> = storage.try_update(|v| {
            *v = 3;
            Err("nope")
        });

        assert_eq!(result, Err("nope"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // In-place edits survive the failure.
        assert_eq!(storage.read(), 3);
    }

    #[test]
    fn failed_transact_keeps_previous_value() {
        let storage = Storage::new(vec![1, 2]);
        let result: Result<(), String> = storage.transact(|v| {
            v.push(3);
            Err("rejected".to_string())
        });
        assert!(result.is_err());
        assert_eq!(storage.read(), vec![1, 2]);

        storage.transact::<_, String>(|v| {
            v.push(3);
            Ok(())
        })
        .unwrap();
        assert_eq!(storage.read(), vec![1, 2, 3]);
    }

    #[test]
    fn subscriber_can_write_back_without_deadlock() {
        let storage = Storage::new(0);
        let writer = storage.clone();
        storage.subscribe(move |v: &i32| {
            if *v == 1 {
                writer.update(|v| *v = 2);
            }
        });

        storage.update(|v| *v = 1);
        assert_eq!(storage.read(), 2);
    }

    #[test]
    fn subscriber_can_unsubscribe_itself() {
        let storage = Storage::new(0);
        let token_slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let handle = storage.clone();
        let slot = Arc::clone(&token_slot);
        let calls_clone = Arc::clone(&calls);
        let token = storage.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = *slot.lock() {
                handle.unsubscribe(token);
            }
        });
        *token_slot.lock() = Some(token);

        storage.update(|v| *v += 1);
        storage.update(|v| *v += 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn watch_guard_unsubscribes_on_drop() {
        let storage = Storage::new(0);
        let (seen, callback) = recorder::<i32>();

        let guard = storage.watch(callback);
        storage.update(|v| *v = 1);
        drop(guard);
        storage.update(|v| *v = 2);

        assert_eq!(*seen.lock(), vec![1]);
        assert_eq!(storage.subscriber_count(), 0);
    }

    #[test]
    fn watch_guard_outliving_storage_is_harmless() {
        let storage = Storage::new(0);
        let guard = storage.watch(|_| {});
        drop(storage);
        drop(guard);
    }

    #[test]
    fn concurrent_updates_are_serialized() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let storage = Storage::new(Counter::default());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let storage = storage.clone();
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        storage.update(|c| {
                            let next = c.value + 1;
                            thread::yield_now();
                            c.value = next;
                            c.writes += 1;
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let final_state = storage.read();
        assert_eq!(final_state.value, THREADS * PER_THREAD);
        assert_eq!(final_state.writes, THREADS * PER_THREAD);
    }
}
