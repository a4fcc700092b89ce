use std::sync::Arc;

use super::report;
use super::scoped::ScopedStore;
use crate::config::{short_type_name, StoreConfig};
use crate::dispatch::{Backend, DispatchContext, Dispatchable, Edit, Mutation, Operations};
use crate::error::{Result, StoreError};
use crate::lens::Lens;
use crate::registry::{Registrable, RegistrationToken, StoreRegistry};
use crate::storage::{Storage, Subscription, SubscriptionToken};

/// The root of a state tree.
///
/// A store owns the single [`Storage`] for its state and the operations value
/// that builds mutations and actions for it. Handles are cheap to clone and
/// all clones share the same storage.
///
/// # Examples
///
/// ```
/// use weir::{lens, Mutation, Operations, Store};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct AppState { count: i32, name: String }
///
/// struct AppOps;
/// impl Operations for AppOps { type State = AppState; }
/// impl AppOps {
///     fn rename(&self, name: &str) -> Mutation<AppState> {
///         let name = name.to_string();
///         Mutation::new("rename", move |s: &mut AppState| s.name = name)
///     }
/// }
///
/// struct CountOps;
/// impl Operations for CountOps { type State = i32; }
/// impl CountOps {
///     fn increment(&self) -> Mutation<i32> {
///         Mutation::new("increment", |n: &mut i32| *n += 1)
///     }
/// }
///
/// let store = Store::new(AppState { count: 0, name: "a".into() }, AppOps);
/// let count = store.scope(lens!(AppState => count), CountOps);
///
/// count.dispatch(|ops| ops.increment()).unwrap();
/// store.dispatch(|ops| ops.rename("b")).unwrap();
///
/// assert_eq!(store.state(), AppState { count: 1, name: "b".into() });
/// assert_eq!(count.state(), 1);
/// ```
pub struct Store<S, O> {
    inner: Arc<StoreInner<S, O>>,
}

struct StoreInner<S, O> {
    storage: Storage<S>,
    operations: O,
    config: StoreConfig,
    name: String,
    children: StoreRegistry,
}

impl<S, O> Store<S, O>
where
    S: Clone + Send + 'static,
    O: Operations<State = S>,
{
    /// Create a new store with the given initial state.
    pub fn new(initial: S, operations: O) -> Self {
        Self::with_config(initial, operations, StoreConfig::default())
    }

    pub fn with_config(initial: S, operations: O, config: StoreConfig) -> Self {
        let name = config.resolved_name::<S>();
        tracing::debug!(store = %name, "store created");
        Self {
            inner: Arc::new(StoreInner {
                storage: Storage::new(initial),
                operations,
                config,
                name,
                children: StoreRegistry::new(),
            }),
        }
    }

    /// Get a snapshot of the current state.
    pub fn state(&self) -> S {
        self.inner.storage.read()
    }

    /// Read state without cloning it.
    ///
    /// The storage lock is held while `f` runs, so never dispatch or commit
    /// to this store (or any scope of it) from inside `f`.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.inner.storage.with(f)
    }

    /// Dispatch a mutation or an action built by the operations value.
    ///
    /// A mutation is applied before this returns and yields
    /// `Result<(), StoreError>`. An action runs with a fresh
    /// [`DispatchContext`] bound to this store and yields whatever it returns.
    pub fn dispatch<D, F>(&self, select: F) -> D::Output
    where
        D: Dispatchable<S, O>,
        F: FnOnce(&O) -> D,
    {
        self.context().dispatch(select)
    }

    /// Apply a mutation built by the operations value.
    pub fn commit<F>(&self, select: F) -> Result<()>
    where
        F: FnOnce(&O) -> Mutation<S>,
    {
        self.inner.apply(select(&self.inner.operations))
    }

    /// Subscribe to state changes.
    ///
    /// The callback is called with the new state after every successful
    /// mutation, including mutations committed through scoped stores.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionToken
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.inner.storage.subscribe(callback)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.storage.unsubscribe(token)
    }

    /// Subscribe until the returned guard is dropped.
    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.inner.storage.watch(callback)
    }

    /// Derive a store over the part of the state `lens` focuses on.
    ///
    /// The scoped store shares this store's storage: its writes are visible
    /// here immediately and serialize with writes made here.
    pub fn scope<T, P>(&self, lens: Lens<S, T>, operations: P) -> ScopedStore<S, T, P>
    where
        T: Send + 'static,
        P: Operations<State = T>,
    {
        let name = format!("{}.{}", self.inner.name, short_type_name::<T>());
        ScopedStore::new(self.inner.storage.clone(), lens, operations, name)
    }

    /// Keep `child` in this store's registry.
    pub fn register_child<H: Registrable>(
        &self,
        child: H,
        suffix: Option<&str>,
    ) -> Result<RegistrationToken> {
        self.inner.children.register(child, suffix)
    }

    /// Look up a child registered with [`register_child`](Self::register_child).
    pub fn child<H: Registrable>(&self, suffix: Option<&str>) -> Result<H> {
        self.inner.children.get(suffix)
    }

    fn context(&self) -> DispatchContext<S, O> {
        let backend: Arc<dyn Backend<S, O>> = self.inner.clone();
        DispatchContext::new(backend)
    }
}

impl<S, O> Store<S, O> {
    pub fn storage(&self) -> &Storage<S> {
        &self.inner.storage
    }

    pub fn operations(&self) -> &O {
        &self.inner.operations
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn children(&self) -> &StoreRegistry {
        &self.inner.children
    }
}

impl<S, O> Backend<S, O> for StoreInner<S, O>
where
    S: Clone + Send + 'static,
    O: Operations<State = S>,
{
    fn operations(&self) -> &O {
        &self.operations
    }

    fn apply(&self, mutation: Mutation<S>) -> std::result::Result<(), StoreError> {
        let (mutation, edit) = mutation.into_edit();
        tracing::debug!(store = %self.name, mutation, "commit");
        let result = match edit {
            Edit::Infallible(edit) => {
                self.storage.update(edit);
                Ok(())
            }
            Edit::Fallible(edit) if self.config.rollback_failed_mutations => {
                self.storage.transact(edit)
            }
            Edit::Fallible(edit) => self.storage.try_update(edit),
        };
        report(&self.name, mutation, result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<S, O> Registrable for Store<S, O>
where
    S: Send + 'static,
    O: Operations<State = S>,
{
    type State = S;
    type Operations = O;
}

impl<S, O> Clone for Store<S, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: std::fmt::Debug, O> std::fmt::Debug for Store<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("storage", &self.inner.storage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Action;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, PartialEq, Default)]
    struct AppState {
        count: usize,
        name: String,
        log: Vec<String>,
    }

    struct AppOps;

    impl Operations for AppOps {
        type State = AppState;
    }

    impl AppOps {
        fn increment(&self) -> Mutation<AppState> {
            Mutation::new("increment", |s: &mut AppState| s.count += 1)
        }

        fn rename(&self, name: &str) -> Mutation<AppState> {
            let name = name.to_string();
            Mutation::new("rename", move |s: &mut AppState| s.name = name)
        }

        fn log_then_fail(&self, line: &str) -> Mutation<AppState> {
            let line = line.to_string();
            Mutation::try_new("log_then_fail", move |s: &mut AppState| {
                s.log.push(line);
                Err("log is read-only")
            })
        }

        fn increment_and_report(&self) -> Action<AppState, Self, usize> {
            Action::new("increment_and_report", |ctx: DispatchContext<AppState, Self>| {
                ctx.commit(|ops| ops.increment()).unwrap();
                ctx.dispatch(|ops| ops.increment()).unwrap();
                2
            })
        }

        fn nested(&self) -> Action<AppState, Self, usize> {
            Action::new("nested", |ctx: DispatchContext<AppState, Self>| {
                ctx.dispatch(|ops| ops.increment_and_report()) + 1
            })
        }
    }

    fn new_store() -> Store<AppState, AppOps> {
        Store::new(
            AppState {
                name: "test".to_string(),
                ..Default::default()
            },
            AppOps,
        )
    }

    #[test]
    fn store_dispatch_mutation() {
        let store = new_store();
        store.dispatch(|ops| ops.increment()).unwrap();
        store.commit(|ops| ops.rename("updated")).unwrap();

        assert_eq!(store.state().count, 1);
        assert_eq!(store.state().name, "updated");
        assert_eq!(store.with_state(|s| s.count), 1);
    }

    #[test]
    fn store_dispatch_action_returns_result() {
        let store = new_store();
        assert_eq!(store.dispatch(|ops| ops.nested()), 3);
        assert_eq!(store.state().count, 2);
    }

    #[test]
    fn store_subscribe() {
        let store = new_store();
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        store.subscribe(move |_state| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        store.dispatch(|ops| ops.increment()).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.dispatch(|ops| ops.increment_and_report());
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failed_mutation_rolls_back_by_default() {
        let store = new_store();
        let notified = Arc::new(AtomicUsize::new(0));
        let notified_clone = notified.clone();
        store.subscribe(move |_| {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        let err = store.dispatch(|ops| ops.log_then_fail("x")).unwrap_err();

        assert_eq!(err.mutation_name(), Some("log_then_fail"));
        assert!(store.state().log.is_empty());
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failed_mutation_keeps_partial_edit_without_rollback() {
        let store = Store::with_config(
            AppState::default(),
            AppOps,
            StoreConfig::default().with_rollback(false),
        );
        assert!(store.commit(|ops| ops.log_then_fail("x")).is_err());
        assert_eq!(store.state().log, vec!["x".to_string()]);
    }

    #[test]
    fn clones_share_storage() {
        let store = new_store();
        let other = store.clone();
        other.dispatch(|ops| ops.increment()).unwrap();
        assert_eq!(store.state().count, 1);
        assert!(store.storage().ptr_eq(other.storage()));
    }

    #[test]
    fn name_defaults_to_state_type() {
        assert_eq!(new_store().name(), "AppState");
        let named = Store::with_config(
            AppState::default(),
            AppOps,
            StoreConfig::default().with_name("root"),
        );
        assert_eq!(named.name(), "root");
    }

    #[test]
    fn watch_guard_scopes_subscription() {
        let store = new_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let guard = store.watch(move |s: &AppState| seen_clone.lock().push(s.count));
        store.dispatch(|ops| ops.increment()).unwrap();
        drop(guard);
        store.dispatch(|ops| ops.increment()).unwrap();

        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn children_are_recovered_by_type() {
        let store = new_store();
        let child = Store::new(AppState::default(), AppOps);
        let token = store.register_child(child.clone(), Some("detail")).unwrap();

        let found: Store<AppState, AppOps> = store.child(Some("detail")).unwrap();
        found.dispatch(|ops| ops.increment()).unwrap();
        assert_eq!(child.state().count, 1);
        assert_eq!(store.state().count, 0);

        assert!(token.unregister());
        assert!(store.children().is_empty());
    }
}
