use std::sync::Arc;

use super::report;
use crate::config::short_type_name;
use crate::dispatch::{Backend, DispatchContext, Dispatchable, Edit, Mutation, Operations};
use crate::error::{BoxError, Result, StoreError};
use crate::lens::Lens;
use crate::registry::Registrable;
use crate::storage::{Storage, Subscription, SubscriptionToken};

/// A store over one part of a root store's state.
///
/// A scoped store owns no state. It reads and writes the root storage through
/// a [`Lens`], so its reads are never stale and every scoped write is a single
/// atomic update of the root value. Actions dispatched here get a
/// [`DispatchContext`] over the projected state only.
pub struct ScopedStore<R, S, O> {
    inner: Arc<ScopedInner<R, S, O>>,
}

struct ScopedInner<R, S, O> {
    storage: Storage<R>,
    lens: Lens<R, S>,
    operations: O,
    name: String,
}

impl<R, S, O> ScopedStore<R, S, O>
where
    R: Clone + Send + 'static,
    S: Send + 'static,
    O: Operations<State = S>,
{
    pub(crate) fn new(storage: Storage<R>, lens: Lens<R, S>, operations: O, name: String) -> Self {
        tracing::debug!(store = %name, "scoped store created");
        Self {
            inner: Arc::new(ScopedInner {
                storage,
                lens,
                operations,
                name,
            }),
        }
    }

    /// Project the current root state.
    pub fn state(&self) -> S {
        let lens = &self.inner.lens;
        self.inner.storage.with(|root| lens.get(root))
    }

    /// Run `f` on a projected copy of the state.
    ///
    /// Unlike [`Store::with_state`](crate::Store::with_state) this clones
    /// through [`state`](Self::state), so the lock is already released when
    /// `f` runs.
    pub fn with_state<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        f(&self.state())
    }

    /// Dispatch a mutation or an action against the projected state.
    pub fn dispatch<D, F>(&self, select: F) -> D::Output
    where
        D: Dispatchable<S, O>,
        F: FnOnce(&O) -> D,
    {
        self.context().dispatch(select)
    }

    pub fn commit<F>(&self, select: F) -> Result<()>
    where
        F: FnOnce(&O) -> Mutation<S>,
    {
        self.inner.apply(select(&self.inner.operations))
    }

    /// Subscribe to root updates, receiving the projected state.
    ///
    /// The callback fires on every root update, including ones that left this
    /// projection unchanged.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionToken
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let lens = self.inner.lens.clone();
        self.inner
            .storage
            .subscribe(move |root: &R| callback(&lens.get(root)))
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.storage.unsubscribe(token)
    }

    pub fn watch<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let lens = self.inner.lens.clone();
        self.inner
            .storage
            .watch(move |root: &R| callback(&lens.get(root)))
    }

    /// Narrow further. The new store still shares the root storage.
    pub fn scope<T, P>(&self, lens: Lens<S, T>, operations: P) -> ScopedStore<R, T, P>
    where
        T: Send + 'static,
        P: Operations<State = T>,
    {
        let name = format!("{}.{}", self.inner.name, short_type_name::<T>());
        ScopedStore::new(
            self.inner.storage.clone(),
            self.inner.lens.then(lens),
            operations,
            name,
        )
    }

    fn context(&self) -> DispatchContext<S, O> {
        let backend: Arc<dyn Backend<S, O>> = self.inner.clone();
        DispatchContext::new(backend)
    }
}

impl<R, S, O> ScopedStore<R, S, O> {
    /// The root storage this store projects from.
    pub fn storage(&self) -> &Storage<R> {
        &self.inner.storage
    }

    pub fn lens(&self) -> &Lens<R, S> {
        &self.inner.lens
    }

    pub fn operations(&self) -> &O {
        &self.inner.operations
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<R, S, O> Backend<S, O> for ScopedInner<R, S, O>
where
    R: Clone + Send + 'static,
    S: Send + 'static,
    O: Operations<State = S>,
{
    fn operations(&self) -> &O {
        &self.operations
    }

    fn apply(&self, mutation: Mutation<S>) -> std::result::Result<(), StoreError> {
        let (mutation, edit) = mutation.into_edit();
        tracing::debug!(store = %self.name, mutation, "commit");
        let lens = &self.lens;
        let result: Result<(), BoxError> = match edit {
            Edit::Infallible(edit) => {
                self.storage.update(|root| lens.modify(root, edit));
                Ok(())
            }
            // The edit runs on a projected copy, so a failure never reaches
            // the root value.
            Edit::Fallible(edit) => self.storage.try_update(|root| {
                let mut focus = lens.get(root);
                edit(&mut focus)?;
                lens.set(root, focus);
                Ok(())
            }),
        };
        report(&self.name, mutation, result)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<R, S, O> Registrable for ScopedStore<R, S, O>
where
    R: Send + 'static,
    S: Send + 'static,
    O: Operations<State = S>,
{
    type State = S;
    type Operations = O;
}

impl<R, S, O> Clone for ScopedStore<R, S, O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, S, O> std::fmt::Debug for ScopedStore<R, S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore")
            .field("name", &self.inner.name)
            .field("lens", &self.inner.lens)
            .finish_non_exhaustive()
    }
}
