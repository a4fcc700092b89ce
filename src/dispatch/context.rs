use std::sync::Arc;

use super::action::Action;
use super::mutation::Mutation;
use crate::error::StoreError;

/// What a running action needs from the store it was dispatched on.
///
/// Implemented by root and scoped stores; the context only ever sees this
/// trait, so scoped actions cannot reach past their projection.
pub(crate) trait Backend<S, O>: Send + Sync {
    fn operations(&self) -> &O;
    fn apply(&self, mutation: Mutation<S>) -> Result<(), StoreError>;
    fn name(&self) -> &str;
}

/// The capability handed to a running action.
///
/// It can commit mutations and dispatch further actions against the store
/// the action was dispatched on, and nothing else.
pub struct DispatchContext<S, O> {
    backend: Arc<dyn Backend<S, O>>,
}

impl<S, O> DispatchContext<S, O> {
    pub(crate) fn new(backend: Arc<dyn Backend<S, O>>) -> Self {
        Self { backend }
    }

    /// Apply a mutation selected from the operations value.
    pub fn commit<F>(&self, select: F) -> Result<(), StoreError>
    where
        F: FnOnce(&O) -> Mutation<S>,
    {
        let mutation = select(self.backend.operations());
        self.backend.apply(mutation)
    }

    /// Dispatch a mutation or an action selected from the operations value.
    ///
    /// Mutations yield `Result<(), StoreError>`; actions yield their own result.
    pub fn dispatch<D, F>(&self, select: F) -> D::Output
    where
        D: Dispatchable<S, O>,
        F: FnOnce(&O) -> D,
    {
        let dispatchable = select(self.backend.operations());
        dispatchable.dispatch_with(self)
    }

    pub(crate) fn store_name(&self) -> &str {
        self.backend.name()
    }
}

impl<S, O> Clone for DispatchContext<S, O> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<S, O> std::fmt::Debug for DispatchContext<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("store", &self.backend.name())
            .finish()
    }
}

mod sealed {
    pub trait Sealed {}

    impl<S> Sealed for super::Mutation<S> {}
    impl<S, O, R> Sealed for super::Action<S, O, R> {}
}

/// Something a store can dispatch: a [`Mutation`] or an [`Action`].
pub trait Dispatchable<S, O>: sealed::Sealed {
    type Output;

    #[doc(hidden)]
    fn dispatch_with(self, context: &DispatchContext<S, O>) -> Self::Output;
}

impl<S, O> Dispatchable<S, O> for Mutation<S> {
    type Output = Result<(), StoreError>;

    fn dispatch_with(self, context: &DispatchContext<S, O>) -> Self::Output {
        context.backend.apply(self)
    }
}

impl<S, O, R> Dispatchable<S, O> for Action<S, O, R> {
    type Output = R;

    fn dispatch_with(self, context: &DispatchContext<S, O>) -> Self::Output {
        self.run(context.clone())
    }
}
