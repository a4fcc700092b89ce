//! Root and scoped stores.
//!
//! A [`Store`] owns the storage of a state tree. A [`ScopedStore`] shares that
//! storage and exposes one part of it through a [`Lens`](crate::Lens).

mod scoped;
mod store;

pub use scoped::ScopedStore;
pub use store::Store;

use crate::error::{BoxError, StoreError};

fn report(
    store: &str,
    mutation: &'static str,
    result: Result<(), BoxError>,
) -> Result<(), StoreError> {
    result.map_err(|source| {
        tracing::warn!(store, mutation, error = %source, "mutation failed");
        StoreError::mutation(mutation, source)
    })
}
