//! Bookkeeping for child stores owned by a parent store.

mod key;
mod registry;

pub use key::StoreKey;
pub use registry::{Registrable, RegistrationToken, StoreRegistry};
