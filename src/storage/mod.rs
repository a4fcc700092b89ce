//! Shared, lock-protected state with change notification.
//!
//! A [`Storage`] is the single writable copy of a state tree. Root and scoped
//! stores all read and write through the same storage handle.

mod storage;
mod subscription;

pub use storage::Storage;
pub use subscription::{Subscription, SubscriptionToken};
