//! # Weir
//!
//! A small unidirectional-data-flow state store.
//!
//! State lives in one place and only changes through dispatched operations:
//!
//! - [`Storage<V>`] - Thread-safe holder of the live value and its subscribers
//! - [`Mutation<S>`] - A named, synchronous edit of the state
//! - [`Action<S, O, R>`] - Work that commits mutations (now or later) through a
//!   [`DispatchContext`] and returns a result
//! - [`Store<S, O>`] - Owns the storage and the operations value for a state tree
//! - [`ScopedStore<R, S, O>`] - A view over part of the tree, reading and writing
//!   the root storage through a [`Lens`]
//!
//! Every commit against one storage is serialized, whether it comes from the
//! root store or any scoped store derived from it. Subscribers are notified
//! after the lock is released, so they may dispatch again without deadlocking.
//!
//! ```
//! use weir::{Action, DispatchContext, Mutation, Operations, Store};
//!
//! #[derive(Clone, Default)]
//! struct AppState { count: i32 }
//!
//! struct AppOps;
//! impl Operations for AppOps { type State = AppState; }
//!
//! impl AppOps {
//!     fn increment(&self) -> Mutation<AppState> {
//!         Mutation::new("increment", |s: &mut AppState| s.count += 1)
//!     }
//!
//!     fn fetch(&self) -> Action<AppState, Self, ()> {
//!         Action::new("fetch", |ctx: DispatchContext<AppState, Self>| {
//!             std::thread::spawn(move || {
//!                 ctx.dispatch(|ops| ops.increment()).unwrap();
//!             })
//!             .join()
//!             .unwrap();
//!         })
//!     }
//! }
//!
//! let store = Store::new(AppState::default(), AppOps);
//! store.dispatch(|ops| ops.fetch());
//! assert_eq!(store.state().count, 1);
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod lens;
pub mod registry;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use config::StoreConfig;
pub use dispatch::{Action, Command, DispatchContext, Dispatchable, Mutation, Operations};
pub use error::{BoxError, Result, StoreError};
pub use lens::Lens;
pub use registry::{Registrable, RegistrationToken, StoreKey, StoreRegistry};
pub use storage::{Storage, Subscription, SubscriptionToken};
pub use store::{ScopedStore, Store};
