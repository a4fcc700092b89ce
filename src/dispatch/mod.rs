//! The dispatch protocol: mutations, actions and the context actions run in.
//!
//! An operations value groups the factories for one state type. Callers pick
//! a mutation or action out of it with a selector closure and hand the result
//! to a store:
//!
//! ```
//! use weir::{Action, DispatchContext, Mutation, Operations, Store};
//!
//! #[derive(Clone, Default)]
//! struct Counter { count: i32 }
//!
//! struct CounterOps;
//!
//! impl Operations for CounterOps {
//!     type State = Counter;
//! }
//!
//! impl CounterOps {
//!     fn increment(&self) -> Mutation<Counter> {
//!         Mutation::new("increment", |s: &mut Counter| s.count += 1)
//!     }
//!
//!     fn increment_twice(&self) -> Action<Counter, Self, i32> {
//!         Action::new("increment_twice", |ctx: DispatchContext<Counter, Self>| {
//!             ctx.commit(|ops| ops.increment()).unwrap();
//!             ctx.commit(|ops| ops.increment()).unwrap();
//!             2
//!         })
//!     }
//! }
//!
//! let store = Store::new(Counter::default(), CounterOps);
//! store.dispatch(|ops| ops.increment()).unwrap();
//! assert_eq!(store.dispatch(|ops| ops.increment_twice()), 2);
//! assert_eq!(store.state().count, 3);
//! ```

mod action;
mod context;
mod mutation;

pub use action::Action;
pub use context::{DispatchContext, Dispatchable};
pub use mutation::{Command, Mutation};

pub(crate) use context::Backend;
pub(crate) use mutation::Edit;

/// Ties an operations value to the one state type it produces edits for.
pub trait Operations: Send + Sync + 'static {
    type State;
}
