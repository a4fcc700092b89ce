//! Accessor pairs projecting a sub-state out of a parent state.

mod lens;

pub use lens::Lens;
