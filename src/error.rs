use thiserror::Error;

use crate::registry::StoreKey;

/// Boxed error produced by a fallible mutation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A fallible mutation refused to apply. The state was not published.
    #[error("mutation `{mutation}` failed: {source}")]
    Mutation {
        mutation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("no store registered under `{key}`")]
    NotRegistered { key: StoreKey },

    #[error("a store is already registered under `{key}`")]
    AlreadyRegistered { key: StoreKey },

    #[error("store under `{key}` is a `{found}`, not a `{expected}`")]
    TypeMismatch {
        key: StoreKey,
        expected: &'static str,
        found: &'static str,
    },
}

impl StoreError {
    pub(crate) fn mutation(mutation: &'static str, source: BoxError) -> Self {
        Self::Mutation { mutation, source }
    }

    /// Name of the mutation that failed, if this is a mutation error.
    pub fn mutation_name(&self) -> Option<&'static str> {
        match self {
            Self::Mutation { mutation, .. } => Some(*mutation),
            _ => None,
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
