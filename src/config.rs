//! Store configuration.

use serde::{Deserialize, Serialize};

/// Options applied when constructing a root [`Store`](crate::Store).
///
/// Deserializable so applications can keep store settings next to the rest of
/// their configuration (missing fields take their defaults).
///
/// ```
/// use weir::StoreConfig;
///
/// let config = StoreConfig::default().with_name("app");
/// assert_eq!(config.name.as_deref(), Some("app"));
/// assert!(config.rollback_failed_mutations);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label attached to log events. Defaults to the state type name.
    pub name: Option<String>,
    /// Run fallible root mutations against a scratch copy and only swap it in
    /// on success. When disabled, a failing mutation may leave partial edits
    /// behind (no notification fires either way).
    pub rollback_failed_mutations: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: None,
            rollback_failed_mutations: true,
        }
    }
}

impl StoreConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_failed_mutations = enabled;
        self
    }

    pub(crate) fn resolved_name<S>(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| short_type_name::<S>().to_string())
    }
}

/// Last path segment of a type name, generics included.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}
