use std::any::type_name;
use std::fmt;

/// Stable key for a child store: its state and operations types, plus an
/// optional caller-chosen suffix to tell apart several stores of one type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn of<S: ?Sized, O: ?Sized>(suffix: Option<&str>) -> Self {
        let mut key = format!("{}/{}", type_name::<S>(), type_name::<O>());
        if let Some(suffix) = suffix {
            key.push('#');
            key.push_str(suffix);
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
