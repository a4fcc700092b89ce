use crate::error::{BoxError, StoreError};

pub(crate) enum Edit<S> {
    Infallible(Box<dyn FnOnce(&mut S)>),
    Fallible(Box<dyn FnOnce(&mut S) -> Result<(), BoxError>>),
}

/// A named, synchronous edit of a state value.
///
/// Mutations are built by an operations value, handed to `dispatch` or
/// `commit`, applied exactly once inside a single locked update, then dropped.
/// The edit only ever sees `&mut S`, so it cannot dispatch anything itself.
///
/// # Examples
///
/// ```
/// use weir::Mutation;
///
/// let mut count = 1;
/// Mutation::new("double", |n: &mut i32| *n *= 2).apply(&mut count).unwrap();
/// assert_eq!(count, 2);
///
/// let halve = Mutation::try_new("halve", |n: &mut i32| {
///     if *n % 2 != 0 {
///         return Err("odd");
///     }
///     *n /= 2;
///     Ok(())
/// });
/// assert!(halve.is_fallible());
/// assert!(halve.apply(&mut count).is_ok());
/// assert_eq!(count, 1);
/// ```
pub struct Mutation<S> {
    name: &'static str,
    edit: Edit<S>,
}

/// A mutation described as data.
///
/// Implement this on an enum to keep every edit an operations set can make
/// in one exhaustive `match`, then wrap values with [`Mutation::command`].
pub trait Command<S>: 'static {
    fn name(&self) -> &'static str;
    fn apply(self, state: &mut S);
}

impl<S: 'static> Mutation<S> {
    /// An edit that cannot fail.
    pub fn new<F>(name: &'static str, edit: F) -> Self
    where
        F: FnOnce(&mut S) + 'static,
    {
        Self {
            name,
            edit: Edit::Infallible(Box::new(edit)),
        }
    }

    /// An edit that may reject the change. The error reaches whoever
    /// dispatched the mutation and no subscriber is notified.
    pub fn try_new<F, E>(name: &'static str, edit: F) -> Self
    where
        F: FnOnce(&mut S) -> Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        Self {
            name,
            edit: Edit::Fallible(Box::new(move |state: &mut S| -> Result<(), BoxError> {
                edit(state).map_err(Into::into)
            })),
        }
    }

    pub fn command<C: Command<S>>(command: C) -> Self {
        let name = command.name();
        Self::new(name, move |state| command.apply(state))
    }
}

impl<S> Mutation<S> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_fallible(&self) -> bool {
        matches!(self.edit, Edit::Fallible(_))
    }

    /// Apply the edit to a plain value, outside any store.
    pub fn apply(self, state: &mut S) -> Result<(), StoreError> {
        match self.edit {
            Edit::Infallible(edit) => {
                edit(state);
                Ok(())
            }
            Edit::Fallible(edit) => {
                edit(state).map_err(|source| StoreError::mutation(self.name, source))
            }
        }
    }

    pub(crate) fn into_edit(self) -> (&'static str, Edit<S>) {
        (self.name, self.edit)
    }
}

impl<S> std::fmt::Debug for Mutation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutation")
            .field("name", &self.name)
            .field("fallible", &self.is_fallible())
            .finish()
    }
}
