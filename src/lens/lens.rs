use std::sync::Arc;

type Getter<S, T> = Arc<dyn Fn(&S) -> T + Send + Sync>;
type Setter<S, T> = Arc<dyn Fn(&mut S, T) + Send + Sync>;

/// A getter/setter pair focusing on a `T` inside an `S`.
///
/// A well-behaved lens satisfies two laws for every reachable `s` and `v`:
///
/// - `set(s, get(s))` leaves `s` unchanged;
/// - `get(set(s, v))` returns `v`.
///
/// Field lenses built with [`lens!`](crate::lens!) satisfy both.
///
/// # Examples
///
/// ```
/// use weir::{lens, Lens};
///
/// #[derive(Clone, Default)]
/// struct Feed { items: Vec<String> }
/// #[derive(Clone, Default)]
/// struct AppState { count: i32, feed: Feed }
///
/// let count: Lens<AppState, i32> = lens!(AppState => count);
/// let items = lens!(AppState => feed).then(lens!(Feed => items));
///
/// let mut state = AppState::default();
/// count.set(&mut state, 3);
/// items.set(&mut state, vec!["a".into()]);
///
/// assert_eq!(count.get(&state), 3);
/// assert_eq!(state.feed.items, vec!["a".to_string()]);
/// ```
pub struct Lens<S, T> {
    get: Getter<S, T>,
    set: Setter<S, T>,
}

impl<S: 'static, T: 'static> Lens<S, T> {
    pub fn new<G, W>(get: G, set: W) -> Self
    where
        G: Fn(&S) -> T + Send + Sync + 'static,
        W: Fn(&mut S, T) + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    pub fn get(&self, source: &S) -> T {
        (self.get)(source)
    }

    pub fn set(&self, source: &mut S, value: T) {
        (self.set)(source, value)
    }

    /// Read-modify-write the focused value.
    pub fn modify<R>(&self, source: &mut S, f: impl FnOnce(&mut T) -> R) -> R {
        let mut focus = self.get(source);
        let out = f(&mut focus);
        self.set(source, focus);
        out
    }

    /// Focus further into the target of this lens.
    pub fn then<U: 'static>(&self, inner: Lens<T, U>) -> Lens<S, U> {
        let outer_get = Arc::clone(&self.get);
        let outer_get_for_set = Arc::clone(&self.get);
        let outer_set = Arc::clone(&self.set);
        let inner_get = Arc::clone(&inner.get);
        let inner_set = inner.set;

        Lens {
            get: Arc::new(move |s: &S| inner_get(&outer_get(s))),
            set: Arc::new(move |s: &mut S, value: U| {
                let mut mid = outer_get_for_set(s);
                inner_set(&mut mid, value);
                outer_set(s, mid);
            }),
        }
    }
}

impl<S: Clone + 'static> Lens<S, S> {
    /// The lens that focuses on the whole value.
    pub fn identity() -> Self {
        Self::new(|s: &S| s.clone(), |s: &mut S, value: S| *s = value)
    }
}

impl<S, T> Clone for Lens<S, T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<S, T> std::fmt::Debug for Lens<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lens")
            .field("source", &std::any::type_name::<S>())
            .field("target", &std::any::type_name::<T>())
            .finish()
    }
}

/// Build a [`Lens`] onto a (possibly nested) field.
///
/// ```
/// use weir::lens;
///
/// #[derive(Clone)]
/// struct Inner { value: u8 }
/// #[derive(Clone)]
/// struct Outer { inner: Inner }
///
/// let value = lens!(Outer => inner.value);
/// let mut outer = Outer { inner: Inner { value: 1 } };
/// value.set(&mut outer, 9);
/// assert_eq!(outer.inner.value, 9);
/// ```
#[macro_export]
macro_rules! lens {
    ($root:ty => $($field:ident).+) => {
        $crate::Lens::new(
            |root: &$root| ::std::clone::Clone::clone(&root.$($field).+),
            |root: &mut $root, value| root.$($field).+ = value,
        )
    };
}
