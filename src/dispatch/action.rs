use super::context::DispatchContext;

/// A named unit of work that commits mutations and dispatches other actions
/// through the [`DispatchContext`] it receives.
///
/// The context is passed by value, so an action that finishes later (on a
/// timer, a worker thread, a network callback) can move it into that work and
/// commit whenever it resumes. The store imposes no deadline on that.
pub struct Action<S, O, R> {
    name: &'static str,
    run: Box<dyn FnOnce(DispatchContext<S, O>) -> R>,
}

impl<S: 'static, O: 'static, R: 'static> Action<S, O, R> {
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: FnOnce(DispatchContext<S, O>) -> R + 'static,
    {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

impl<S, O, R> Action<S, O, R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn run(self, context: DispatchContext<S, O>) -> R {
        let span = tracing::debug_span!("action", store = context.store_name(), action = self.name);
        let _entered = span.enter();
        (self.run)(context)
    }
}

impl<S, O, R> std::fmt::Debug for Action<S, O, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}
