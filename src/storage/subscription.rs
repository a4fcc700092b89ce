/// Opaque handle identifying one subscription on a [`Storage`](super::Storage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub(crate) u64);

/// RAII guard for storage subscribers.
///
/// Dropping the guard removes the subscriber. Call [`detach`](Self::detach) to
/// keep the subscriber registered and take its token instead.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    token: SubscriptionToken,
    cancel: Option<Box<dyn FnOnce(SubscriptionToken) + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(token: SubscriptionToken, cancel: F) -> Self
    where
        F: FnOnce(SubscriptionToken) + Send + Sync + 'static,
    {
        Self {
            token,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Keep the subscriber alive past the guard.
    pub fn detach(mut self) -> SubscriptionToken {
        self.cancel = None;
        self.token
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel(self.token);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("token", &self.token)
            .field("attached", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn drop_runs_cancel_once() {
        let cancelled = Arc::new(AtomicU64::new(u64::MAX));
        let cancelled_clone = cancelled.clone();
        let guard = Subscription::new(SubscriptionToken(3), move |token| {
            cancelled_clone.store(token.0, Ordering::SeqCst);
        });
        assert_eq!(guard.token(), SubscriptionToken(3));
        drop(guard);
        assert_eq!(cancelled.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn detach_skips_cancel() {
        let cancelled = Arc::new(AtomicU64::new(0));
        let cancelled_clone = cancelled.clone();
        let guard = Subscription::new(SubscriptionToken(1), move |_| {
            cancelled_clone.fetch_add(1, Ordering::SeqCst);
        });
        let token = guard.detach();
        assert_eq!(token, SubscriptionToken(1));
        assert_eq!(cancelled.load(Ordering::SeqCst), 0);
    }
}
