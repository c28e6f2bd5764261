//! Result delivery to subscribers.
//!
//! Emission is synchronous: each active subscriber is called once per
//! result, in registration order. Cancelling a [`Subscription`] takes effect
//! immediately, even from inside another subscriber's callback during the
//! same emission. Cancelled entries are pruned after each emission.

use crate::core::engine::AnalysisResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Callback = Box<dyn FnMut(&AnalysisResult) + Send>;

struct Subscriber {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Callback,
}

/// Handle returned by [`ResultBus::subscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop delivery to this subscriber.
    pub fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// A subscription that cancels itself when dropped.
#[derive(Debug)]
pub struct ScopedSubscription(Subscription);

impl ScopedSubscription {
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }
}

impl Drop for ScopedSubscription {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// The single subscription point for completed gesture results.
#[derive(Default)]
pub struct ResultBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl ResultBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it runs once for every emitted result.
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&AnalysisResult) + Send + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        let active = Arc::new(AtomicBool::new(true));
        self.subscribers.push(Subscriber {
            id,
            active: active.clone(),
            callback: Box::new(callback),
        });
        Subscription { id, active }
    }

    /// Like [`subscribe`](Self::subscribe) but tied to the handle's lifetime.
    pub fn subscribe_scoped<F>(&mut self, callback: F) -> ScopedSubscription
    where
        F: FnMut(&AnalysisResult) + Send + 'static,
    {
        ScopedSubscription(self.subscribe(callback))
    }

    /// Cancel and remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: &Subscription) -> bool {
        subscription.cancel();
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != subscription.id);
        self.subscribers.len() != before
    }

    /// Deliver a result. Returns how many subscribers received it.
    pub fn emit(&mut self, result: &AnalysisResult) -> usize {
        let mut delivered = 0;
        for subscriber in &mut self.subscribers {
            if subscriber.active.load(Ordering::SeqCst) {
                (subscriber.callback)(result);
                delivered += 1;
            }
        }
        self.subscribers.retain(|s| s.active.load(Ordering::SeqCst));
        delivered
    }

    /// Number of active subscribers.
    pub fn len(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|s| s.active.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ResultBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultBus")
            .field("subscribers", &self.len())
            .finish()
    }
}
